use crate::domain::ConfigError;
use url::Url;

pub const DEFAULT_LISTENER_HOST: &str = "listener.logz.io";
pub const HTTPS_PORT: u16 = 8071;
pub const HTTP_PORT: u16 = 8070;

/// Where batches are posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerEndpoint {
    pub token: String,
    pub log_type: String,
    pub use_https: bool,
    pub listener_host: String,
    /// Used verbatim instead of the built URL when set.
    pub url_override: Option<String>,
}

impl ListenerEndpoint {
    pub fn new(token: impl Into<String>, log_type: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            log_type: log_type.into(),
            use_https: true,
            listener_host: DEFAULT_LISTENER_HOST.to_string(),
            url_override: None,
        }
    }

    pub fn url(&self) -> Result<Url, ConfigError> {
        listener_url(
            &self.token,
            &self.log_type,
            self.use_https,
            &self.listener_host,
            self.url_override.as_deref(),
        )
    }
}

/// Builds `scheme://host:port/?token=<token>&type=<type>`, or parses the
/// override. The token is required either way.
pub fn listener_url(
    token: &str,
    log_type: &str,
    use_https: bool,
    listener_host: &str,
    url_override: Option<&str>,
) -> Result<Url, ConfigError> {
    if token.trim().is_empty() {
        return Err(ConfigError::MissingToken);
    }

    if let Some(raw) = url_override {
        return Url::parse(raw)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid override URL '{raw}': {e}")));
    }

    let (scheme, port) = if use_https {
        ("https", HTTPS_PORT)
    } else {
        ("http", HTTP_PORT)
    };

    let base = format!("{scheme}://{listener_host}:{port}/");
    let mut url = Url::parse(&base)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid listener URL '{base}': {e}")))?;
    url.query_pairs_mut()
        .append_pair("token", token)
        .append_pair("type", log_type);

    Ok(url)
}

/// Copy of `url` with the token query value masked, for logs and error
/// messages.
pub fn redact_token(url: &Url) -> String {
    if !url.query_pairs().any(|(k, _)| k == "token") {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if k == "token" {
                "***".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), value)
        })
        .collect();

    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}
