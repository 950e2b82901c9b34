use std::time::Duration;

use crate::domain::ConfigError;
use crate::encoder::PayloadEncoder;
use crate::engine::{BackoffPolicy, BatchSettings, BatchingEngine};
use crate::sender::{ClientConfig, DEFAULT_LISTENER_HOST, HttpDeliveryClient, ListenerEndpoint};

pub const DEFAULT_LOG_TYPE: &str = "rust";

/// Everything needed to ship events to a Logz.io listener.
#[derive(Debug, Clone)]
pub struct SinkOptions {
    pub auth_token: String,
    pub log_type: String,
    pub batch_posting_limit: usize,
    pub period: Duration,
    pub use_https: bool,
    pub flatten_properties: bool,
    pub url_override: Option<String>,
    pub listener_host: String,
    pub queue_limit: Option<usize>,
    pub backoff: BackoffPolicy,
    pub client: ClientConfig,
}

impl SinkOptions {
    pub fn new(auth_token: impl Into<String>) -> Self {
        let settings = BatchSettings::default();
        Self {
            auth_token: auth_token.into(),
            log_type: DEFAULT_LOG_TYPE.to_string(),
            batch_posting_limit: settings.batch_posting_limit,
            period: settings.period,
            use_https: true,
            flatten_properties: false,
            url_override: None,
            listener_host: DEFAULT_LISTENER_HOST.to_string(),
            queue_limit: settings.queue_limit,
            backoff: settings.backoff,
            client: ClientConfig::default(),
        }
    }

    pub fn endpoint(&self) -> ListenerEndpoint {
        ListenerEndpoint {
            token: self.auth_token.clone(),
            log_type: self.log_type.clone(),
            use_https: self.use_https,
            listener_host: self.listener_host.clone(),
            url_override: self.url_override.clone(),
        }
    }

    pub fn batch_settings(&self) -> BatchSettings {
        BatchSettings {
            batch_posting_limit: self.batch_posting_limit,
            period: self.period,
            queue_limit: self.queue_limit,
            backoff: self.backoff,
        }
    }

    /// Builds the HTTP client and starts the engine on the current tokio
    /// runtime. All validation happens before anything is spawned.
    pub fn start(self) -> Result<BatchingEngine, ConfigError> {
        let url = self.endpoint().url()?;
        let settings = self.batch_settings();
        settings.validate()?;
        let client = HttpDeliveryClient::new(self.client)?;
        BatchingEngine::start(
            client,
            url,
            settings,
            PayloadEncoder::new(self.flatten_properties),
        )
    }
}
