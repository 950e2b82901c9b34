use clap::parser::ValueSource;
use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::{ConfigError, Level};
use crate::engine::{BackoffPolicy, DEFAULT_BATCH_POSTING_LIMIT};
use crate::sender::{ClientConfig, DEFAULT_LISTENER_HOST};
use crate::sink::{DEFAULT_LOG_TYPE, SinkOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Output format of the shipper's own logs (always written to stderr).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

const DEFAULT_PERIOD_MS: u64 = 2000;
const DEFAULT_MIN_BACKOFF_MS: u64 = 5_000;
const DEFAULT_MAX_BACKOFF_MS: u64 = 600_000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(
    name = "logzio-sink",
    author,
    version,
    about = "Ship lines from stdin to a Logz.io listener",
    long_about = None
)]
#[serde(default)]
pub struct Config {
    /// Logz.io account token
    #[arg(long, env = "LOGZIO_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Log type attached to every shipped event
    #[arg(long = "type", env = "LOGZIO_TYPE", default_value = DEFAULT_LOG_TYPE)]
    #[serde(rename = "type")]
    pub log_type: String,

    /// Maximum number of events per request
    #[arg(long, env = "LOGZIO_BATCH_POSTING_LIMIT", default_value = "1000")]
    pub batch_posting_limit: usize,

    /// Idle interval between flushes in milliseconds
    #[arg(long, env = "LOGZIO_PERIOD_MS", default_value = "2000")]
    pub period_ms: u64,

    /// Use HTTPS (port 8071) instead of HTTP (port 8070)
    #[arg(long, env = "LOGZIO_USE_HTTPS", default_value = "true", action = ArgAction::Set)]
    pub use_https: bool,

    /// Write properties without the `Properties.` prefix
    #[arg(long, env = "LOGZIO_FLATTEN_PROPERTIES")]
    pub flatten_properties: bool,

    /// Full listener URL, used as is
    #[arg(long = "url", env = "LOGZIO_URL")]
    pub url_override: Option<String>,

    /// Listener host name
    #[arg(long, env = "LOGZIO_LISTENER_HOST", default_value = DEFAULT_LISTENER_HOST)]
    pub listener_host: String,

    /// Maximum number of buffered events (unbounded when unset)
    #[arg(long, env = "LOGZIO_QUEUE_LIMIT")]
    pub queue_limit: Option<usize>,

    /// First backoff step after a failed flush, in milliseconds
    #[arg(long, env = "LOGZIO_MIN_BACKOFF_MS", default_value = "5000")]
    pub min_backoff_ms: u64,

    /// Backoff ceiling in milliseconds
    #[arg(long, env = "LOGZIO_MAX_BACKOFF_MS", default_value = "600000")]
    pub max_backoff_ms: u64,

    /// Randomize backoff intervals
    #[arg(long, env = "LOGZIO_BACKOFF_JITTER")]
    pub backoff_jitter: bool,

    /// HTTP request timeout in seconds
    #[arg(long, env = "LOGZIO_REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout_secs: u64,

    /// Level given to every shipped line
    #[arg(long, env = "LOGZIO_EVENT_LEVEL", default_value = "Information")]
    pub event_level: Level,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", default_value = "compact")]
    pub log_format: LogFormat,

    /// Configuration file path (optional)
    #[arg(long, env = "LOGZIO_CONFIG_FILE")]
    #[serde(skip)]
    pub config_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: None,
            log_type: DEFAULT_LOG_TYPE.to_string(),
            batch_posting_limit: DEFAULT_BATCH_POSTING_LIMIT,
            period_ms: DEFAULT_PERIOD_MS,
            use_https: true,
            flatten_properties: false,
            url_override: None,
            listener_host: DEFAULT_LISTENER_HOST.to_string(),
            queue_limit: None,
            min_backoff_ms: DEFAULT_MIN_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
            backoff_jitter: false,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            event_level: Level::Information,
            log_level: LogLevel::Info,
            log_format: LogFormat::Compact,
            config_file: None,
        }
    }
}

impl Config {
    /// Parses the process arguments and environment. Exits on `--help`
    /// and on malformed arguments, like any clap binary.
    pub fn load() -> Result<Self, ConfigError> {
        let matches = Self::command().get_matches();
        let config = Self::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
        config.resolve(&matches)
    }

    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = Self::command()
            .try_get_matches_from(args)
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        let config = Self::from_arg_matches(&matches)
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        config.resolve(&matches)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies the config file, if any, underneath the values given on the
    /// command line or in the environment, then validates the result.
    fn resolve(self, matches: &ArgMatches) -> Result<Self, ConfigError> {
        let config = match self.config_file.clone() {
            Some(path) => {
                let content = std::fs::read_to_string(&path)?;
                let base: Config = toml::from_str(&content)?;
                self.layered_over(base, matches)
            }
            None => self,
        };
        config.validate()?;
        Ok(config)
    }

    // Only values clap filled in from a default yield to the file.
    fn layered_over(self, base: Config, matches: &ArgMatches) -> Config {
        let given = |id: &str| {
            matches
                .value_source(id)
                .is_some_and(|source| source != ValueSource::DefaultValue)
        };

        Config {
            token: if given("token") { self.token } else { base.token },
            log_type: if given("log_type") { self.log_type } else { base.log_type },
            batch_posting_limit: if given("batch_posting_limit") {
                self.batch_posting_limit
            } else {
                base.batch_posting_limit
            },
            period_ms: if given("period_ms") { self.period_ms } else { base.period_ms },
            use_https: if given("use_https") { self.use_https } else { base.use_https },
            flatten_properties: if given("flatten_properties") {
                self.flatten_properties
            } else {
                base.flatten_properties
            },
            url_override: if given("url_override") {
                self.url_override
            } else {
                base.url_override
            },
            listener_host: if given("listener_host") {
                self.listener_host
            } else {
                base.listener_host
            },
            queue_limit: if given("queue_limit") { self.queue_limit } else { base.queue_limit },
            min_backoff_ms: if given("min_backoff_ms") {
                self.min_backoff_ms
            } else {
                base.min_backoff_ms
            },
            max_backoff_ms: if given("max_backoff_ms") {
                self.max_backoff_ms
            } else {
                base.max_backoff_ms
            },
            backoff_jitter: if given("backoff_jitter") {
                self.backoff_jitter
            } else {
                base.backoff_jitter
            },
            request_timeout_secs: if given("request_timeout_secs") {
                self.request_timeout_secs
            } else {
                base.request_timeout_secs
            },
            event_level: if given("event_level") { self.event_level } else { base.event_level },
            log_level: if given("log_level") { self.log_level } else { base.log_level },
            log_format: if given("log_format") { self.log_format } else { base.log_format },
            config_file: self.config_file,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_type.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "Log type must not be empty".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        let options = self.sink_options()?;
        options.endpoint().url()?;
        options.batch_settings().validate()
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    pub fn sink_options(&self) -> Result<SinkOptions, ConfigError> {
        let token = self
            .token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?;

        Ok(SinkOptions {
            log_type: self.log_type.clone(),
            batch_posting_limit: self.batch_posting_limit,
            period: self.period(),
            use_https: self.use_https,
            flatten_properties: self.flatten_properties,
            url_override: self.url_override.clone(),
            listener_host: self.listener_host.clone(),
            queue_limit: self.queue_limit,
            backoff: BackoffPolicy {
                min_backoff: Duration::from_millis(self.min_backoff_ms),
                max_backoff: Duration::from_millis(self.max_backoff_ms),
                jitter: self.backoff_jitter,
            },
            client: ClientConfig {
                timeout: Duration::from_secs(self.request_timeout_secs),
                ..ClientConfig::default()
            },
            ..SinkOptions::new(token)
        })
    }
}
