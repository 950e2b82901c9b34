use thiserror::Error;

/// Construction-time failures. Nothing is started when one of these is
/// returned.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing auth token")]
    MissingToken,

    #[error("Invalid batch posting limit: {0} (must be at least 1)")]
    InvalidBatchLimit(usize),

    #[error("Invalid period: must be greater than zero")]
    InvalidPeriod,

    #[error("Invalid queue limit {queue_limit}: must be at least the batch posting limit {batch_limit}")]
    InvalidQueueLimit {
        queue_limit: usize,
        batch_limit: usize,
    },

    #[error("Invalid backoff: {0}")]
    InvalidBackoff(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("No tokio runtime available to run the flush worker")]
    NoRuntime,

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Returned by `enqueue` when a record was not accepted. The record is
/// dropped in both cases.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueError {
    #[error("Engine is shut down")]
    Closed,

    #[error("Queue is full")]
    QueueFull,
}
