use std::sync::Once;
use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use super::config::{LogFormat, LogLevel};

static INIT: Once = Once::new();

// Crates below this level only add noise to the shipper's own output.
const DEFAULT_DIRECTIVES: &[(&str, LogLevel)] = &[
    ("hyper", LogLevel::Warn),
    ("hyper_util", LogLevel::Warn),
    ("reqwest", LogLevel::Warn),
    ("h2", LogLevel::Warn),
    ("rustls", LogLevel::Warn),
];

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log filter: {0}")]
    Filter(#[from] ParseError),

    #[error("Failed to install tracing subscriber: {0}")]
    Init(#[from] TryInitError),

    #[error("Logging already initialized")]
    AlreadyInitialized,
}

pub fn build_filter_string(level: LogLevel) -> String {
    let mut parts = Vec::with_capacity(DEFAULT_DIRECTIVES.len() + 1);
    parts.push(level.as_str().to_string());
    for (target, target_level) in DEFAULT_DIRECTIVES {
        parts.push(format!("{target}={}", target_level.as_str()));
    }
    parts.join(",")
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over
/// `level` when set. Output goes to stderr since stdin/stdout may be piped.
pub fn init_logging(level: LogLevel, format: LogFormat) -> Result<(), LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(build_filter_string(level))?,
    };

    let mut result = Err(LoggingError::AlreadyInitialized);
    INIT.call_once(|| {
        let (compact, json) = match format {
            LogFormat::Compact => (
                Some(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_thread_ids(true)
                        .compact(),
                ),
                None,
            ),
            LogFormat::Json => (
                None,
                Some(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .json()
                        .flatten_event(true),
                ),
            ),
        };

        result = tracing_subscriber::registry()
            .with(filter)
            .with(compact)
            .with(json)
            .try_init()
            .map_err(LoggingError::from);
    });
    result
}
