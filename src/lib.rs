#![deny(rust_2024_compatibility)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::cast_lossless,            // Infallible casts are clear enough with `as`
    clippy::cast_possible_truncation, // Safe within realistic value bounds (durations, sizes)
    clippy::cast_precision_loss,      // Acceptable for jitter math
    clippy::cast_sign_loss,           // Safe where values are known non-negative
    clippy::missing_errors_doc,       // Internal API
    clippy::missing_panics_doc,       // Internal API
    clippy::module_name_repetitions,  // e.g. EngineStats in engine module
    clippy::must_use_candidate,       // Annotated selectively on critical APIs
    clippy::doc_markdown              // Internal API
)]

pub mod app;
pub mod buffer;
pub mod domain;
pub mod encoder;
pub mod engine;
pub mod sender;
pub mod sink;

// Re-export main types for easy access
pub use domain::{ConfigError, EnqueueError, EventRecord, Level, PropertyValue, Scalar};
pub use encoder::PayloadEncoder;
pub use engine::{BatchSettings, BatchingEngine, EngineStatsSnapshot};
pub use sender::{DeliveryClient, DeliveryFailure, HttpDeliveryClient};
pub use sink::SinkOptions;

/// Tracing target for the engine's own diagnostics (delivery failures,
/// encoding fallbacks). Route it separately to watch the shipper itself.
pub const SELF_LOG_TARGET: &str = "logzio_sink::selflog";

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
