//! Domain layer for logzio-sink.
//!
//! Contains the canonical types shared across all modules:
//! - `EventRecord`: the unit of work handed to the engine
//! - `Level`: event severity (Verbose/Debug/Information/Warning/Error/Fatal)
//! - `PropertyValue` / `Scalar`: the property tree attached to events
//! - `ConfigError` / `EnqueueError`: errors visible to callers

pub mod error;
pub mod event;
pub mod level;
pub mod value;

pub use error::{ConfigError, EnqueueError};
pub use event::{EventRecord, EventRecordBuilder};
pub use level::Level;
pub use value::{PropertyValue, Scalar};
