pub mod batch;
pub mod queue;

pub use batch::{Batch, BatchType};
pub use queue::{EventQueue, QueueMetrics};
