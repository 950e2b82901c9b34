use crate::domain::EventRecord;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why a flush cycle ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchType {
    SizeBased,
    TimeBased,
    Shutdown,
}

/// Records drained in one flush cycle. Owned by that cycle and dropped once
/// the send attempt finished.
#[derive(Debug, Clone)]
pub struct Batch {
    id: String,
    records: Vec<EventRecord>,
    batch_type: BatchType,
}

impl Batch {
    pub fn new(records: Vec<EventRecord>, batch_type: BatchType) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            records,
            batch_type,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn size(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn batch_type(&self) -> BatchType {
        self.batch_type
    }
}
