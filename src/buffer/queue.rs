use crate::domain::{EnqueueError, EventRecord};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Notify;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueMetrics {
    pub pushed: u64,
    pub popped: u64,
    pub dropped: u64,
    pub rejected: u64,
    pub len: usize,
}

struct QueueInner {
    records: VecDeque<EventRecord>,
    closed: bool,
}

/// FIFO buffer shared between producers and the flush worker.
///
/// Producers only hold the lock long enough to push. The worker is woken
/// through `notified()` once the length reaches the batch threshold.
pub struct EventQueue {
    inner: Mutex<QueueInner>,
    notify: Notify,
    batch_threshold: usize,
    capacity: Option<usize>,
    pushed: AtomicU64,
    popped: AtomicU64,
    dropped: AtomicU64,
    rejected: AtomicU64,
}

impl EventQueue {
    pub fn new(batch_threshold: usize, capacity: Option<usize>) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(QueueInner {
                records: VecDeque::new(),
                closed: false,
            }),
            notify: Notify::new(),
            batch_threshold: batch_threshold.max(1),
            capacity,
            pushed: AtomicU64::new(0),
            popped: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        })
    }

    pub fn push(&self, record: EventRecord) -> Result<(), EnqueueError> {
        let len = {
            let mut inner = self.inner.lock();
            if inner.closed {
                drop(inner);
                self.rejected.fetch_add(1, Ordering::Relaxed);
                return Err(EnqueueError::Closed);
            }
            if let Some(capacity) = self.capacity
                && inner.records.len() >= capacity
            {
                drop(inner);
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return Err(EnqueueError::QueueFull);
            }
            inner.records.push_back(record);
            inner.records.len()
        };

        self.pushed.fetch_add(1, Ordering::Relaxed);
        if len >= self.batch_threshold {
            self.notify.notify_one();
        }
        Ok(())
    }

    /// Removes up to `max` records from the front, in push order.
    pub fn drain(&self, max: usize) -> Vec<EventRecord> {
        let drained: Vec<EventRecord> = {
            let mut inner = self.inner.lock();
            let take = max.min(inner.records.len());
            inner.records.drain(..take).collect()
        };
        self.popped
            .fetch_add(drained.len() as u64, Ordering::Relaxed);
        drained
    }

    /// Rejects all later pushes. Returns the number of records still queued.
    pub fn close(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.closed = true;
        inner.records.len()
    }

    /// Discards whatever is still queued and returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut inner = self.inner.lock();
        let cleared = inner.records.len();
        inner.records.clear();
        cleared
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves after a push brought the queue to the batch threshold. A
    /// notification sent while nobody waits is kept for the next caller.
    pub async fn notified(&self) {
        self.notify.notified().await;
    }

    pub fn metrics(&self) -> QueueMetrics {
        QueueMetrics {
            pushed: self.pushed.load(Ordering::Relaxed),
            popped: self.popped.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            len: self.len(),
        }
    }
}
