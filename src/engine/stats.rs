use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStatsSnapshot {
    pub enqueued: u64,
    pub dropped: u64,
    /// Records taken off the queue into batches.
    pub drained: u64,
    pub rejected_after_shutdown: u64,
    pub pending: usize,
    pub cycles: u64,
    pub batches_sent: u64,
    pub batches_failed: u64,
    pub events_sent: u64,
    pub events_discarded: u64,
}

/// Counters updated by the flush worker.
#[derive(Debug, Default)]
pub struct EngineStats {
    cycles: AtomicU64,
    batches_sent: AtomicU64,
    batches_failed: AtomicU64,
    events_sent: AtomicU64,
    events_discarded: AtomicU64,
}

impl EngineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, events: usize) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.batches_sent.fetch_add(1, Ordering::Relaxed);
        self.events_sent.fetch_add(events as u64, Ordering::Relaxed);
    }

    pub fn record_failure(&self, events: usize) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.batches_failed.fetch_add(1, Ordering::Relaxed);
        self.events_discarded
            .fetch_add(events as u64, Ordering::Relaxed);
    }

    /// Records left behind when the shutdown drain stopped early.
    pub fn record_abandoned(&self, events: usize) {
        self.events_discarded
            .fetch_add(events as u64, Ordering::Relaxed);
    }

    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    pub fn batches_sent(&self) -> u64 {
        self.batches_sent.load(Ordering::Relaxed)
    }

    pub fn batches_failed(&self) -> u64 {
        self.batches_failed.load(Ordering::Relaxed)
    }

    pub fn events_sent(&self) -> u64 {
        self.events_sent.load(Ordering::Relaxed)
    }

    pub fn events_discarded(&self) -> u64 {
        self.events_discarded.load(Ordering::Relaxed)
    }
}
