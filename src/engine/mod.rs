//! Periodic batching engine.
//!
//! Producers call [`BatchingEngine::enqueue`] from any thread; it only takes
//! the queue lock long enough to push. A single tokio task drains the queue
//! in batches of at most `batch_posting_limit`, encodes each batch and awaits
//! its delivery before starting the next cycle. A cycle starts when the idle
//! interval elapses or the queue reaches the limit, whichever comes first.
//!
//! A failed delivery is reported on the self-log target and the batch is
//! discarded. Consecutive failures stretch the idle interval (see
//! [`backoff::ConnectionStatus`]).
//!
//! [`BatchingEngine::shutdown`] closes the queue, wakes the worker, lets it
//! drain what is left and waits until the delivery client is released.

pub mod backoff;
pub mod stats;
mod worker;

pub use backoff::{BackoffPolicy, ConnectionStatus};
pub use stats::{EngineStats, EngineStatsSnapshot};

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use url::Url;

use crate::buffer::EventQueue;
use crate::domain::{ConfigError, EnqueueError, EventRecord};
use crate::encoder::PayloadEncoder;
use crate::sender::DeliveryClient;
use crate::sender::endpoint::redact_token;
use worker::FlushWorker;

pub const DEFAULT_BATCH_POSTING_LIMIT: usize = 1000;
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq)]
pub struct BatchSettings {
    pub batch_posting_limit: usize,
    pub period: Duration,
    /// Upper bound on buffered records; `None` leaves the queue unbounded.
    pub queue_limit: Option<usize>,
    pub backoff: BackoffPolicy,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            batch_posting_limit: DEFAULT_BATCH_POSTING_LIMIT,
            period: DEFAULT_PERIOD,
            queue_limit: None,
            backoff: BackoffPolicy::default(),
        }
    }
}

impl BatchSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_posting_limit == 0 {
            return Err(ConfigError::InvalidBatchLimit(self.batch_posting_limit));
        }
        if self.period.is_zero() {
            return Err(ConfigError::InvalidPeriod);
        }
        if let Some(queue_limit) = self.queue_limit
            && queue_limit < self.batch_posting_limit
        {
            return Err(ConfigError::InvalidQueueLimit {
                queue_limit,
                batch_limit: self.batch_posting_limit,
            });
        }
        self.backoff.validate()
    }
}

pub struct BatchingEngine {
    queue: Arc<EventQueue>,
    stats: Arc<EngineStats>,
    cancel: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
    url: Url,
}

impl BatchingEngine {
    /// Validates `settings` and spawns the flush worker on the current tokio
    /// runtime. Nothing is spawned when validation fails.
    pub fn start<C: DeliveryClient>(
        client: C,
        url: Url,
        settings: BatchSettings,
        encoder: PayloadEncoder,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let runtime = Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;

        let queue = EventQueue::new(settings.batch_posting_limit, settings.queue_limit);
        let stats = Arc::new(EngineStats::new());
        let cancel = CancellationToken::new();

        let worker = FlushWorker::new(
            queue.clone(),
            client,
            encoder,
            url.clone(),
            settings.batch_posting_limit,
            ConnectionStatus::new(settings.period, settings.backoff),
            stats.clone(),
            cancel.clone(),
        );
        let handle = runtime.spawn(worker.run());

        info!(
            url = %redact_token(&url),
            batch_posting_limit = settings.batch_posting_limit,
            period_ms = settings.period.as_millis() as u64,
            flatten_properties = encoder.flatten_properties(),
            "Batching engine started"
        );

        Ok(Self {
            queue,
            stats,
            cancel,
            worker: Mutex::new(Some(handle)),
            url,
        })
    }

    /// Buffers `record` for delivery. Never waits on I/O.
    ///
    /// After shutdown the record is dropped and `EnqueueError::Closed` is
    /// returned; callers are free to ignore the result.
    pub fn enqueue(&self, record: EventRecord) -> Result<(), EnqueueError> {
        self.queue.push(record)
    }

    /// Stops the periodic flush, delivers what is still buffered and releases
    /// the delivery client. Later calls return immediately.
    pub async fn shutdown(&self) {
        let handle = self.worker.lock().take();
        let Some(handle) = handle else {
            return;
        };

        let pending = self.queue.close();
        info!(pending, "Shutting down batching engine");
        self.cancel.cancel();

        if let Err(e) = handle.await {
            error!(target: crate::SELF_LOG_TARGET, "Flush worker ended abnormally: {e}");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.queue.is_closed()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn stats(&self) -> EngineStatsSnapshot {
        let queue = self.queue.metrics();
        EngineStatsSnapshot {
            enqueued: queue.pushed,
            dropped: queue.dropped,
            drained: queue.popped,
            rejected_after_shutdown: queue.rejected,
            pending: queue.len,
            cycles: self.stats.cycles(),
            batches_sent: self.stats.batches_sent(),
            batches_failed: self.stats.batches_failed(),
            events_sent: self.stats.events_sent(),
            events_discarded: self.stats.events_discarded(),
        }
    }
}

impl Drop for BatchingEngine {
    // Without an explicit shutdown the worker still drains and releases the
    // client in the background, as long as the runtime keeps running.
    fn drop(&mut self) {
        if self.worker.get_mut().is_some() {
            self.queue.close();
            self.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        let settings = BatchSettings::default();
        assert_eq!(settings.batch_posting_limit, 1000);
        assert_eq!(settings.period, Duration::from_secs(2));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn zero_limit_is_rejected() {
        let settings = BatchSettings {
            batch_posting_limit: 0,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidBatchLimit(0))
        ));
    }

    #[test]
    fn zero_period_is_rejected() {
        let settings = BatchSettings {
            period: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(ConfigError::InvalidPeriod)));
    }

    #[test]
    fn queue_limit_below_batch_limit_is_rejected() {
        let settings = BatchSettings {
            batch_posting_limit: 10,
            queue_limit: Some(5),
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidQueueLimit { .. })
        ));
    }
}
