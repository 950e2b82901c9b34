use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use super::backoff::ConnectionStatus;
use super::stats::EngineStats;
use crate::SELF_LOG_TARGET;
use crate::buffer::{Batch, BatchType, EventQueue};
use crate::encoder::{CONTENT_TYPE, PayloadEncoder};
use crate::sender::{DeliveryClient, redact_token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Cycle(BatchType),
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleOutcome {
    Empty,
    Delivered,
    Failed,
}

/// Releases the client exactly once, whether the worker finishes normally
/// or its future is dropped.
struct ClientGuard<C: DeliveryClient> {
    client: C,
    released: bool,
}

impl<C: DeliveryClient> ClientGuard<C> {
    fn new(client: C) -> Self {
        Self {
            client,
            released: false,
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.client.release();
        }
    }
}

impl<C: DeliveryClient> Drop for ClientGuard<C> {
    fn drop(&mut self) {
        self.release();
    }
}

/// The single consumer of the queue. Owns the client for its lifetime.
pub(crate) struct FlushWorker<C: DeliveryClient> {
    queue: Arc<EventQueue>,
    client: ClientGuard<C>,
    encoder: PayloadEncoder,
    url: Url,
    batch_posting_limit: usize,
    status: ConnectionStatus,
    stats: Arc<EngineStats>,
    cancel: CancellationToken,
}

impl<C: DeliveryClient> FlushWorker<C> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        queue: Arc<EventQueue>,
        client: C,
        encoder: PayloadEncoder,
        url: Url,
        batch_posting_limit: usize,
        status: ConnectionStatus,
        stats: Arc<EngineStats>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            queue,
            client: ClientGuard::new(client),
            encoder,
            url,
            batch_posting_limit,
            status,
            stats,
            cancel,
        }
    }

    pub(crate) async fn run(mut self) {
        debug!(
            batch_posting_limit = self.batch_posting_limit,
            "Flush worker started"
        );

        loop {
            let idle = self.status.next_interval();
            match self.wait_for_trigger(idle).await {
                Trigger::Cycle(batch_type) => {
                    self.flush_cycle(batch_type).await;
                }
                Trigger::Shutdown => break,
            }
        }

        self.drain_on_shutdown().await;
        self.client.release();
        info!(
            batches_sent = self.stats.batches_sent(),
            batches_failed = self.stats.batches_failed(),
            "Flush worker stopped"
        );
    }

    // Waits until the idle interval elapses or the queue reaches the batch
    // limit. Notifications that arrive below the limit keep the deadline.
    async fn wait_for_trigger(&self, idle: Duration) -> Trigger {
        let deadline = Instant::now() + idle;
        loop {
            if self.cancel.is_cancelled() {
                return Trigger::Shutdown;
            }
            if self.queue.len() >= self.batch_posting_limit {
                return Trigger::Cycle(BatchType::SizeBased);
            }

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Trigger::Shutdown,
                () = self.queue.notified() => {}
                () = sleep_until(deadline) => return Trigger::Cycle(BatchType::TimeBased),
            }
        }
    }

    async fn flush_cycle(&mut self, batch_type: BatchType) -> CycleOutcome {
        let records = self.queue.drain(self.batch_posting_limit);
        if records.is_empty() {
            return CycleOutcome::Empty;
        }

        let batch = Batch::new(records, batch_type);
        let body = self.encoder.encode(batch.records());

        debug!(
            batch_id = batch.id(),
            events = batch.size(),
            bytes = body.len(),
            batch_type = ?batch.batch_type(),
            "Sending batch"
        );

        match self
            .client
            .client
            .send(&self.url, Bytes::from(body), CONTENT_TYPE)
            .await
        {
            Ok(()) => {
                self.status.mark_success();
                self.stats.record_success(batch.size());
                CycleOutcome::Delivered
            }
            Err(failure) => {
                self.status.mark_failure();
                self.stats.record_failure(batch.size());
                error!(
                    target: SELF_LOG_TARGET,
                    batch_id = batch.id(),
                    events = batch.size(),
                    status = failure.status(),
                    transient = failure.is_transient(),
                    url = %redact_token(&self.url),
                    consecutive_failures = self.status.failures_since_success(),
                    "Failed to deliver batch, discarding it: {failure}"
                );
                CycleOutcome::Failed
            }
        }
    }

    // The queue is closed before cancellation, so the pending count is
    // final and the number of cycles is bounded.
    async fn drain_on_shutdown(&mut self) {
        let pending = self.queue.len();
        if pending == 0 {
            return;
        }

        let max_cycles = pending.div_ceil(self.batch_posting_limit);
        debug!(pending, max_cycles, "Draining queue before shutdown");

        for _ in 0..max_cycles {
            match self.flush_cycle(BatchType::Shutdown).await {
                CycleOutcome::Delivered => {}
                CycleOutcome::Empty => return,
                // An endpoint that just failed is not retried batch by batch
                // while the process is stopping. Whatever is left is dropped.
                CycleOutcome::Failed => break,
            }
        }

        let abandoned = self.queue.clear();
        if abandoned > 0 {
            self.stats.record_abandoned(abandoned);
            warn!(
                target: SELF_LOG_TARGET,
                abandoned,
                url = %redact_token(&self.url),
                "Delivery failed during shutdown, dropping remaining events"
            );
        }
    }
}
