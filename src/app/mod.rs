pub mod config;
pub mod logging;
pub mod shutdown;

pub use config::{Config, LogFormat, LogLevel};
pub use logging::{LoggingError, init_logging};

use anyhow::Context;
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::domain::{EnqueueError, EventRecord, Level};
use crate::engine::BatchingEngine;

/// `SourceContext` attached to every line read from stdin.
pub const SOURCE_CONTEXT: &str = "logzio_sink::stdin";

pub fn line_event(line: &str, host: &str, level: Level) -> EventRecord {
    EventRecord::builder(level, "{Line}")
        .rendered(line)
        .property("Line", line)
        .property("SourceContext", SOURCE_CONTEXT)
        .property("Host", host)
        .build()
}

/// Enqueues every non-blank line from `reader` until EOF or until `stop`
/// resolves. Each line becomes an event at `level`. Returns the number of
/// lines the engine accepted.
pub async fn ship_lines<R, S>(
    reader: R,
    engine: &BatchingEngine,
    host: &str,
    level: Level,
    stop: S,
) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    let mut lines = reader.lines();
    let mut accepted = 0u64;
    tokio::pin!(stop);

    loop {
        let line = tokio::select! {
            biased;
            () = &mut stop => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            debug!("Reached end of input");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match engine.enqueue(line_event(&line, host, level)) {
            Ok(()) => accepted += 1,
            Err(EnqueueError::QueueFull) => {
                debug!("Queue full, line dropped");
            }
            Err(EnqueueError::Closed) => {
                warn!("Engine closed while reading input");
                break;
            }
        }
    }

    Ok(accepted)
}

fn host_name() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("Configuration error")?;
    init_logging(config.log_level, config.log_format)?;

    info!("Starting logzio-sink v{}", crate::VERSION);
    let engine = config
        .sink_options()?
        .start()
        .context("Failed to start the sink")?;

    let host = host_name();
    let stdin = BufReader::new(tokio::io::stdin());
    let shipped = ship_lines(
        stdin,
        &engine,
        &host,
        config.event_level,
        shutdown::wait_for_signal(),
    ).await;

    engine.shutdown().await;
    let stats = engine.stats();
    info!(
        enqueued = stats.enqueued,
        dropped = stats.dropped,
        drained = stats.drained,
        batches_sent = stats.batches_sent,
        batches_failed = stats.batches_failed,
        events_sent = stats.events_sent,
        events_discarded = stats.events_discarded,
        "logzio-sink stopped"
    );

    shipped.context("Failed to read stdin")?;
    Ok(())
}
