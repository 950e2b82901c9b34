use tokio::signal;
use tracing::{error, info};

/// Resolves on SIGINT, or SIGTERM on unix.
pub async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal as unix_signal};

        let mut sigterm = match unix_signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
                ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            () = ctrl_c() => {}
            _ = sigterm.recv() => {
                info!("Received SIGTERM, initiating graceful shutdown");
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received SIGINT (Ctrl+C), initiating graceful shutdown"),
        Err(err) => {
            error!("Failed to listen for SIGINT: {}", err);
            // Without a handler only EOF ends the run.
            std::future::pending::<()>().await;
        }
    }
}
