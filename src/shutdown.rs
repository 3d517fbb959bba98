use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

use crate::scheduler::Scheduler;

/// Watch for SIGTERM and SIGINT on behalf of `scheduler`.
///
/// The returned token is cancelled on the first signal. The HTTP listener
/// stops accepting requests when it fires, after which [`drain_jobs`] stops
/// whatever work is still outstanding.
pub fn install_shutdown_handler(scheduler: Arc<Scheduler>) -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        let received = match wait_for_signal().await {
            Ok(name) => name,
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handlers");
                return;
            }
        };

        tracing::info!(
            signal = received,
            in_flight = scheduler.registry().len(),
            "Shutdown requested, draining HTTP API"
        );
        trigger.cancel();
    });

    token
}

async fn wait_for_signal() -> std::io::Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(name)
}

/// Stop every queued, scheduled or executing job so no timer fires and no
/// script process outlives the service. Returns how many jobs were stopped.
pub fn drain_jobs(scheduler: &Scheduler) -> usize {
    let stopped = scheduler.stop_all_unfinished();
    if stopped > 0 {
        tracing::warn!(stopped, "Stopped unfinished jobs at shutdown");
    }
    stopped
}
