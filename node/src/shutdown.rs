//! Stop signal shared by the election writer and the daemon's input loop.
//!
//! One [`ShutdownController`] per process. The daemon hands a receiver to
//! [`ElectionService::spawn`](crate::ElectionService::spawn) and keeps
//! another for its stdin loop. When the signal fires, the stdin loop stops
//! reading, and the writer closes its queue, applies what was already queued
//! (persisting each commit as usual) and exits. Awaiting the writer's
//! `JoinHandle` after that means every acknowledged vote is on disk.
//!
//! The signal comes from SIGINT/SIGTERM via
//! [`wait_for_signal`](ShutdownController::wait_for_signal), from
//! [`shutdown`](ShutdownController::shutdown) on end of input, or from
//! dropping the controller, which closes every receiver.

use tokio::signal;
use tokio::sync::broadcast;

/// Broadcasts a one-shot stop signal to the writer and the input loop.
///
/// Receivers `select!` on [`subscribe`](Self::subscribe) alongside their
/// main work. Both `Ok(())` and `Err(Closed)` from `recv` mean stop.
pub struct ShutdownController {
    tx: broadcast::Sender<()>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Get a receiver that will be notified on shutdown.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger shutdown programmatically.
    pub fn shutdown(&self) {
        let _ = self.tx.send(());
    }

    /// Wait for SIGTERM or SIGINT, then trigger shutdown.
    pub async fn wait_for_signal(&self) {
        let ctrl_c = signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                }
                Err(e) => {
                    tracing::warn!("cannot install SIGTERM handler: {e}");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => { tracing::info!("received SIGINT, shutting down"); }
            _ = terminate => { tracing::info!("received SIGTERM, shutting down"); }
        }

        self.shutdown();
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}
