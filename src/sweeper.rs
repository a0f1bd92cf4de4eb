//! Periodic removal of expired links.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;

use crate::registry::SharedRegistry;

pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Handle to a running sweeper task.
pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal the task to stop and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            tracing::error!("Sweeper task ended abnormally: {}", e);
        }
    }
}

/// Spawn a task that sweeps `registry` every `period`.
///
/// The first sweep happens one full period after spawning.
pub fn spawn_sweeper(registry: SharedRegistry, period: Duration) -> SweeperHandle {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        // Skip the first tick which fires immediately
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let removed = registry.lock().await.sweep_expired().await;
                    for link in &removed {
                        tracing::debug!(short_code = %link.short_code, "expired link removed");
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        tracing::info!("Sweeper stopped");
                        break;
                    }
                }
            }
        }
    });

    SweeperHandle { shutdown_tx, task }
}
