use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::reconciler::AvailabilityReconciler;

/// Shortest schedule the poller accepts.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Background task polling the reconciler on its configured interval.
pub struct PollerHandle {
    reconciler: Arc<AvailabilityReconciler>,
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Deactivates the reconciler and stops the schedule. A poll already in
    /// flight is abandoned.
    pub async fn shutdown(self) {
        self.reconciler.shutdown().await;
        let _ = self.stop.send(true);
        if let Err(err) = self.task.await {
            debug!(error = %err, "poller: task ended abnormally");
        }
    }
}

/// Polls once immediately, then once per interval. Ticks that come due while
/// a poll is still running are skipped rather than queued. Intervals shorter
/// than [`MIN_POLL_INTERVAL`] are raised to it.
pub fn spawn_poller(reconciler: Arc<AvailabilityReconciler>) -> PollerHandle {
    let (stop, mut stop_rx) = watch::channel(false);
    let configured = reconciler.config().poll_interval;
    let period = configured.max(MIN_POLL_INTERVAL);
    if period != configured {
        warn!(
            configured_ms = configured.as_millis() as u64,
            used_ms = period.as_millis() as u64,
            "poller: interval too short; using the minimum"
        );
    }
    let handle_reconciler = reconciler.clone();
    let task = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(interval_ms = period.as_millis() as u64, "poller: started");
        loop {
            tokio::select! {
                biased;
                _ = stop_rx.changed() => break,
                _ = ticker.tick() => {}
            }
            if !reconciler.is_active() {
                break;
            }
            tokio::select! {
                biased;
                _ = stop_rx.changed() => break,
                result = reconciler.poll() => {
                    if let Err(err) = result {
                        debug!(error = %err, "poller: scheduled poll failed");
                    }
                }
            }
        }
        info!("poller: stopped");
    });
    PollerHandle {
        reconciler: handle_reconciler,
        stop,
        task,
    }
}

#[cfg(test)]
#[path = "tests/poller_tests.rs"]
mod tests;
