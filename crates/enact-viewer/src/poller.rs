use crate::source::TraceSource;
use crate::viewer::{CycleOutcome, TraceViewer};
use enact_core::TracePanel;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Controls a running poll task. Dropping the handle also stops the task.
pub struct PollHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<TraceViewer>,
}

impl PollHandle {
    pub fn cancel(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Cancels the task and waits for it, returning the viewer state it owned.
    pub async fn shutdown(self) -> Option<TraceViewer> {
        self.cancel();
        self.task.await.ok()
    }
}

/// Polls `source` forever: one cycle, then a fixed `interval` pause, whether
/// the cycle succeeded or not. Only one fetch is ever in flight.
/// `on_change` runs after each cycle that rebuilt the panel.
pub fn spawn_poller<F>(
    source: Arc<dyn TraceSource>,
    interval: Duration,
    viewer: TraceViewer,
    on_change: F,
) -> PollHandle
where
    F: FnMut(&TracePanel) + Send + 'static,
{
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(run_poller(source, interval, viewer, on_change, shutdown_rx));
    PollHandle { shutdown_tx, task }
}

async fn run_poller<F>(
    source: Arc<dyn TraceSource>,
    interval: Duration,
    mut viewer: TraceViewer,
    mut on_change: F,
    mut shutdown_rx: watch::Receiver<bool>,
) -> TraceViewer
where
    F: FnMut(&TracePanel) + Send + 'static,
{
    info!(
        event = "poller_start",
        source = source.location(),
        interval_ms = interval.as_millis() as u64
    );
    let mut failure_streak = 0u64;

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let result = tokio::select! {
            result = viewer.poll_cycle(source.as_ref()) => result,
            _ = shutdown_rx.changed() => break,
        };

        // Failures never stop the loop; the display keeps its last good state.
        match result {
            Ok(outcome) => {
                if failure_streak > 0 {
                    info!(event = "poll_recovered", failures = failure_streak);
                    failure_streak = 0;
                }
                if let CycleOutcome::Rendered { .. } = outcome {
                    on_change(viewer.panel());
                }
            }
            Err(err) => {
                failure_streak += 1;
                if failure_streak == 1 {
                    warn!(event = "poll_cycle_failed", source = source.location(), error = %err);
                } else {
                    debug!(
                        event = "poll_cycle_failed",
                        source = source.location(),
                        failures = failure_streak,
                        error = %err
                    );
                }
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown_rx.changed() => break,
        }
    }

    info!(event = "poller_stop", cycles = viewer.cycles(), renders = viewer.renders());
    viewer
}
