//! Periodic background reporter.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::info;

use crate::metrics::Metrics;

/// Spawns a task that logs a counter snapshot every `period`.
///
/// The first report fires one full `period` after startup. The task runs
/// until the returned handle is aborted or the runtime shuts down.
pub fn spawn(metrics: Arc<Metrics>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            metrics.record_tick();
            let snapshot = metrics.snapshot();
            info!(
                stored = snapshot.stored,
                pipelines_created = snapshot.pipelines_created,
                stages_created = snapshot.stages_created,
                jobs_created = snapshot.jobs_created,
                ticks = snapshot.reporter_ticks,
                "periodic report"
            );
        }
    })
}
