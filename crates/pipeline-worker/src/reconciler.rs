//! Periodic reconciler sweep scheduling (`spec.md` §4.5). The algorithm
//! itself lives in `pipeline_orchestrator::Orchestrator::reconcile`; this
//! module only owns the interval loop and shutdown wiring.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use pipeline_orchestrator::Orchestrator;

pub fn spawn(
    orchestrator: Arc<Orchestrator>,
    interval: Duration,
    stall_threshold: chrono::Duration,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    match orchestrator.reconcile(stall_threshold).await {
                        Ok(report) => {
                            if report.reenqueued_pending > 0 || report.reset_and_reenqueued > 0 || report.stalled_alerts > 0 {
                                info!(
                                    reenqueued_pending = report.reenqueued_pending,
                                    reset_and_reenqueued = report.reset_and_reenqueued,
                                    stalled_alerts = report.stalled_alerts,
                                    "reconciler sweep completed"
                                );
                            }
                        }
                        Err(e) => warn!(error = %e, "reconciler sweep failed"),
                    }
                }
            }
        }
    })
}
