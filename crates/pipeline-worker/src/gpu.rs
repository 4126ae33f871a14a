//! GPU concurrency bound (`spec.md` §5): one process-wide semaphore shared
//! by every GPU-resource task type's worker pool, grounded on the
//! `job_semaphore` pattern in `vclip-worker::executor::JobExecutor`.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Clone)]
pub struct GpuGate {
    semaphore: Arc<Semaphore>,
}

impl GpuGate {
    pub fn new(concurrency: usize) -> Self {
        Self { semaphore: Arc::new(Semaphore::new(concurrency.max(1))) }
    }

    /// Held for the duration of one GPU task's execution.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("gpu semaphore is never closed")
    }
}
