//! Per-task-type worker pool: `worker_count` concurrent claim loops,
//! each started with random jitter so a freshly launched fleet doesn't
//! poll the database in lockstep (`spec.md` §4.2, grounded on
//! `vclip-worker::executor::JobExecutor::run`'s spawn-plus-claim-loop
//! shape).

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use pipeline_models::profile::{ResourceType, WorkerConfig as TaskWorkerConfig};
use pipeline_models::{Task, TaskType, Video};
use pipeline_store::{StoreResult, TaskRepository, VideoRepository};

use crate::gpu::GpuGate;
use crate::task_executor::TaskExecutor;

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(500);
const STARTUP_JITTER_MAX_MS: u64 = 5_000;

/// One worker pool per task type: `worker_count` concurrent loops, each
/// repeatedly claiming the next eligible pending task via
/// `TaskRepository::claim_next_pending` — the dependency graph has
/// already been resolved by the time a task row reaches `pending`, so the
/// claim itself needs no further readiness check — and handing it to a
/// shared `TaskExecutor`.
pub struct WorkerPool {
    task_type: TaskType,
    worker_count: u32,
    tasks: TaskRepository,
    videos: VideoRepository,
    executor: Arc<TaskExecutor>,
    gpu_gate: Option<GpuGate>,
}

impl WorkerPool {
    pub fn new(
        config: TaskWorkerConfig,
        tasks: TaskRepository,
        videos: VideoRepository,
        executor: Arc<TaskExecutor>,
        gpu_gate: Option<GpuGate>,
    ) -> Self {
        Self {
            task_type: config.task_type,
            worker_count: config.worker_count,
            tasks,
            videos,
            executor,
            gpu_gate: if config.resource_type == ResourceType::Gpu { gpu_gate } else { None },
        }
    }

    pub fn spawn(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> Vec<tokio::task::JoinHandle<()>> {
        (0..self.worker_count)
            .map(|worker_index| {
                let pool = Arc::clone(&self);
                let mut shutdown = shutdown.clone();
                tokio::spawn(async move {
                    let jitter_ms = rand::thread_rng().gen_range(0..=STARTUP_JITTER_MAX_MS);
                    tokio::time::sleep(Duration::from_millis(jitter_ms)).await;
                    info!(task_type = %pool.task_type, worker_index, "worker pool loop started");
                    pool.run_loop(&mut shutdown).await;
                })
            })
            .collect()
    }

    async fn run_loop(&self, shutdown: &mut watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.claim().await {
                Ok(Some((task, video))) => {
                    let _permit = match &self.gpu_gate {
                        Some(gate) => Some(gate.acquire().await),
                        None => None,
                    };
                    self.executor.execute(task, video).await;
                }
                Ok(None) => {
                    tokio::select! {
                        _ = shutdown.changed() => {}
                        _ = tokio::time::sleep(IDLE_POLL_INTERVAL) => {}
                    }
                }
                Err(e) => {
                    warn!(task_type = %self.task_type, error = %e, "claim failed");
                    tokio::time::sleep(IDLE_POLL_INTERVAL).await;
                }
            }
        }
        debug!(task_type = %self.task_type, "worker pool loop stopped");
    }

    async fn claim(&self) -> StoreResult<Option<(Task, Video)>> {
        let Some(task) = self.tasks.claim_next_pending(self.task_type).await? else {
            return Ok(None);
        };
        let video = self.videos.get(task.video_id).await?;
        Ok(Some((task, video)))
    }
}
