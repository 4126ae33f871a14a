//! Task creation, readiness, and completion/failure handling
//! (`spec.md` §4.1, grounded on `task_orchestrator.py`).

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use tracing::{error, info, warn};

use pipeline_models::{Task, TaskId, TaskStatus, TaskType, Video, VideoId};
use pipeline_queue::{JobQueue, MlTaskJob, QueueConfig};
use pipeline_store::{PgPool, TaskRepository, VideoRepository};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::readiness::is_ready_for_creation;

/// Per-type pending/running counts, `spec.md` §4.1's `get_queue_status()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStatus {
    pub pending: i64,
    pub running: i64,
}

/// Owns the durable repositories and one job queue per task type, and
/// implements the orchestration operations from `task_orchestrator.py`:
/// `create_tasks_for_video`, `get_queue_status`, `retry_failed_tasks`,
/// `handle_task_completion`, `handle_task_failure`.
pub struct Orchestrator {
    videos: VideoRepository,
    tasks: TaskRepository,
    queues: HashMap<TaskType, JobQueue>,
}

impl Orchestrator {
    /// Builds one `JobQueue` per task type against `redis_url` and ensures
    /// each stream's consumer group exists before returning.
    pub async fn new(pool: PgPool, redis_url: &str) -> OrchestratorResult<Self> {
        let mut queues = HashMap::with_capacity(TaskType::ALL.len());
        for task_type in TaskType::ALL {
            let queue = JobQueue::new(QueueConfig::for_task_type(redis_url, task_type))?;
            queue.init().await?;
            queues.insert(task_type, queue);
        }
        Ok(Self {
            videos: VideoRepository::new(pool.clone()),
            tasks: TaskRepository::new(pool),
            queues,
        })
    }

    /// Idempotent: only creates tasks whose readiness rule currently holds
    /// and which do not already exist non-failed (`spec.md` §4.1).
    pub async fn create_tasks_for_video(&self, video: &Video) -> OrchestratorResult<Vec<Task>> {
        let existing = self.tasks.find_by_video_id(video.video_id).await?;

        let completed_types: BTreeSet<TaskType> = existing
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .map(|t| t.task_type)
            .collect();
        let existing_non_failed_types: BTreeSet<TaskType> = existing
            .iter()
            .filter(|t| t.status != TaskStatus::Failed)
            .map(|t| t.task_type)
            .collect();
        let completed_ids: HashMap<TaskType, TaskId> = existing
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .map(|t| (t.task_type, t.task_id))
            .collect();

        let mut created = Vec::new();
        for task_type in TaskType::ALL {
            if !is_ready_for_creation(video, task_type, &completed_types, &existing_non_failed_types) {
                continue;
            }

            let mut task = Task::new(video.video_id, task_type, None);
            task.dependencies = task_type
                .dependencies()
                .iter()
                .filter_map(|dep| completed_ids.get(dep).copied())
                .collect();

            self.tasks.save(&task).await?;
            self.enqueue_task(video, &task).await?;
            info!(task_id = %task.task_id, task_type = %task_type, video_id = %video.video_id, "created task");
            created.push(task);
        }

        Ok(created)
    }

    async fn enqueue_task(&self, video: &Video, task: &Task) -> OrchestratorResult<()> {
        let queue = self
            .queues
            .get(&task.task_type)
            .ok_or_else(|| OrchestratorError::NoQueueForType(task.task_type.to_string()))?;

        let job = MlTaskJob::new(task.task_id, task.task_type, video.video_id, video.file_path.clone())
            .with_language(task.language.clone());

        match queue.enqueue(job).await {
            Ok(_) => Ok(()),
            // Duplicate enqueues are a no-op (`spec.md` §4.5): the task was
            // already created and dispatched by a prior, racing call.
            Err(e) if e.is_duplicate() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Marks `task_id` completed, applies the hash-task side effect
    /// (`file_hash` is `Some` only when the completed task was `hash`),
    /// then recomputes readiness and checks for overall video completion.
    pub async fn handle_task_completion(
        &self,
        task_id: TaskId,
        file_hash: Option<String>,
    ) -> OrchestratorResult<Vec<Task>> {
        let mut task = self
            .tasks
            .find_by_id(task_id)
            .await?
            .ok_or_else(|| pipeline_store::StoreError::TaskNotFound(task_id.to_string()))?;
        task.complete();
        self.tasks.save(&task).await?;

        let mut video = self.videos.get(task.video_id).await?;
        if task.task_type == TaskType::Hash {
            if let Some(hash) = file_hash {
                video.mark_hashed(hash);
            }
            video.mark_processing();
            self.videos.save(&video).await?;
        }

        let newly_created = self.create_tasks_for_video(&video).await?;
        self.maybe_complete_video(&mut video).await?;

        Ok(newly_created)
    }

    /// Fatal failure of `hash` marks the video failed; failure of any other
    /// type is task-local and does not affect siblings (`spec.md` §4.1).
    pub async fn handle_task_failure(&self, task_id: TaskId, error: impl Into<String>) -> OrchestratorResult<()> {
        let mut task = self
            .tasks
            .find_by_id(task_id)
            .await?
            .ok_or_else(|| pipeline_store::StoreError::TaskNotFound(task_id.to_string()))?;
        task.fail(error);
        self.tasks.save(&task).await?;

        if task.task_type == TaskType::Hash {
            let mut video = self.videos.get(task.video_id).await?;
            video.mark_failed();
            self.videos.save(&video).await?;
        }

        Ok(())
    }

    /// All twelve task types have a completed task and none have failed:
    /// mark the video completed (`spec.md` §4.1 step 4).
    async fn maybe_complete_video(&self, video: &mut Video) -> OrchestratorResult<()> {
        let tasks = self.tasks.find_by_video_id(video.video_id).await?;
        if tasks.iter().any(|t| t.status == TaskStatus::Failed) {
            return Ok(());
        }
        let completed_types: BTreeSet<TaskType> = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .map(|t| t.task_type)
            .collect();
        if TaskType::ALL.iter().all(|t| completed_types.contains(t)) {
            video.mark_completed();
            self.videos.save(video).await?;
        }
        Ok(())
    }

    /// Resets matching failed tasks to pending and re-enqueues them.
    /// Scoped to one video, or global when `video_id` is `None`
    /// (`spec.md` §4.1).
    pub async fn retry_failed_tasks(&self, video_id: Option<VideoId>) -> OrchestratorResult<usize> {
        let failed = match video_id {
            Some(id) => self.tasks.find_by_video_and_status(id, TaskStatus::Failed).await?,
            None => self.tasks.find_by_status(TaskStatus::Failed).await?,
        };

        let mut retried = 0;
        for mut task in failed {
            let video = self.videos.get(task.video_id).await?;
            task.retry();
            self.tasks.save(&task).await?;
            self.enqueue_task(&video, &task).await?;
            warn!(task_id = %task.task_id, task_type = %task.task_type, "retried failed task");
            retried += 1;
        }
        Ok(retried)
    }

    /// Per-type pending/running counts, used by the reconciler and by tests
    /// to assert drain completion (`SPEC_FULL.md` §4.1).
    pub async fn get_queue_status(&self) -> OrchestratorResult<HashMap<TaskType, QueueStatus>> {
        let mut status = HashMap::with_capacity(TaskType::ALL.len());
        for task_type in TaskType::ALL {
            let pending = self.tasks.count_by_type_status(task_type, TaskStatus::Pending).await?;
            let running = self.tasks.count_by_type_status(task_type, TaskStatus::Running).await?;
            status.insert(task_type, QueueStatus { pending, running });
        }
        Ok(status)
    }

    /// Exposes the per-type job queue, used by `pipeline-worker`'s
    /// reconciler sweep to check job existence against running/pending
    /// tasks.
    pub fn queue_for(&self, task_type: TaskType) -> Option<&JobQueue> {
        self.queues.get(&task_type)
    }

    /// One sweep of the reconciler (`spec.md` §4.5): the durable store is
    /// the single source of truth, the queue is a cache. `pipeline-worker`
    /// calls this on `RECONCILE_INTERVAL_SECS`; it never runs itself.
    ///
    /// - Pending task with no corresponding job in the queue (queue data
    ///   loss) → re-enqueue.
    /// - Running task with no corresponding job in the queue (worker died
    ///   without acking, job fell off the stream) → reset to pending and
    ///   re-enqueue.
    /// - Running task older than `stall_threshold` → alert only, never
    ///   auto-killed.
    pub async fn reconcile(&self, stall_threshold: chrono::Duration) -> OrchestratorResult<ReconcileReport> {
        let mut report = ReconcileReport::default();

        for task in self.tasks.find_by_status(TaskStatus::Pending).await? {
            let Some(queue) = self.queues.get(&task.task_type) else { continue };
            let job_id = pipeline_queue::job_id_for(task.task_id);
            if !queue.job_exists(&job_id).await? {
                let video = self.videos.get(task.video_id).await?;
                self.enqueue_task(&video, &task).await?;
                warn!(task_id = %task.task_id, "reconciler re-enqueued pending task missing from queue");
                report.reenqueued_pending += 1;
            }
        }

        let now = Utc::now();
        for task in self.tasks.find_by_status(TaskStatus::Running).await? {
            let Some(queue) = self.queues.get(&task.task_type) else { continue };
            let job_id = pipeline_queue::job_id_for(task.task_id);

            if !queue.job_exists(&job_id).await? {
                let mut reset = task.clone();
                reset.retry();
                self.tasks.save(&reset).await?;
                let video = self.videos.get(reset.video_id).await?;
                self.enqueue_task(&video, &reset).await?;
                warn!(task_id = %task.task_id, "reconciler reset stalled running task to pending and re-enqueued");
                report.reset_and_reenqueued += 1;
                continue;
            }

            if let Some(started_at) = task.started_at {
                if now - started_at > stall_threshold {
                    error!(task_id = %task.task_id, task_type = %task.task_type, started_at = %started_at, "task has exceeded the stall threshold; alerting, not auto-killing");
                    report.stalled_alerts += 1;
                }
            }
        }

        Ok(report)
    }
}

/// Summary of one `Orchestrator::reconcile` sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub reenqueued_pending: usize,
    pub reset_and_reenqueued: usize,
    pub stalled_alerts: usize,
}
