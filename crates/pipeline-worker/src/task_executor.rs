//! One claim -> execute -> complete/fail cycle for a single task
//! (`spec.md` §4.2, grounded on `vclip-worker::executor::JobExecutor::execute_job`).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, warn};

use pipeline_models::{Run, RunStatus, Task, TaskType, Video};
use pipeline_orchestrator::Orchestrator;
use pipeline_producer::{input_hash, ProducerConfig};
use pipeline_store::{ArtifactStore, RunRepository};

use crate::convert::to_envelopes;
use crate::error::WorkerResult;
use crate::producer_client::ProducerClient;

/// Runs a single claimed task against the ML producer (or, for the `hash`
/// task type, the local content hash) and reports the outcome back to the
/// orchestrator so dependent tasks can become eligible.
pub struct TaskExecutor {
    orchestrator: Arc<Orchestrator>,
    artifacts: ArtifactStore,
    runs: RunRepository,
    producer: ProducerClient,
    timeout: Duration,
}

impl TaskExecutor {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        artifacts: ArtifactStore,
        runs: RunRepository,
        producer: ProducerClient,
        timeout: Duration,
    ) -> Self {
        Self { orchestrator, artifacts, runs, producer, timeout }
    }

    pub async fn execute(&self, task: Task, video: Video) {
        let task_id = task.task_id;
        let task_type = task.task_type;

        match tokio::time::timeout(self.timeout, self.run(&task, &video)).await {
            Ok(Ok(file_hash)) => {
                if let Err(e) = self.orchestrator.handle_task_completion(task_id, file_hash).await {
                    error!(task_id = %task_id, error = %e, "failed to record task completion");
                }
            }
            Ok(Err(e)) => {
                warn!(task_id = %task_id, %task_type, error = %e, "task failed");
                if let Err(report_err) = self.orchestrator.handle_task_failure(task_id, e.to_string()).await {
                    error!(task_id = %task_id, error = %report_err, "failed to record task failure");
                }
            }
            Err(_) => {
                let msg = format!("task exceeded {:?} timeout", self.timeout);
                warn!(task_id = %task_id, %task_type, "{}", msg);
                if let Err(report_err) = self.orchestrator.handle_task_failure(task_id, msg).await {
                    error!(task_id = %task_id, error = %report_err, "failed to record task timeout");
                }
            }
        }
    }

    async fn run(&self, task: &Task, video: &Video) -> WorkerResult<Option<String>> {
        if task.task_type == TaskType::Hash {
            return Ok(Some(input_hash(&video.file_path)?));
        }

        let started_at = Utc::now();
        let response = self
            .producer
            .invoke(task.task_type, &video.file_path, ProducerConfig::default())
            .await?;

        // `artifacts.run_id` is a foreign key into `runs`; the run this
        // producer invocation belongs to must exist before any envelope
        // referencing it is inserted (spec.md §3.1).
        let run = Run {
            run_id: response.run_id,
            asset_id: video.video_id,
            pipeline_profile: response.model_profile.as_str().to_string(),
            started_at,
            finished_at: Some(Utc::now()),
            status: RunStatus::Completed,
            error: None,
        };
        self.runs.save(&run).await?;

        let envelopes = to_envelopes(video.video_id, task.task_type, &response);
        if !envelopes.is_empty() {
            self.artifacts.batch_create(envelopes).await?;
        }

        Ok(None)
    }
}
