//! The single job shape carried on the queue, grounded on
//! `original_source/.../job_producer.py`'s `enqueue_task` payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pipeline_models::{TaskId, TaskType, VideoId};

/// One ML task dispatched to an inference worker.
///
/// `job_id` is deterministic (`ml_{task_id}`, `spec.md` §4.5) so enqueuing
/// the same task twice is a no-op rather than a duplicate job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlTaskJob {
    pub job_id: String,
    pub task_id: TaskId,
    pub task_type: TaskType,
    pub video_id: VideoId,
    pub video_path: String,
    /// Disambiguates per-language multi-run tasks; mirrors `Task::language`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Producer configuration, passed through opaquely (`spec.md` §1: model
    /// execution is out of scope — this repository never interprets it).
    #[serde(default)]
    pub config: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl MlTaskJob {
    pub fn new(task_id: TaskId, task_type: TaskType, video_id: VideoId, video_path: impl Into<String>) -> Self {
        Self {
            job_id: job_id_for(task_id),
            task_id,
            task_type,
            video_id,
            video_path: video_path.into(),
            language: None,
            config: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }
}

/// The deterministic job id for a task (`spec.md` §4.5: `ml_{task_id}`).
pub fn job_id_for(task_id: TaskId) -> String {
    format!("ml_{task_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_id_is_deterministic_for_the_same_task() {
        let task_id = TaskId::new();
        assert_eq!(job_id_for(task_id), job_id_for(task_id));
        assert_eq!(job_id_for(task_id), format!("ml_{task_id}"));
    }

    #[test]
    fn ml_task_job_serde_roundtrip_preserves_every_field() {
        let job = MlTaskJob::new(TaskId::new(), TaskType::ObjectDetection, VideoId::new(), "/videos/a.mp4")
            .with_language(Some("en".to_string()))
            .with_config(serde_json::json!({"model_name": "yolov8n.pt"}));

        let json = serde_json::to_string(&job).expect("serialize MlTaskJob");
        let decoded: MlTaskJob = serde_json::from_str(&json).expect("deserialize MlTaskJob");

        assert_eq!(decoded.job_id, job.job_id);
        assert_eq!(decoded.task_id, job.task_id);
        assert_eq!(decoded.task_type, job.task_type);
        assert_eq!(decoded.video_id, job.video_id);
        assert_eq!(decoded.video_path, job.video_path);
        assert_eq!(decoded.language, job.language);
        assert_eq!(decoded.config, job.config);
    }
}
