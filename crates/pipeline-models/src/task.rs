//! Task model and the fixed dependency graph between task types.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::ids::{TaskId, VideoId};

/// One of the twelve ML task types the orchestrator can create for a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Hash,
    Transcription,
    SceneDetection,
    ObjectDetection,
    FaceDetection,
    Ocr,
    PlaceDetection,
    MetadataExtraction,
    ThumbnailExtraction,
    TopicExtraction,
    EmbeddingGeneration,
    ThumbnailGeneration,
}

impl TaskType {
    pub const ALL: [TaskType; 12] = [
        TaskType::Hash,
        TaskType::Transcription,
        TaskType::SceneDetection,
        TaskType::ObjectDetection,
        TaskType::FaceDetection,
        TaskType::Ocr,
        TaskType::PlaceDetection,
        TaskType::MetadataExtraction,
        TaskType::ThumbnailExtraction,
        TaskType::TopicExtraction,
        TaskType::EmbeddingGeneration,
        TaskType::ThumbnailGeneration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Hash => "hash",
            TaskType::Transcription => "transcription",
            TaskType::SceneDetection => "scene_detection",
            TaskType::ObjectDetection => "object_detection",
            TaskType::FaceDetection => "face_detection",
            TaskType::Ocr => "ocr",
            TaskType::PlaceDetection => "place_detection",
            TaskType::MetadataExtraction => "metadata_extraction",
            TaskType::ThumbnailExtraction => "thumbnail_extraction",
            TaskType::TopicExtraction => "topic_extraction",
            TaskType::EmbeddingGeneration => "embedding_generation",
            TaskType::ThumbnailGeneration => "thumbnail_generation",
        }
    }

    /// The fixed dependency graph from `spec.md` §4.1. A task of this type
    /// may only be created once every type in the returned set has a
    /// completed task recorded for the video.
    pub fn dependencies(&self) -> &'static [TaskType] {
        use TaskType::*;
        match self {
            Hash => &[],
            Transcription | SceneDetection | ObjectDetection | FaceDetection | Ocr
            | PlaceDetection | MetadataExtraction => &[Hash],
            TopicExtraction | EmbeddingGeneration => &[Hash, Transcription],
            ThumbnailGeneration => &[Hash, SceneDetection],
            ThumbnailExtraction => &[
                Hash,
                Transcription,
                SceneDetection,
                ObjectDetection,
                FaceDetection,
                Ocr,
                PlaceDetection,
                MetadataExtraction,
                TopicExtraction,
                EmbeddingGeneration,
                ThumbnailGeneration,
            ],
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Priority mapping from `spec.md` §4.1 (1 = highest, ties break FIFO by
    /// creation time).
    pub fn priority(&self) -> TaskPriority {
        use TaskType::*;
        match self {
            Hash => TaskPriority::Critical,
            Transcription | EmbeddingGeneration => TaskPriority::High,
            SceneDetection | ObjectDetection | FaceDetection | Ocr | PlaceDetection
            | MetadataExtraction => TaskPriority::Medium,
            TopicExtraction | ThumbnailGeneration | ThumbnailExtraction => TaskPriority::Low,
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Numeric task priority; 1 is highest, 10 is lowest per `spec.md` §3.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[repr(i16)]
pub enum TaskPriority {
    Critical = 1,
    High = 2,
    Medium = 3,
    Low = 4,
}

impl TaskPriority {
    pub fn as_i16(&self) -> i16 {
        *self as i16
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        Some(match value {
            1 => TaskPriority::Critical,
            2 => TaskPriority::High,
            3 => TaskPriority::Medium,
            4 => TaskPriority::Low,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled)
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        Some(match s {
            "pending" => TaskStatus::Pending,
            "running" => TaskStatus::Running,
            "completed" => TaskStatus::Completed,
            "failed" => TaskStatus::Failed,
            "cancelled" => TaskStatus::Cancelled,
            _ => return None,
        })
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A unit of work the orchestrator has created for a video.
///
/// Invariants (`spec.md` §3.1): `(video_id, task_type, language)` is unique
/// among non-failed tasks; `started_at <= completed_at`; a task transitions
/// pending -> running exactly once except on explicit retry.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Task {
    pub task_id: TaskId,
    pub video_id: VideoId,
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// Ids of tasks that must complete before this one may be claimed.
    /// Populated at creation time from `TaskType::dependencies` resolved to
    /// concrete task ids for this video.
    pub dependencies: BTreeSet<TaskId>,
    /// Disambiguates per-language multi-run tasks (e.g. transcription in
    /// multiple languages). `None` for task types with no language axis.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Task {
    pub fn new(video_id: VideoId, task_type: TaskType, language: Option<String>) -> Self {
        Self {
            task_id: TaskId::new(),
            video_id,
            task_type,
            status: TaskStatus::Pending,
            priority: task_type.priority(),
            dependencies: BTreeSet::new(),
            language,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error: None,
        }
    }

    pub fn start(&mut self) {
        self.status = TaskStatus::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn complete(&mut self) {
        self.status = TaskStatus::Completed;
        self.completed_at = Some(Utc::now());
        self.error = None;
    }

    /// Marks the task failed but does not clear `error` afterwards; used
    /// both for hard failures and for the partial-success
    /// `thumbnail_extraction` case (see DESIGN.md Open Question 2), where a
    /// task can carry a non-fatal `error` while still `Completed`.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = TaskStatus::Failed;
        self.completed_at = Some(Utc::now());
        self.error = Some(error.into());
    }

    /// Reset for manual retry: pending, cleared error/started_at, per
    /// `spec.md` §4.1 failure handling.
    pub fn retry(&mut self) {
        self.status = TaskStatus::Pending;
        self.started_at = None;
        self.completed_at = None;
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_has_no_dependencies() {
        assert!(TaskType::Hash.dependencies().is_empty());
    }

    #[test]
    fn thumbnail_extraction_depends_on_every_producer() {
        let deps = TaskType::ThumbnailExtraction.dependencies();
        assert!(deps.contains(&TaskType::ObjectDetection));
        assert!(deps.contains(&TaskType::EmbeddingGeneration));
        assert!(deps.contains(&TaskType::ThumbnailGeneration));
        assert_eq!(deps.len(), 10);
    }

    #[test]
    fn priority_mapping_matches_spec() {
        assert_eq!(TaskType::Hash.priority(), TaskPriority::Critical);
        assert_eq!(TaskType::Transcription.priority(), TaskPriority::High);
        assert_eq!(TaskType::ObjectDetection.priority(), TaskPriority::Medium);
        assert_eq!(TaskType::TopicExtraction.priority(), TaskPriority::Low);
    }

    #[test]
    fn retry_clears_timestamps_and_error() {
        let mut task = Task::new(VideoId::new(), TaskType::Hash, None);
        task.start();
        task.fail("boom");
        task.retry();
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.started_at.is_none());
        assert!(task.error.is_none());
    }
}
