//! Task creation, readiness, and completion/failure orchestration
//! (`spec.md` §4.1, grounded on `task_orchestrator.py` /
//! `task_orchestration.py`).
//!
//! The durable store (`pipeline-store`) is the single source of truth for
//! task state; this crate never keeps an in-memory queue or dependency set
//! the way the source's `TaskQueues`/`TaskDependencyManager` do — every
//! readiness check re-reads the current task rows for the video, which is
//! the Rust-appropriate replacement once claiming is already atomic at the
//! store layer (`TaskRepository::claim_next_pending`).
//!
//! This crate also owns the reconciler sweep (`Orchestrator::reconcile`,
//! `spec.md` §4.5) since it is the one place that already holds both the
//! durable store and every per-type job queue; `pipeline-worker` only
//! schedules the periodic call.

mod error;
mod orchestrator;
mod readiness;

pub use error::{OrchestratorError, OrchestratorResult};
pub use orchestrator::{Orchestrator, QueueStatus, ReconcileReport};
pub use readiness::{is_ready_for_creation, is_status_compatible};

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Utc;
    use pipeline_models::{TaskType, Video};

    use super::readiness::is_ready_for_creation;

    fn discovered() -> Video {
        Video::discovered("/videos/a.mp4", "a.mp4", 1024, Utc::now())
    }

    #[test]
    fn hash_is_ready_for_a_freshly_discovered_video() {
        let video = discovered();
        let empty = BTreeSet::new();
        assert!(is_ready_for_creation(&video, TaskType::Hash, &empty, &empty));
    }

    #[test]
    fn hash_is_not_ready_once_already_present_non_failed() {
        let video = discovered();
        let empty = BTreeSet::new();
        let mut existing = BTreeSet::new();
        existing.insert(TaskType::Hash);
        assert!(!is_ready_for_creation(&video, TaskType::Hash, &empty, &existing));
    }

    #[test]
    fn parallel_task_waits_for_hash_completion() {
        let mut video = discovered();
        video.mark_hashed("abc123");
        let empty = BTreeSet::new();
        assert!(is_ready_for_creation(
            &video,
            TaskType::Transcription,
            &empty,
            &empty
        ));
    }

    #[test]
    fn dependent_task_requires_every_declared_dependency_completed() {
        let mut video = discovered();
        video.mark_hashed("abc123");
        video.mark_processing();

        let mut completed = BTreeSet::new();
        completed.insert(TaskType::Hash);
        let empty = BTreeSet::new();
        // transcription not yet completed: topic_extraction not ready.
        assert!(!is_ready_for_creation(
            &video,
            TaskType::TopicExtraction,
            &completed,
            &empty
        ));

        completed.insert(TaskType::Transcription);
        assert!(is_ready_for_creation(
            &video,
            TaskType::TopicExtraction,
            &completed,
            &empty
        ));
    }

    #[test]
    fn thumbnail_extraction_waits_on_every_producer() {
        let mut video = discovered();
        video.mark_hashed("abc123");
        video.mark_processing();

        let mut completed: BTreeSet<TaskType> = TaskType::ALL
            .into_iter()
            .filter(|t| *t != TaskType::ThumbnailExtraction)
            .collect();
        let empty = BTreeSet::new();
        assert!(is_ready_for_creation(
            &video,
            TaskType::ThumbnailExtraction,
            &completed,
            &empty
        ));

        completed.remove(&TaskType::EmbeddingGeneration);
        assert!(!is_ready_for_creation(
            &video,
            TaskType::ThumbnailExtraction,
            &completed,
            &empty
        ));
    }

    /// `handle_task_completion` promotes the video to `Processing` as soon
    /// as it is hashed, in the same call that creates the parallel ML
    /// tasks — that tier must still accept the video once it has moved
    /// past `Hashed`, or every parallel task after the first completion
    /// would stall.
    #[test]
    fn parallel_task_also_ready_once_video_has_moved_to_processing() {
        let mut video = discovered();
        video.mark_hashed("abc123");
        video.mark_processing();
        let empty = BTreeSet::new();
        assert!(is_ready_for_creation(
            &video,
            TaskType::SceneDetection,
            &empty,
            &empty
        ));
    }
}
