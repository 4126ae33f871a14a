//! The readiness rule from `spec.md` §4.1, grounded on
//! `task_orchestrator.py`'s `is_video_ready_for_task_type` and
//! `TaskDependencyManager.is_task_ready`.

use std::collections::BTreeSet;

use pipeline_models::{TaskType, Video, VideoStatus};

/// Condition 1: is the video's lifecycle status compatible with creating a
/// task of `task_type`.
///
/// The source's three-tier match (hash / parallel / dependent) only covers
/// eight of our twelve task types; `thumbnail_extraction` depends on every
/// producer (`TaskType::dependencies`) so it belongs in the same tier as the
/// other dependency-gated tasks — condition 2 below is what actually keeps
/// it from running before its producers finish.
pub fn is_status_compatible(video: &Video, task_type: TaskType) -> bool {
    use TaskType::*;
    match task_type {
        Hash => video.status == VideoStatus::Discovered && video.file_hash.is_none(),
        Transcription | SceneDetection | ObjectDetection | FaceDetection | Ocr | PlaceDetection
        | MetadataExtraction => {
            // `handle_task_completion` promotes the video straight to
            // `Processing` once it is hashed (spec.md §4.1 step 2), so this
            // tier must accept both: `Hashed` for the instant the hash task
            // completes, `Processing` for every completion after that.
            matches!(video.status, VideoStatus::Hashed | VideoStatus::Processing)
                && video.file_hash.is_some()
        }
        TopicExtraction | EmbeddingGeneration | ThumbnailGeneration | ThumbnailExtraction => {
            matches!(video.status, VideoStatus::Processing | VideoStatus::Completed)
                && video.file_hash.is_some()
        }
    }
}

/// All three readiness conditions from `spec.md` §4.1:
/// 1. status compatibility (above)
/// 2. every dependency type already completed for this video
/// 3. no non-failed task of this `(video_id, task_type)` already exists
pub fn is_ready_for_creation(
    video: &Video,
    task_type: TaskType,
    completed_types: &BTreeSet<TaskType>,
    existing_non_failed_types: &BTreeSet<TaskType>,
) -> bool {
    is_status_compatible(video, task_type)
        && task_type.dependencies().iter().all(|dep| completed_types.contains(dep))
        && !existing_non_failed_types.contains(&task_type)
}
