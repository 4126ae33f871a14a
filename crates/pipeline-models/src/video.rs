//! Video asset model.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::VideoId;

/// Lifecycle status of a video asset, driven exclusively by the orchestrator
/// and task completion events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    /// Created by discovery; no hash task has completed yet.
    #[default]
    Discovered,
    /// Hash task completed; parallel ML tasks may now be created.
    Hashed,
    /// At least one non-hash task is running.
    Processing,
    /// Every expected task completed and none failed.
    Completed,
    /// The hash task (or another fatal path) failed.
    Failed,
    /// The file disappeared from disk (discovery collaborator only; terminal).
    Missing,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Discovered => "discovered",
            VideoStatus::Hashed => "hashed",
            VideoStatus::Processing => "processing",
            VideoStatus::Completed => "completed",
            VideoStatus::Failed => "failed",
            VideoStatus::Missing => "missing",
        }
    }

    /// Whether this status accepts further task creation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoStatus::Completed | VideoStatus::Failed | VideoStatus::Missing)
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A video asset tracked by the pipeline.
///
/// `file_path` and `video_id` are unique across the store. `file_created_at`
/// is the critical sort key for the global timeline (§4.4) and is left
/// nullable because not every container format carries creation-time EXIF.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Video {
    pub video_id: VideoId,
    pub file_path: String,
    pub filename: String,
    pub file_size: i64,
    /// Content hash, set once the `hash` task completes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    pub last_modified: DateTime<Utc>,
    /// EXIF or filesystem creation time. Nullable; sorts last under the
    /// global ordering when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_created_at: Option<DateTime<Utc>>,
    pub status: VideoStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    /// Construct a freshly discovered video (called by the out-of-scope
    /// discovery collaborator; kept here since the orchestrator consumes
    /// this shape directly per `spec.md` §6).
    pub fn discovered(
        file_path: impl Into<String>,
        filename: impl Into<String>,
        file_size: i64,
        last_modified: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            video_id: VideoId::new(),
            file_path: file_path.into(),
            filename: filename.into(),
            file_size,
            file_hash: None,
            duration_seconds: None,
            last_modified,
            file_created_at: None,
            status: VideoStatus::Discovered,
            processed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_processed(&self) -> bool {
        matches!(self.status, VideoStatus::Completed)
    }

    pub fn mark_hashed(&mut self, file_hash: impl Into<String>) {
        self.file_hash = Some(file_hash.into());
        self.status = VideoStatus::Hashed;
        self.updated_at = Utc::now();
    }

    pub fn mark_processing(&mut self) {
        self.status = VideoStatus::Processing;
        self.updated_at = Utc::now();
    }

    pub fn mark_completed(&mut self) {
        self.status = VideoStatus::Completed;
        self.processed_at = Some(Utc::now());
        self.updated_at = Utc::now();
    }

    pub fn mark_failed(&mut self) {
        self.status = VideoStatus::Failed;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovered_video_starts_in_discovered_state() {
        let v = Video::discovered("/videos/a.mp4", "a.mp4", 1024, Utc::now());
        assert_eq!(v.status, VideoStatus::Discovered);
        assert!(v.file_hash.is_none());
    }

    #[test]
    fn hashing_transitions_status_and_sets_hash() {
        let mut v = Video::discovered("/videos/a.mp4", "a.mp4", 1024, Utc::now());
        v.mark_hashed("abc123");
        assert_eq!(v.status, VideoStatus::Hashed);
        assert_eq!(v.file_hash.as_deref(), Some("abc123"));
    }

    #[test]
    fn completed_status_is_terminal() {
        assert!(VideoStatus::Completed.is_terminal());
        assert!(!VideoStatus::Hashed.is_terminal());
    }
}
