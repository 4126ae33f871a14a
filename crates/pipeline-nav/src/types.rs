//! Request/response shapes for the navigation engine, grounded on
//! `original_source/backend/src/domain/models.py`'s `GlobalJumpResult`/
//! `JumpTo` and `spec.md` §4.4's kind/filter table.

use chrono::{DateTime, Utc};
use pipeline_models::{ArtifactId, VideoId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One of the seven artifact kinds the navigation engine can jump between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Object,
    Face,
    Transcript,
    Ocr,
    Scene,
    Place,
    Location,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Object => "object",
            Kind::Face => "face",
            Kind::Transcript => "transcript",
            Kind::Ocr => "ocr",
            Kind::Scene => "scene",
            Kind::Place => "place",
            Kind::Location => "location",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

/// Bounding box filter for the `location` kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// Per-kind filters. Which fields apply depends on `Kind` (`spec.md`
/// §4.4's table); the engine rejects a filter that doesn't belong to the
/// requested kind as `NavError::InvalidParameter`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct JumpFilters {
    /// `object`/`place`: exact label match.
    pub label: Option<String>,
    /// `transcript`/`ocr`: full-text query. `location`: case-insensitive
    /// substring over `country state city`.
    pub query: Option<String>,
    /// `face`: exact cluster id match.
    pub cluster_id: Option<String>,
    /// `object`/`face`/`place`: minimum confidence, inclusive, in [0, 1].
    pub min_confidence: Option<f64>,
    /// `location`: bounding box.
    pub geo_bounds: Option<GeoBounds>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct JumpTo {
    pub start_ms: i64,
    pub end_ms: i64,
}

/// Kind-specific preview payload attached to a jump result, so a caller
/// doesn't need a second round-trip to render the match.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Preview {
    Object { label: String, confidence: f64 },
    Place { label: String, confidence: f64 },
    Face { cluster_id: Option<String>, confidence: f64 },
    Text { text: String },
    Scene { scene_index: i32 },
    Location { latitude: f64, longitude: f64, altitude: Option<f64> },
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JumpResult {
    pub video_id: VideoId,
    pub video_filename: String,
    pub file_created_at: Option<DateTime<Utc>>,
    pub jump_to: JumpTo,
    pub artifact_id: ArtifactId,
    pub preview: Preview,
}

/// Response envelope for `jump_next`/`jump_prev`: the matching artifacts,
/// up to the requested limit, plus whether at least one further match
/// exists beyond the page (`spec.md` §6's conceptual navigation API).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JumpPage {
    pub results: Vec<JumpResult>,
    pub has_more: bool,
}

/// One row of a paginated gallery search. `artifact_count` is populated
/// only when the search collapsed results to one row per video; otherwise
/// it is `None` (`spec.md` §4.4: "optionally collapses to one row per
/// video with `artifact_count`").
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GalleryItem {
    pub video_id: VideoId,
    pub video_filename: String,
    pub file_created_at: Option<DateTime<Utc>>,
    pub jump_to: JumpTo,
    pub artifact_id: ArtifactId,
    pub preview: Preview,
    pub artifact_count: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct GallerySearchParams {
    pub kind: Kind,
    pub filters: JumpFilters,
    pub filename_substring: Option<String>,
    pub limit: i64,
    pub offset: i64,
    pub collapse_to_video: bool,
}
