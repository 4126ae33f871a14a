//! The canonical ML output envelope and its provenance block.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{ArtifactId, RunId, VideoId};
use crate::payload::ArtifactPayload;

/// Coarse quality/speed knob attached to every envelope for selection
/// purposes (`spec.md` glossary: "Model profile").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ModelProfile {
    Fast,
    Balanced,
    HighQuality,
}

impl ModelProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelProfile::Fast => "fast",
            ModelProfile::Balanced => "balanced",
            ModelProfile::HighQuality => "high_quality",
        }
    }

    /// Quality rank used by the `best_quality` selection policy
    /// (DESIGN.md Open Question 1): higher ranks first.
    pub fn quality_rank(&self) -> u8 {
        match self {
            ModelProfile::HighQuality => 2,
            ModelProfile::Balanced => 1,
            ModelProfile::Fast => 0,
        }
    }
}

impl fmt::Display for ModelProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The string identifying an artifact's type, as carried on every envelope
/// and used by the schema registry and projection-handler dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    #[serde(rename = "transcript.segment")]
    TranscriptSegment,
    Scene,
    #[serde(rename = "object.detection")]
    ObjectDetection,
    #[serde(rename = "face.detection")]
    FaceDetection,
    #[serde(rename = "ocr.text")]
    OcrText,
    #[serde(rename = "place.classification")]
    PlaceClassification,
    #[serde(rename = "video.metadata")]
    VideoMetadata,
}

impl ArtifactType {
    pub const ALL: [ArtifactType; 7] = [
        ArtifactType::TranscriptSegment,
        ArtifactType::Scene,
        ArtifactType::ObjectDetection,
        ArtifactType::FaceDetection,
        ArtifactType::OcrText,
        ArtifactType::PlaceClassification,
        ArtifactType::VideoMetadata,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactType::TranscriptSegment => "transcript.segment",
            ArtifactType::Scene => "scene",
            ArtifactType::ObjectDetection => "object.detection",
            ArtifactType::FaceDetection => "face.detection",
            ArtifactType::OcrText => "ocr.text",
            ArtifactType::PlaceClassification => "place.classification",
            ArtifactType::VideoMetadata => "video.metadata",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        Some(match s {
            "transcript.segment" => ArtifactType::TranscriptSegment,
            "scene" => ArtifactType::Scene,
            "object.detection" => ArtifactType::ObjectDetection,
            "face.detection" => ArtifactType::FaceDetection,
            "ocr.text" => ArtifactType::OcrText,
            "place.classification" => ArtifactType::PlaceClassification,
            "video.metadata" => ArtifactType::VideoMetadata,
            _ => return None,
        })
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Full provenance block carried by every envelope (`spec.md` §3.1, §6).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Provenance {
    pub producer: String,
    pub producer_version: String,
    pub model_profile: ModelProfile,
    /// First 16 hex chars of sha256 of the canonically-serialized
    /// (sorted-keys) producer config.
    pub config_hash: String,
    /// First 16 hex chars of xxhash64 over the video file contents.
    pub input_hash: String,
    pub run_id: RunId,
    pub created_at: DateTime<Utc>,
}

/// The canonical, append-only wrapper around an artifact's payload.
///
/// Once written, an envelope is never mutated. Multiple envelopes may
/// coexist for the same `(asset_id, artifact_type, span)` across different
/// runs/profiles.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ArtifactEnvelope {
    pub artifact_id: ArtifactId,
    pub asset_id: VideoId,
    pub artifact_type: ArtifactType,
    pub schema_version: u32,
    pub span_start_ms: i64,
    pub span_end_ms: i64,
    pub payload: ArtifactPayload,
    pub provenance: Provenance,
}

impl ArtifactEnvelope {
    /// `start_ms <= end_ms` and both non-negative, per `spec.md` §3.1.
    pub fn span_is_valid(&self) -> bool {
        self.span_start_ms >= 0 && self.span_end_ms >= 0 && self.span_start_ms <= self.span_end_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_rank_orders_high_quality_first() {
        assert!(ModelProfile::HighQuality.quality_rank() > ModelProfile::Balanced.quality_rank());
        assert!(ModelProfile::Balanced.quality_rank() > ModelProfile::Fast.quality_rank());
    }

    #[test]
    fn artifact_type_round_trips_through_wire_string() {
        for t in [
            ArtifactType::TranscriptSegment,
            ArtifactType::Scene,
            ArtifactType::ObjectDetection,
            ArtifactType::FaceDetection,
            ArtifactType::OcrText,
            ArtifactType::PlaceClassification,
            ArtifactType::VideoMetadata,
        ] {
            assert_eq!(ArtifactType::from_str_opt(t.as_str()), Some(t));
        }
    }
}
