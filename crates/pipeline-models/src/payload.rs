//! Typed artifact payload variants.
//!
//! Each variant mirrors one of the versioned Pydantic payload schemas from
//! the original service (`domain/schemas/*.py`), reimplemented here as a
//! tagged sum type per `spec.md` §9's "dynamic payload shapes keyed by type"
//! re-architecture note: the schema registry maps `(artifact_type,
//! schema_version)` to one of these variants rather than a dynamic dict.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::rect::NormalizedRect;

/// A single transcribed word with optional per-word confidence.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Word {
    pub word: String,
    pub start: f64,
    pub end: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TranscriptSegmentV1 {
    pub text: String,
    pub start_ms: i64,
    pub end_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<Word>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SceneV1 {
    pub scene_index: u32,
    pub start_ms: i64,
    pub end_ms: i64,
    pub duration_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ObjectDetectionV1 {
    pub label: String,
    pub confidence: f64,
    pub bounding_box: NormalizedRect,
    pub frame_number: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FaceDetectionV1 {
    pub confidence: f64,
    pub bounding_box: NormalizedRect,
    pub frame_number: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct PolygonPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OcrTextV1 {
    pub text: String,
    pub confidence: f64,
    pub polygon: Vec<PolygonPoint>,
    pub languages: Vec<String>,
    pub frame_index: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlacePrediction {
    pub label: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlaceClassificationV1 {
    pub predictions: Vec<PlacePrediction>,
    pub frame_number: u64,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
}

fn default_top_k() -> u32 {
    5
}

/// Metadata extracted from a video container/EXIF block. Only the
/// projection sync path cares about `latitude`/`longitude`; the rest is
/// carried through untouched (`spec.md` §4.3).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoMetadataV1 {
    pub duration_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_date: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

/// The tagged union of every registered payload shape. The schema registry
/// validates incoming JSON against the variant named by `(artifact_type,
/// schema_version)` before an envelope is accepted.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "payload_type", rename_all = "snake_case")]
pub enum ArtifactPayload {
    TranscriptSegment(TranscriptSegmentV1),
    Scene(SceneV1),
    ObjectDetection(ObjectDetectionV1),
    FaceDetection(FaceDetectionV1),
    OcrText(OcrTextV1),
    PlaceClassification(PlaceClassificationV1),
    VideoMetadata(VideoMetadataV1),
}

impl ArtifactPayload {
    pub fn type_name(&self) -> &'static str {
        match self {
            ArtifactPayload::TranscriptSegment(_) => "transcript.segment",
            ArtifactPayload::Scene(_) => "scene",
            ArtifactPayload::ObjectDetection(_) => "object.detection",
            ArtifactPayload::FaceDetection(_) => "face.detection",
            ArtifactPayload::OcrText(_) => "ocr.text",
            ArtifactPayload::PlaceClassification(_) => "place.classification",
            ArtifactPayload::VideoMetadata(_) => "video.metadata",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_detection_round_trips() {
        let payload = ArtifactPayload::ObjectDetection(ObjectDetectionV1 {
            label: "dog".into(),
            confidence: 0.9,
            bounding_box: NormalizedRect::new(0.1, 0.1, 0.2, 0.2),
            frame_number: 42,
        });
        let json = serde_json::to_string(&payload).unwrap();
        let back: ArtifactPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back.type_name(), "object.detection");
    }

    #[test]
    fn place_classification_defaults_top_k() {
        let json = r#"{"payload_type":"place_classification","predictions":[{"label":"beach","confidence":0.8}],"frame_number":1}"#;
        let payload: ArtifactPayload = serde_json::from_str(json).unwrap();
        match payload {
            ArtifactPayload::PlaceClassification(p) => assert_eq!(p.top_k, 5),
            _ => panic!("wrong variant"),
        }
    }
}
