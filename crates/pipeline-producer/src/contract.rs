//! The external ML producer contract (`spec.md` §6).
//!
//! Producers (YOLO, Whisper, EasyOCR, Places365, ...) are opaque: "given a
//! video path and a config, return a list of typed detections with timing."
//! This module defines the wire shape of that request/response pair. Actual
//! invocation is a worker concern (`pipeline-worker`); this crate owns only
//! the contract types and the provenance hashing helpers both sides need.

use chrono::{DateTime, Utc};
use pipeline_models::{ModelProfile, RunId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Recognized producer config options. Unknown keys are passed through in
/// `extra` so producers can accept model-specific tuning without the
/// contract needing to change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProducerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_profile: Option<ModelProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub languages: Vec<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            frame_interval: None,
            confidence_threshold: None,
            model_name: None,
            model_profile: None,
            language: None,
            languages: Vec::new(),
            extra: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProducerRequest {
    pub video_path: String,
    pub config: ProducerConfig,
}

/// Bounding polygon point, shared by detection/OCR producers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bbox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub frame_index: u64,
    pub timestamp_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Bbox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polygon: Option<Vec<(f64, f64)>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub start_ms: i64,
    pub end_ms: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Scene {
    pub scene_index: u32,
    pub start_ms: i64,
    pub end_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub frame_index: u64,
    pub timestamp_ms: i64,
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub duration_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

/// The one-of-five result shapes a producer returns, tagged by kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProducerResult {
    Detections { detections: Vec<Detection> },
    Segments { segments: Vec<Segment> },
    Scenes { scenes: Vec<Scene> },
    Classifications { classifications: Vec<Classification> },
    Metadata { metadata: Metadata },
}

/// A producer's full response, carrying the provenance fields a worker
/// stamps onto every resulting `ArtifactEnvelope`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProducerResponse {
    pub run_id: RunId,
    pub config_hash: String,
    pub input_hash: String,
    pub producer: String,
    pub producer_version: String,
    pub model_profile: ModelProfile,
    pub result: ProducerResult,
}

/// Verifies a producer's reported `input_hash` matches what the worker
/// itself computed before dispatch, per `spec.md` §6: "mismatch fails the
/// job before inference."
pub fn verify_input_hash(expected: &str, reported: &str) -> bool {
    expected == reported
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn producer_config_serializes_without_unset_optionals() {
        let cfg = ProducerConfig::default();
        let json = serde_json::to_value(&cfg).unwrap();
        assert!(json.get("frame_interval").is_none());
    }

    #[test]
    fn input_hash_mismatch_is_detected() {
        assert!(!verify_input_hash("abc123", "def456"));
        assert!(verify_input_hash("abc123", "abc123"));
    }
}
