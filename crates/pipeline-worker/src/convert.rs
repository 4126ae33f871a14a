//! Maps a producer's `ProducerResult` into the `ArtifactEnvelope`s a task
//! type persists (`spec.md` §4.3, §6). Four task types
//! (`topic_extraction`, `embedding_generation`, `thumbnail_generation`,
//! `thumbnail_extraction`) have no artifact shape in this system's scope —
//! their producer output carries no modeled payload, so `to_envelopes`
//! returns an empty vec and the worker treats their execution as a
//! pass-through whose only effect is advancing task state.

use chrono::Utc;
use pipeline_models::{
    ArtifactEnvelope, ArtifactId, ArtifactPayload, ArtifactType, FaceDetectionV1, NormalizedRect,
    ObjectDetectionV1, OcrTextV1, PlaceClassificationV1, PlacePrediction, PolygonPoint, Provenance,
    SceneV1, TaskType, TranscriptSegmentV1, VideoId, VideoMetadataV1,
};
use pipeline_producer::{Bbox, ProducerResponse, ProducerResult};

pub fn to_envelopes(asset_id: VideoId, task_type: TaskType, response: &ProducerResponse) -> Vec<ArtifactEnvelope> {
    let provenance = Provenance {
        producer: response.producer.clone(),
        producer_version: response.producer_version.clone(),
        model_profile: response.model_profile,
        config_hash: response.config_hash.clone(),
        input_hash: response.input_hash.clone(),
        run_id: response.run_id,
        created_at: Utc::now(),
    };

    match (task_type, &response.result) {
        (TaskType::Transcription, ProducerResult::Segments { segments }) => segments
            .iter()
            .map(|s| ArtifactEnvelope {
                artifact_id: ArtifactId::new(),
                asset_id,
                artifact_type: ArtifactType::TranscriptSegment,
                schema_version: 1,
                span_start_ms: s.start_ms,
                span_end_ms: s.end_ms,
                payload: ArtifactPayload::TranscriptSegment(TranscriptSegmentV1 {
                    text: s.text.clone(),
                    start_ms: s.start_ms,
                    end_ms: s.end_ms,
                    confidence: s.confidence,
                    words: None,
                }),
                provenance: provenance.clone(),
            })
            .collect(),

        (TaskType::SceneDetection, ProducerResult::Scenes { scenes }) => scenes
            .iter()
            .map(|sc| ArtifactEnvelope {
                artifact_id: ArtifactId::new(),
                asset_id,
                artifact_type: ArtifactType::Scene,
                schema_version: 1,
                span_start_ms: sc.start_ms,
                span_end_ms: sc.end_ms,
                payload: ArtifactPayload::Scene(SceneV1 {
                    scene_index: sc.scene_index,
                    start_ms: sc.start_ms,
                    end_ms: sc.end_ms,
                    duration_ms: sc.end_ms - sc.start_ms,
                }),
                provenance: provenance.clone(),
            })
            .collect(),

        (TaskType::ObjectDetection, ProducerResult::Detections { detections }) => detections
            .iter()
            .filter_map(|d| {
                let bbox = d.bbox?;
                Some(ArtifactEnvelope {
                    artifact_id: ArtifactId::new(),
                    asset_id,
                    artifact_type: ArtifactType::ObjectDetection,
                    schema_version: 1,
                    span_start_ms: d.timestamp_ms,
                    span_end_ms: d.timestamp_ms,
                    payload: ArtifactPayload::ObjectDetection(ObjectDetectionV1 {
                        label: d.label.clone().unwrap_or_default(),
                        confidence: d.confidence,
                        bounding_box: to_rect(bbox),
                        frame_number: d.frame_index,
                    }),
                    provenance: provenance.clone(),
                })
            })
            .collect(),

        (TaskType::FaceDetection, ProducerResult::Detections { detections }) => detections
            .iter()
            .filter_map(|d| {
                let bbox = d.bbox?;
                Some(ArtifactEnvelope {
                    artifact_id: ArtifactId::new(),
                    asset_id,
                    artifact_type: ArtifactType::FaceDetection,
                    schema_version: 1,
                    span_start_ms: d.timestamp_ms,
                    span_end_ms: d.timestamp_ms,
                    payload: ArtifactPayload::FaceDetection(FaceDetectionV1 {
                        confidence: d.confidence,
                        bounding_box: to_rect(bbox),
                        frame_number: d.frame_index,
                        cluster_id: d.cluster_id.clone(),
                    }),
                    provenance: provenance.clone(),
                })
            })
            .collect(),

        (TaskType::Ocr, ProducerResult::Detections { detections }) => detections
            .iter()
            .map(|d| ArtifactEnvelope {
                artifact_id: ArtifactId::new(),
                asset_id,
                artifact_type: ArtifactType::OcrText,
                schema_version: 1,
                span_start_ms: d.timestamp_ms,
                span_end_ms: d.timestamp_ms,
                payload: ArtifactPayload::OcrText(OcrTextV1 {
                    text: d.label.clone().unwrap_or_default(),
                    confidence: d.confidence,
                    polygon: d
                        .polygon
                        .as_ref()
                        .map(|points| points.iter().map(|(x, y)| PolygonPoint { x: *x, y: *y }).collect())
                        .unwrap_or_default(),
                    languages: Vec::new(),
                    frame_index: d.frame_index,
                }),
                provenance: provenance.clone(),
            })
            .collect(),

        (TaskType::PlaceDetection, ProducerResult::Classifications { classifications }) => classifications
            .iter()
            .map(|c| ArtifactEnvelope {
                artifact_id: ArtifactId::new(),
                asset_id,
                artifact_type: ArtifactType::PlaceClassification,
                schema_version: 1,
                span_start_ms: c.timestamp_ms,
                span_end_ms: c.timestamp_ms,
                payload: ArtifactPayload::PlaceClassification(PlaceClassificationV1 {
                    top_k: c.predictions.len() as u32,
                    predictions: c
                        .predictions
                        .iter()
                        .map(|p| PlacePrediction { label: p.label.clone(), confidence: p.confidence })
                        .collect(),
                    frame_number: c.frame_index,
                }),
                provenance: provenance.clone(),
            })
            .collect(),

        (TaskType::MetadataExtraction, ProducerResult::Metadata { metadata }) => {
            vec![ArtifactEnvelope {
                artifact_id: ArtifactId::new(),
                asset_id,
                artifact_type: ArtifactType::VideoMetadata,
                schema_version: 1,
                span_start_ms: 0,
                span_end_ms: (metadata.duration_seconds * 1000.0) as i64,
                payload: ArtifactPayload::VideoMetadata(VideoMetadataV1 {
                    duration_seconds: metadata.duration_seconds,
                    create_date: metadata.create_date,
                    latitude: metadata.latitude,
                    longitude: metadata.longitude,
                    altitude: metadata.altitude,
                }),
                provenance,
            }]
        }

        // Thumbnail generation/extraction and topic/embedding outputs have
        // no modeled artifact payload.
        (TaskType::TopicExtraction, _)
        | (TaskType::EmbeddingGeneration, _)
        | (TaskType::ThumbnailGeneration, _)
        | (TaskType::ThumbnailExtraction, _) => Vec::new(),

        // Producer returned a result shape that doesn't match its task
        // type's expected kind.
        _ => Vec::new(),
    }
}

fn to_rect(bbox: Bbox) -> NormalizedRect {
    NormalizedRect::new(bbox.x, bbox.y, bbox.width, bbox.height)
}
