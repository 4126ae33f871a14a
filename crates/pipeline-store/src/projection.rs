//! Projection sync (`original_source/.../projection_sync_service.py`,
//! `spec.md` §4.3).
//!
//! Unlike the source, every sync here runs inside the caller's transaction:
//! `spec.md` §4.3 requires the whole insert to roll back if projection sync
//! fails (DESIGN.md: "Projection sync transactionality").

use pipeline_models::{ArtifactEnvelope, ArtifactPayload};
use sqlx::{Postgres, Transaction};

use crate::error::{StoreError, StoreResult};

/// Synchronizes one envelope's payload into its projection table(s), inside
/// `tx`. A no-op for artifact types with no projection (none currently;
/// kept as a match arm per type so a future type defaults to a compile
/// error instead of silently skipping sync).
pub async fn sync_artifact(tx: &mut Transaction<'_, Postgres>, envelope: &ArtifactEnvelope) -> StoreResult<()> {
    match &envelope.payload {
        ArtifactPayload::TranscriptSegment(p) => {
            sqlx::query(
                r#"
                INSERT INTO transcript_fts (artifact_id, asset_id, start_ms, end_ms, text_content)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (artifact_id) DO UPDATE SET
                    asset_id = EXCLUDED.asset_id,
                    start_ms = EXCLUDED.start_ms,
                    end_ms = EXCLUDED.end_ms,
                    text_content = EXCLUDED.text_content
                "#,
            )
            .bind(envelope.artifact_id.as_uuid())
            .bind(envelope.asset_id.as_uuid())
            .bind(envelope.span_start_ms)
            .bind(envelope.span_end_ms)
            .bind(&p.text)
            .execute(&mut **tx)
            .await?;
        }
        ArtifactPayload::Scene(p) => {
            sqlx::query(
                r#"
                INSERT INTO scene_ranges (artifact_id, asset_id, scene_index, start_ms, end_ms)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (artifact_id) DO UPDATE SET
                    asset_id = EXCLUDED.asset_id,
                    scene_index = EXCLUDED.scene_index,
                    start_ms = EXCLUDED.start_ms,
                    end_ms = EXCLUDED.end_ms
                "#,
            )
            .bind(envelope.artifact_id.as_uuid())
            .bind(envelope.asset_id.as_uuid())
            .bind(p.scene_index as i32)
            .bind(envelope.span_start_ms)
            .bind(envelope.span_end_ms)
            .execute(&mut **tx)
            .await?;
        }
        ArtifactPayload::ObjectDetection(p) => {
            insert_label(tx, envelope, "object", &p.label, p.confidence).await?;
        }
        ArtifactPayload::PlaceClassification(p) => {
            // Shared `object_labels` table with `object.detection`, distinguished
            // by `kind` at query time (spec.md §4.3). Projects the top prediction.
            if let Some(top) = p.predictions.first() {
                insert_label(tx, envelope, "place", &top.label, top.confidence).await?;
            }
        }
        ArtifactPayload::FaceDetection(p) => {
            sqlx::query(
                r#"
                INSERT INTO face_clusters (artifact_id, asset_id, cluster_id, confidence, start_ms, end_ms)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (artifact_id) DO UPDATE SET
                    asset_id = EXCLUDED.asset_id,
                    cluster_id = EXCLUDED.cluster_id,
                    confidence = EXCLUDED.confidence,
                    start_ms = EXCLUDED.start_ms,
                    end_ms = EXCLUDED.end_ms
                "#,
            )
            .bind(envelope.artifact_id.as_uuid())
            .bind(envelope.asset_id.as_uuid())
            .bind(&p.cluster_id)
            .bind(p.confidence)
            .bind(envelope.span_start_ms)
            .bind(envelope.span_end_ms)
            .execute(&mut **tx)
            .await?;
        }
        ArtifactPayload::OcrText(p) => {
            sqlx::query(
                r#"
                INSERT INTO ocr_fts (artifact_id, asset_id, start_ms, end_ms, text_content)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (artifact_id) DO UPDATE SET
                    asset_id = EXCLUDED.asset_id,
                    start_ms = EXCLUDED.start_ms,
                    end_ms = EXCLUDED.end_ms,
                    text_content = EXCLUDED.text_content
                "#,
            )
            .bind(envelope.artifact_id.as_uuid())
            .bind(envelope.asset_id.as_uuid())
            .bind(envelope.span_start_ms)
            .bind(envelope.span_end_ms)
            .bind(&p.text)
            .execute(&mut **tx)
            .await?;
        }
        ArtifactPayload::VideoMetadata(p) => {
            sync_video_metadata(tx, envelope, p).await?;
        }
    }
    Ok(())
}

async fn insert_label(
    tx: &mut Transaction<'_, Postgres>,
    envelope: &ArtifactEnvelope,
    kind: &str,
    label: &str,
    confidence: f64,
) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO object_labels (artifact_id, asset_id, kind, label, confidence, start_ms, end_ms)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (artifact_id) DO UPDATE SET
            asset_id = EXCLUDED.asset_id,
            kind = EXCLUDED.kind,
            label = EXCLUDED.label,
            confidence = EXCLUDED.confidence,
            start_ms = EXCLUDED.start_ms,
            end_ms = EXCLUDED.end_ms
        "#,
    )
    .bind(envelope.artifact_id.as_uuid())
    .bind(envelope.asset_id.as_uuid())
    .bind(kind)
    .bind(label)
    .bind(confidence)
    .bind(envelope.span_start_ms)
    .bind(envelope.span_end_ms)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// `video.metadata` projects into `video_locations` only when GPS
/// coordinates are present and valid (spec.md §4.3). Reverse geocoding
/// (country/state/city) is a Non-goal (spec.md §1); those columns are left
/// NULL rather than calling out to a geocoding service.
async fn sync_video_metadata(
    tx: &mut Transaction<'_, Postgres>,
    envelope: &ArtifactEnvelope,
    payload: &pipeline_models::VideoMetadataV1,
) -> StoreResult<()> {
    let (Some(lat), Some(lon)) = (payload.latitude, payload.longitude) else {
        return Ok(());
    };

    if !(-90.0..=90.0).contains(&lat) {
        return Err(StoreError::InvalidCoordinates(format!(
            "latitude {lat} out of range [-90, 90]"
        )));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(StoreError::InvalidCoordinates(format!(
            "longitude {lon} out of range [-180, 180]"
        )));
    }

    sqlx::query(
        r#"
        INSERT INTO video_locations (video_id, artifact_id, latitude, longitude, altitude)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (video_id) DO UPDATE SET
            artifact_id = EXCLUDED.artifact_id,
            latitude = EXCLUDED.latitude,
            longitude = EXCLUDED.longitude,
            altitude = EXCLUDED.altitude
        "#,
    )
    .bind(envelope.asset_id.as_uuid())
    .bind(envelope.artifact_id.as_uuid())
    .bind(lat)
    .bind(lon)
    .bind(payload.altitude)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
