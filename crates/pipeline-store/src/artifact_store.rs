//! `ArtifactStore`: validate, persist, and project envelopes
//! (`original_source/.../artifact_repository.py`, `spec.md` §4.3).

use chrono::{DateTime, Utc};
use pipeline_models::{
    ArtifactEnvelope, ArtifactId, ArtifactType, ModelProfile, Provenance, RunId,
    SelectionPolicy, VideoId,
};
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Transaction};

use crate::error::{StoreError, StoreResult};
use crate::projection::sync_artifact;
use crate::schema_registry::SchemaRegistry;

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    pool: PgPool,
    schema_registry: SchemaRegistry,
}

/// Optional narrowing filters for `get_by_asset`, beyond the selection
/// policy (`spec.md` §4.3 contract).
#[derive(Debug, Clone, Default)]
pub struct AssetQuery {
    pub artifact_type: Option<ArtifactType>,
    pub start_ms: Option<i64>,
    pub end_ms: Option<i64>,
    pub selection: Option<SelectionPolicy>,
    pub run_id: Option<RunId>,
}

impl ArtifactStore {
    pub fn new(pool: PgPool, schema_registry: SchemaRegistry) -> Self {
        Self { pool, schema_registry }
    }

    /// Validates, persists, and projects one envelope. Validation failure
    /// aborts before any write (spec.md §4.3: "no partial writes"); a
    /// projection failure rolls back the insert.
    pub async fn create(&self, envelope: ArtifactEnvelope) -> StoreResult<ArtifactEnvelope> {
        self.validate(&envelope)?;

        let mut tx = self.pool.begin().await?;
        insert_envelope(&mut tx, &envelope).await?;
        sync_artifact(&mut tx, &envelope).await?;
        tx.commit().await?;

        Ok(envelope)
    }

    /// Validates every envelope first (fail-fast), then inserts and
    /// projects all of them in one transaction; rolls back entirely on any
    /// failure (spec.md §4.3).
    pub async fn batch_create(&self, envelopes: Vec<ArtifactEnvelope>) -> StoreResult<Vec<ArtifactEnvelope>> {
        if envelopes.is_empty() {
            return Ok(envelopes);
        }

        for envelope in &envelopes {
            self.validate(envelope)?;
        }

        let mut tx = self.pool.begin().await?;
        for envelope in &envelopes {
            insert_envelope(&mut tx, envelope).await?;
            sync_artifact(&mut tx, envelope).await?;
        }
        tx.commit().await?;

        Ok(envelopes)
    }

    pub async fn get_by_id(&self, artifact_id: ArtifactId) -> StoreResult<Option<ArtifactEnvelope>> {
        let row = sqlx::query("SELECT * FROM artifacts WHERE artifact_id = $1")
            .bind(artifact_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_envelope).transpose()
    }

    pub async fn get_by_asset(&self, asset_id: VideoId, query: &AssetQuery) -> StoreResult<Vec<ArtifactEnvelope>> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM artifacts WHERE asset_id = ");
        builder.push_bind(asset_id.as_uuid());

        if let Some(artifact_type) = query.artifact_type {
            builder.push(" AND artifact_type = ").push_bind(artifact_type.as_str());
        }
        if let Some(start_ms) = query.start_ms {
            builder.push(" AND span_start_ms >= ").push_bind(start_ms);
        }
        if let Some(end_ms) = query.end_ms {
            builder.push(" AND span_end_ms <= ").push_bind(end_ms);
        }
        if let Some(run_id) = query.run_id {
            builder.push(" AND run_id = ").push_bind(run_id.as_uuid());
        }

        push_selection_filter(&mut builder, asset_id, query.artifact_type, query.selection.as_ref());
        builder.push(order_by_clause(query.selection.as_ref()));

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.into_iter().map(row_to_envelope).collect()
    }

    pub async fn get_by_span(
        &self,
        asset_id: VideoId,
        artifact_type: ArtifactType,
        span_start_ms: i64,
        span_end_ms: i64,
        selection: Option<&SelectionPolicy>,
    ) -> StoreResult<Vec<ArtifactEnvelope>> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT * FROM artifacts WHERE asset_id = ",
        );
        builder.push_bind(asset_id.as_uuid());
        builder.push(" AND artifact_type = ").push_bind(artifact_type.as_str());
        builder.push(" AND span_start_ms < ").push_bind(span_end_ms);
        builder.push(" AND span_end_ms > ").push_bind(span_start_ms);

        push_selection_filter(&mut builder, asset_id, Some(artifact_type), selection);
        builder.push(order_by_clause(selection));

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.into_iter().map(row_to_envelope).collect()
    }

    /// Removes the envelope and cascades to its projections via FK
    /// `ON DELETE CASCADE` (spec.md §4.3).
    pub async fn delete(&self, artifact_id: ArtifactId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM artifacts WHERE artifact_id = $1")
            .bind(artifact_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    fn validate(&self, envelope: &ArtifactEnvelope) -> StoreResult<()> {
        if !envelope.span_is_valid() {
            return Err(StoreError::PayloadValidation {
                artifact_type: envelope.artifact_type.as_str().to_string(),
                schema_version: envelope.schema_version,
                reason: "span_start_ms must be <= span_end_ms and both non-negative".to_string(),
            });
        }
        let payload_json = serde_json::to_value(&envelope.payload)
            .map_err(|e| StoreError::PayloadValidation {
                artifact_type: envelope.artifact_type.as_str().to_string(),
                schema_version: envelope.schema_version,
                reason: e.to_string(),
            })?;
        self.schema_registry
            .validate(envelope.artifact_type, envelope.schema_version, &payload_json)?;
        Ok(())
    }
}

/// Narrows a query by `spec.md` §4.3's selection policy semantics:
/// `default` applies no restriction. `best_quality` affects ordering only
/// (see `order_by_clause`), so it adds no filter here.
fn push_selection_filter(
    builder: &mut QueryBuilder<'_, Postgres>,
    asset_id: VideoId,
    artifact_type: Option<ArtifactType>,
    selection: Option<&SelectionPolicy>,
) {
    match selection {
        None | Some(SelectionPolicy::Default) | Some(SelectionPolicy::BestQuality) => {}
        Some(SelectionPolicy::Pinned { pinned_run_id }) => {
            builder.push(" AND run_id = ").push_bind(pinned_run_id.as_uuid());
        }
        Some(SelectionPolicy::Profile { preferred_profile }) => {
            builder
                .push(" AND model_profile = ")
                .push_bind(preferred_profile.as_str());
        }
        Some(SelectionPolicy::Latest) => {
            builder.push(" AND run_id = (SELECT run_id FROM artifacts WHERE asset_id = ");
            builder.push_bind(asset_id.as_uuid());
            if let Some(artifact_type) = artifact_type {
                builder.push(" AND artifact_type = ").push_bind(artifact_type.as_str());
            }
            builder.push(" ORDER BY created_at DESC LIMIT 1)");
        }
    }
}

/// The ordering clause for a query, given its selection policy. `best_quality`
/// orders by profile quality rank then `created_at DESC` within rank
/// (DESIGN.md Open Question 1); every other policy orders by span start.
fn order_by_clause(selection: Option<&SelectionPolicy>) -> &'static str {
    match selection {
        Some(SelectionPolicy::BestQuality) => {
            " ORDER BY CASE model_profile \
                WHEN 'high_quality' THEN 2 \
                WHEN 'balanced' THEN 1 \
                ELSE 0 END DESC, created_at DESC"
        }
        _ => " ORDER BY span_start_ms ASC",
    }
}

async fn insert_envelope(tx: &mut Transaction<'_, Postgres>, envelope: &ArtifactEnvelope) -> StoreResult<()> {
    let payload_json = serde_json::to_value(&envelope.payload)?;
    sqlx::query(
        r#"
        INSERT INTO artifacts (
            artifact_id, asset_id, artifact_type, schema_version, span_start_ms,
            span_end_ms, payload, producer, producer_version, model_profile,
            config_hash, input_hash, run_id, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(envelope.artifact_id.as_uuid())
    .bind(envelope.asset_id.as_uuid())
    .bind(envelope.artifact_type.as_str())
    .bind(envelope.schema_version as i32)
    .bind(envelope.span_start_ms)
    .bind(envelope.span_end_ms)
    .bind(payload_json)
    .bind(&envelope.provenance.producer)
    .bind(&envelope.provenance.producer_version)
    .bind(envelope.provenance.model_profile.as_str())
    .bind(&envelope.provenance.config_hash)
    .bind(&envelope.provenance.input_hash)
    .bind(envelope.provenance.run_id.as_uuid())
    .bind(envelope.provenance.created_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

fn row_to_envelope(row: sqlx::postgres::PgRow) -> StoreResult<ArtifactEnvelope> {
    let artifact_type_str: String = row.try_get("artifact_type")?;
    let artifact_type = ArtifactType::from_str_opt(&artifact_type_str).ok_or_else(|| {
        StoreError::Database(sqlx::Error::Decode(
            format!("unknown artifact type: {artifact_type_str}").into(),
        ))
    })?;

    let payload_json: serde_json::Value = row.try_get("payload")?;
    let payload = serde_json::from_value(payload_json).map_err(|e| StoreError::PayloadValidation {
        artifact_type: artifact_type.as_str().to_string(),
        schema_version: 0,
        reason: e.to_string(),
    })?;

    let model_profile_str: String = row.try_get("model_profile")?;
    let model_profile = parse_model_profile(&model_profile_str)?;

    let artifact_id: uuid::Uuid = row.try_get("artifact_id")?;
    let asset_id: uuid::Uuid = row.try_get("asset_id")?;
    let run_id: uuid::Uuid = row.try_get("run_id")?;

    Ok(ArtifactEnvelope {
        artifact_id: ArtifactId::from_uuid(artifact_id),
        asset_id: VideoId::from_uuid(asset_id),
        artifact_type,
        schema_version: row.try_get::<i32, _>("schema_version")? as u32,
        span_start_ms: row.try_get("span_start_ms")?,
        span_end_ms: row.try_get("span_end_ms")?,
        payload,
        provenance: Provenance {
            producer: row.try_get("producer")?,
            producer_version: row.try_get("producer_version")?,
            model_profile,
            config_hash: row.try_get("config_hash")?,
            input_hash: row.try_get("input_hash")?,
            run_id: RunId::from_uuid(run_id),
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        },
    })
}

fn parse_model_profile(s: &str) -> StoreResult<ModelProfile> {
    Ok(match s {
        "fast" => ModelProfile::Fast,
        "balanced" => ModelProfile::Balanced,
        "high_quality" => ModelProfile::HighQuality,
        other => {
            return Err(StoreError::Database(sqlx::Error::Decode(
                format!("unknown model profile: {other}").into(),
            )))
        }
    })
}
