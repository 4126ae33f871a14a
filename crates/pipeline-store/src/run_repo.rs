//! Postgres-backed repository for `Run` (`spec.md` §3: "groups the envelopes
//! produced by a single pipeline invocation").

use pipeline_models::{Run, RunId, RunStatus, VideoId};
use sqlx::{PgPool, Row};

use crate::error::StoreResult;

#[derive(Debug, Clone)]
pub struct RunRepository {
    pool: PgPool,
}

impl RunRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn save(&self, run: &Run) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO runs (run_id, asset_id, pipeline_profile, started_at, finished_at, status, error)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (run_id) DO UPDATE SET
                finished_at = EXCLUDED.finished_at,
                status = EXCLUDED.status,
                error = EXCLUDED.error
            "#,
        )
        .bind(run.run_id.as_uuid())
        .bind(run.asset_id.as_uuid())
        .bind(&run.pipeline_profile)
        .bind(run.started_at)
        .bind(run.finished_at)
        .bind(run.status.as_str())
        .bind(&run.error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_by_id(&self, run_id: RunId) -> StoreResult<Option<Run>> {
        let row = sqlx::query("SELECT * FROM runs WHERE run_id = $1")
            .bind(run_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_run).transpose()
    }

    pub async fn find_by_asset(&self, asset_id: VideoId) -> StoreResult<Vec<Run>> {
        let rows = sqlx::query("SELECT * FROM runs WHERE asset_id = $1 ORDER BY started_at DESC")
            .bind(asset_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(row_to_run).collect()
    }
}

fn row_to_run(row: sqlx::postgres::PgRow) -> StoreResult<Run> {
    let status_str: String = row.try_get("status")?;
    let status = RunStatus::from_str_opt(&status_str).unwrap_or(RunStatus::Running);
    let run_id: uuid::Uuid = row.try_get("run_id")?;
    let asset_id: uuid::Uuid = row.try_get("asset_id")?;

    Ok(Run {
        run_id: RunId::from_uuid(run_id),
        asset_id: VideoId::from_uuid(asset_id),
        pipeline_profile: row.try_get("pipeline_profile")?,
        started_at: row.try_get("started_at")?,
        finished_at: row.try_get("finished_at")?,
        status,
        error: row.try_get("error")?,
    })
}
