//! Postgres-backed `VideoRepository` (`original_source/.../video_repository.py`).

use chrono::{DateTime, Utc};
use pipeline_models::{Video, VideoId, VideoStatus};
use sqlx::{PgPool, Row};

use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone)]
pub struct VideoRepository {
    pool: PgPool,
}

impl VideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upsert-by-id, mirroring the source's save()'s find-then-update-or-insert.
    pub async fn save(&self, video: &Video) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO videos (
                video_id, file_path, filename, file_size, file_hash,
                duration_seconds, last_modified, file_created_at, status,
                processed_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (video_id) DO UPDATE SET
                file_path = EXCLUDED.file_path,
                filename = EXCLUDED.filename,
                file_size = EXCLUDED.file_size,
                file_hash = EXCLUDED.file_hash,
                duration_seconds = EXCLUDED.duration_seconds,
                last_modified = EXCLUDED.last_modified,
                file_created_at = EXCLUDED.file_created_at,
                status = EXCLUDED.status,
                processed_at = EXCLUDED.processed_at,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(video.video_id.as_uuid())
        .bind(&video.file_path)
        .bind(&video.filename)
        .bind(video.file_size)
        .bind(&video.file_hash)
        .bind(video.duration_seconds)
        .bind(video.last_modified)
        .bind(video.file_created_at)
        .bind(video.status.as_str())
        .bind(video.processed_at)
        .bind(video.created_at)
        .bind(video.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_by_id(&self, video_id: VideoId) -> StoreResult<Option<Video>> {
        let row = sqlx::query("SELECT * FROM videos WHERE video_id = $1")
            .bind(video_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_video).transpose()
    }

    pub async fn get(&self, video_id: VideoId) -> StoreResult<Video> {
        self.find_by_id(video_id)
            .await?
            .ok_or_else(|| StoreError::VideoNotFound(video_id.to_string()))
    }

    pub async fn find_by_path(&self, file_path: &str) -> StoreResult<Option<Video>> {
        let row = sqlx::query("SELECT * FROM videos WHERE file_path = $1")
            .bind(file_path)
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_video).transpose()
    }

    pub async fn find_by_status(&self, status: VideoStatus) -> StoreResult<Vec<Video>> {
        let rows = sqlx::query("SELECT * FROM videos WHERE status = $1")
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(row_to_video).collect()
    }

    pub async fn delete(&self, video_id: VideoId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM videos WHERE video_id = $1")
            .bind(video_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_video(row: sqlx::postgres::PgRow) -> StoreResult<Video> {
    let status_str: String = row.try_get("status")?;
    let status = parse_status(&status_str)?;
    let video_id: uuid::Uuid = row.try_get("video_id")?;

    Ok(Video {
        video_id: VideoId::from_uuid(video_id),
        file_path: row.try_get("file_path")?,
        filename: row.try_get("filename")?,
        file_size: row.try_get("file_size")?,
        file_hash: row.try_get("file_hash")?,
        duration_seconds: row.try_get("duration_seconds")?,
        last_modified: row.try_get::<DateTime<Utc>, _>("last_modified")?,
        file_created_at: row.try_get("file_created_at")?,
        status,
        processed_at: row.try_get("processed_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn parse_status(s: &str) -> StoreResult<VideoStatus> {
    Ok(match s {
        "discovered" => VideoStatus::Discovered,
        "hashed" => VideoStatus::Hashed,
        "processing" => VideoStatus::Processing,
        "completed" => VideoStatus::Completed,
        "failed" => VideoStatus::Failed,
        "missing" => VideoStatus::Missing,
        other => {
            return Err(StoreError::Database(sqlx::Error::Decode(
                format!("unknown video status: {other}").into(),
            )))
        }
    })
}
