//! Postgres-backed `TaskRepository` with the atomic `SKIP LOCKED` claim
//! contract required by `spec.md` §4.2 ("Atomic claim contract").

use std::collections::BTreeSet;

use pipeline_models::{Task, TaskId, TaskPriority, TaskStatus, TaskType, VideoId};
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn save(&self, task: &Task) -> StoreResult<()> {
        let dependencies: Vec<uuid::Uuid> = task.dependencies.iter().map(|d| d.as_uuid()).collect();
        sqlx::query(
            r#"
            INSERT INTO tasks (
                task_id, video_id, task_type, status, priority, dependencies,
                language, created_at, started_at, completed_at, error
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (task_id) DO UPDATE SET
                status = EXCLUDED.status,
                priority = EXCLUDED.priority,
                dependencies = EXCLUDED.dependencies,
                started_at = EXCLUDED.started_at,
                completed_at = EXCLUDED.completed_at,
                error = EXCLUDED.error
            "#,
        )
        .bind(task.task_id.as_uuid())
        .bind(task.video_id.as_uuid())
        .bind(task.task_type.as_str())
        .bind(task.status.as_str())
        .bind(task.priority.as_i16())
        .bind(&dependencies)
        .bind(&task.language)
        .bind(task.created_at)
        .bind(task.started_at)
        .bind(task.completed_at)
        .bind(&task.error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_by_id(&self, task_id: TaskId) -> StoreResult<Option<Task>> {
        let row = sqlx::query("SELECT * FROM tasks WHERE task_id = $1")
            .bind(task_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_task).transpose()
    }

    pub async fn find_by_video_id(&self, video_id: VideoId) -> StoreResult<Vec<Task>> {
        let rows = sqlx::query(
            "SELECT * FROM tasks WHERE video_id = $1 ORDER BY priority ASC, created_at ASC",
        )
        .bind(video_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_task).collect()
    }

    /// Global, cross-video lookup by status (`pipeline-orchestrator`'s
    /// `retry_failed_tasks(None)` and the reconciler's sweep).
    pub async fn find_by_status(&self, status: TaskStatus) -> StoreResult<Vec<Task>> {
        let rows = sqlx::query(
            "SELECT * FROM tasks WHERE status = $1 ORDER BY priority ASC, created_at ASC",
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_task).collect()
    }

    /// Count of tasks of `task_type` in `status`, for
    /// `pipeline-orchestrator::get_queue_status`.
    pub async fn count_by_type_status(
        &self,
        task_type: TaskType,
        status: TaskStatus,
    ) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tasks WHERE task_type = $1 AND status = $2",
        )
        .bind(task_type.as_str())
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn find_by_video_and_status(
        &self,
        video_id: VideoId,
        status: TaskStatus,
    ) -> StoreResult<Vec<Task>> {
        let rows = sqlx::query(
            "SELECT * FROM tasks WHERE video_id = $1 AND status = $2 ORDER BY priority ASC, created_at ASC",
        )
        .bind(video_id.as_uuid())
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_task).collect()
    }

    pub async fn find_by_video_type_language(
        &self,
        video_id: VideoId,
        task_type: TaskType,
        language: Option<&str>,
    ) -> StoreResult<Option<Task>> {
        let row = sqlx::query(
            "SELECT * FROM tasks WHERE video_id = $1 AND task_type = $2 AND language IS NOT DISTINCT FROM $3",
        )
        .bind(video_id.as_uuid())
        .bind(task_type.as_str())
        .bind(language)
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_task).transpose()
    }

    pub async fn delete_by_video_id(&self, video_id: VideoId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE video_id = $1")
            .bind(video_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Atomically claims the next eligible pending task of `task_type`,
    /// flipping it to `running` within the same transaction. Eligibility
    /// requires every dependency task to already be `completed`
    /// (`spec.md` §4.1's readiness rule) — rather than re-check this in SQL,
    /// callers should pre-filter dependency-satisfied task ids and pass them
    /// in, since the dependency graph is resolved in `pipeline-orchestrator`.
    ///
    /// Ordered `priority ASC, created_at ASC` (DESIGN.md: "claim ordering
    /// direction" — priority 1 is highest).
    pub async fn claim_next_pending(&self, task_type: TaskType) -> StoreResult<Option<Task>> {
        let mut tx: Transaction<'_, Postgres> = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            SELECT * FROM tasks
            WHERE task_type = $1 AND status = 'pending'
            ORDER BY priority ASC, created_at ASC
            FOR UPDATE SKIP LOCKED
            LIMIT 1
            "#,
        )
        .bind(task_type.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.commit().await?;
            return Ok(None);
        };

        let mut task = row_to_task(row)?;
        task.start();

        sqlx::query("UPDATE tasks SET status = $1, started_at = $2 WHERE task_id = $3")
            .bind(task.status.as_str())
            .bind(task.started_at)
            .bind(task.task_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(task))
    }
}

fn row_to_task(row: sqlx::postgres::PgRow) -> StoreResult<Task> {
    let task_type_str: String = row.try_get("task_type")?;
    let task_type = TaskType::from_str_opt(&task_type_str).ok_or_else(|| {
        StoreError::Database(sqlx::Error::Decode(
            format!("unknown task type: {task_type_str}").into(),
        ))
    })?;

    let status_str: String = row.try_get("status")?;
    let status = TaskStatus::from_str_opt(&status_str).ok_or_else(|| {
        StoreError::Database(sqlx::Error::Decode(
            format!("unknown task status: {status_str}").into(),
        ))
    })?;

    let priority_raw: i16 = row.try_get("priority")?;
    let priority = TaskPriority::from_i16(priority_raw).ok_or_else(|| {
        StoreError::Database(sqlx::Error::Decode(
            format!("unknown task priority: {priority_raw}").into(),
        ))
    })?;

    let dependency_uuids: Vec<uuid::Uuid> = row.try_get("dependencies")?;
    let dependencies: BTreeSet<TaskId> = dependency_uuids.into_iter().map(TaskId::from_uuid).collect();

    let task_id: uuid::Uuid = row.try_get("task_id")?;
    let video_id: uuid::Uuid = row.try_get("video_id")?;

    Ok(Task {
        task_id: TaskId::from_uuid(task_id),
        video_id: VideoId::from_uuid(video_id),
        task_type,
        status,
        priority,
        dependencies,
        language: row.try_get("language")?,
        created_at: row.try_get("created_at")?,
        started_at: row.try_get("started_at")?,
        completed_at: row.try_get("completed_at")?,
        error: row.try_get("error")?,
    })
}
