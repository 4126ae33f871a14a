//! Postgres-backed persistence for the video analysis pipeline.
//!
//! ## Modules
//! - `artifact_store` — validate, persist, and project `ArtifactEnvelope`s
//! - `schema_registry` — `(artifact_type, schema_version)` payload validation
//! - `projection` — per-artifact-type projection sync, run inside the same
//!   transaction as the envelope insert
//! - `video_repo` / `task_repo` / `run_repo` — entity repositories
//! - `error` — `StoreError`

pub mod artifact_store;
pub mod error;
pub mod projection;
pub mod run_repo;
pub mod schema_registry;
pub mod task_repo;
pub mod video_repo;

pub use artifact_store::{ArtifactStore, AssetQuery};
pub use error::{StoreError, StoreResult};
pub use run_repo::RunRepository;
pub use schema_registry::SchemaRegistry;
pub use task_repo::TaskRepository;
pub use video_repo::VideoRepository;

pub use sqlx::PgPool;

/// Runs every embedded migration against `pool`. Mirrors the teacher's
/// practice of a single startup-time migration step (see
/// `pipeline-worker`'s `main.rs`).
pub async fn run_migrations(pool: &PgPool) -> StoreResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Builds a connection pool from a `DATABASE_URL`-style connection string.
pub async fn connect(database_url: &str) -> StoreResult<PgPool> {
    Ok(PgPool::connect(database_url).await?)
}
