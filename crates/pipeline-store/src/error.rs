//! Store error types.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("video not found: {0}")]
    VideoNotFound(String),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("schema already registered for {artifact_type} v{schema_version}")]
    SchemaAlreadyRegistered {
        artifact_type: String,
        schema_version: u32,
    },

    #[error("no schema registered for {artifact_type} v{schema_version}")]
    SchemaNotFound {
        artifact_type: String,
        schema_version: u32,
    },

    #[error("payload validation failed for {artifact_type} v{schema_version}: {reason}")]
    PayloadValidation {
        artifact_type: String,
        schema_version: u32,
        reason: String,
    },

    #[error("invalid GPS coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::VideoNotFound(_) | StoreError::TaskNotFound(_) | StoreError::ArtifactNotFound(_)
        )
    }
}
