//! Orchestrator error types.

use thiserror::Error;

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Store(#[from] pipeline_store::StoreError),

    #[error(transparent)]
    Queue(#[from] pipeline_queue::QueueError),

    #[error("no job queue configured for task type {0}")]
    NoQueueForType(String),
}
