//! Worker error taxonomy (`spec.md` §7).

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("validation failure: {0}")]
    ValidationFailure(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("fatal failure: {0}")]
    Fatal(String),

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error(transparent)]
    Orchestrator(#[from] pipeline_orchestrator::OrchestratorError),

    #[error(transparent)]
    Store(#[from] pipeline_store::StoreError),

    #[error(transparent)]
    Queue(#[from] pipeline_queue::QueueError),

    #[error(transparent)]
    Hash(#[from] pipeline_producer::HashError),

    #[error("producer request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl WorkerError {
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    /// Whether the failure is worth a limited automatic retry
    /// (`spec.md` §7: transient failures retry, fatal and validation
    /// failures do not).
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::ValidationFailure(_)
            | WorkerError::NotFound(_)
            | WorkerError::Conflict(_)
            | WorkerError::Fatal(_)
            | WorkerError::Hash(_) => false,
            WorkerError::Transient(_) | WorkerError::Timeout(_) | WorkerError::Http(_) | WorkerError::Queue(_) => true,
            WorkerError::Store(e) => !e.is_not_found(),
            WorkerError::Orchestrator(e) => match e {
                pipeline_orchestrator::OrchestratorError::Store(se) => !se.is_not_found(),
                pipeline_orchestrator::OrchestratorError::Queue(_) => true,
                pipeline_orchestrator::OrchestratorError::NoQueueForType(_) => false,
            },
        }
    }
}
