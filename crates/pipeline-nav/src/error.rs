//! Navigation engine errors, grounded on
//! `original_source/backend/src/domain/exceptions.py`'s
//! `VideoNotFoundError`/`InvalidParameterError`.

use thiserror::Error;

pub type NavResult<T> = Result<T, NavError>;

#[derive(Debug, Error)]
pub enum NavError {
    #[error("video not found: {0}")]
    VideoNotFound(uuid::Uuid),

    #[error("invalid parameter '{parameter}': {message}")]
    InvalidParameter { parameter: &'static str, message: String },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl NavError {
    pub fn invalid(parameter: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter { parameter, message: message.into() }
    }
}
