use thiserror::Error;

use crate::application::repos::StoreError;
use crate::domain::error::DomainError;

/// Coordinator-level outcome of a task operation. Business-rule failures
/// carry through verbatim from the store; infrastructure failures mean the
/// durable backend could not serve the request. Cache failures never appear
/// here; the coordinator recovers them locally.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task already exists")]
    AlreadyExists,
    #[error("task not found")]
    NotFound,
    #[error("invalid task: {0}")]
    Validation(String),
    #[error("store failure: {message}")]
    Store { message: String },
}

impl From<DomainError> for TaskError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation { message } => Self::Validation(message),
        }
    }
}

impl From<StoreError> for TaskError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists => Self::AlreadyExists,
            StoreError::NotFound => Self::NotFound,
            StoreError::Unavailable { message } => Self::Store { message },
        }
    }
}
