// ABOUTME: Task domain error taxonomy
// ABOUTME: Typed guard failures returned to callers, never panics or retries

use cadence_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("task not found")]
    NotFound,
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("task was modified concurrently, re-fetch and retry")]
    Conflict,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type TaskResult<T> = Result<T, TaskError>;
