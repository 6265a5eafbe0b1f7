// ABOUTME: Sprint domain error taxonomy
// ABOUTME: Mirrors the task taxonomy so API mapping stays uniform

use cadence_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SprintError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("sprint not found")]
    NotFound,
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("sprint was modified concurrently, re-fetch and retry")]
    Conflict,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type SprintResult<T> = Result<T, SprintError>;
