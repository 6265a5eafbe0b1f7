// ABOUTME: Shared API response types and error handling
// ABOUTME: Provides consistent response format across all API endpoints

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson},
};
use serde::Serialize;

use cadence_sprints::SprintError;
use cadence_tasks::TaskError;

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

fn error_response(status: StatusCode, message: String) -> axum::response::Response {
    (status, ResponseJson(ApiResponse::<()>::error(message))).into_response()
}

/// Maps a domain error onto an HTTP status and JSON error envelope.
pub trait ErrorResponse {
    fn into_response(self) -> axum::response::Response;
}

/// Convert task domain errors to HTTP responses
impl ErrorResponse for TaskError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            TaskError::Unauthorized(_) => (StatusCode::FORBIDDEN, self.to_string()),
            TaskError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            TaskError::InvalidState(_) => (StatusCode::CONFLICT, self.to_string()),
            TaskError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            TaskError::Conflict => (StatusCode::CONFLICT, self.to_string()),
            TaskError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),
        };
        error_response(status, message)
    }
}

/// Convert sprint domain errors to HTTP responses
impl ErrorResponse for SprintError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            SprintError::Unauthorized(_) => (StatusCode::FORBIDDEN, self.to_string()),
            SprintError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            SprintError::InvalidState(_) => (StatusCode::CONFLICT, self.to_string()),
            SprintError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            SprintError::Conflict => (StatusCode::CONFLICT, self.to_string()),
            SprintError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),
        };
        error_response(status, message)
    }
}
