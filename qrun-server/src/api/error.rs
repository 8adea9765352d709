//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::service::job_service::JobError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        tracing::debug!("Request failed with {}: {}", status, message);
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Every admission failure is reported as 404, whatever its cause
impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        ApiError::NotFound(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
