//! Error type for the REST surface.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::eval::EvaluationError;

/// Errors a REST handler can return. Lookup failures name what was
/// missing; internal details never reach the client.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("internal error: {0}")]
    InternalServerError(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InternalServerError(detail) => {
                // The detail stays in the log.
                error!(detail = %detail, "request handler failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound(what) => (StatusCode::NOT_FOUND, format!("no such {what}")),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<EvaluationError> for AppError {
    fn from(err: EvaluationError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
