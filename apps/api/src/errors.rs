use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::document::DocumentError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::Validation(format!("Malformed multipart body: {}", e.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Document(e) => match e {
                DocumentError::UnsupportedFormat(_)
                | DocumentError::Unreadable(_)
                | DocumentError::EmptyDocument => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "UNPROCESSABLE_ENTITY",
                    e.summary(),
                ),
                DocumentError::ModelUnavailable(_) | DocumentError::MalformedOutput(_) => {
                    tracing::error!("LLM error: {e}");
                    (
                        StatusCode::BAD_GATEWAY,
                        "LLM_ERROR",
                        "An AI processing error occurred".to_string(),
                    )
                }
                DocumentError::Unavailable(_) => {
                    tracing::error!("Storage error: {e}");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "STORAGE_ERROR",
                        "A storage error occurred".to_string(),
                    )
                }
            },
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
