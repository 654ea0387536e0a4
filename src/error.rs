//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::service::ServiceError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Missing required header: {0}")]
    MissingHeader(String),

    #[error("user not found")]
    UserNotFound,

    #[error("transaction with this ID already exists")]
    DuplicateTransaction,

    #[error("insufficient funds for this transaction")]
    InsufficientFunds,

    #[error("invalid amount format")]
    InvalidAmount,

    // Server errors (5xx)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::UserNotFound => AppError::UserNotFound,
            ServiceError::DuplicateTransaction => AppError::DuplicateTransaction,
            ServiceError::InsufficientFunds => AppError::InsufficientFunds,
            ServiceError::InvalidAmount(_) => AppError::InvalidAmount,
            ServiceError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Success response envelope: `{"data": ...}`
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

impl AppError {
    /// HTTP status and client-facing message for this error.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::MissingHeader(header) => (
                StatusCode::BAD_REQUEST,
                format!("{} header is required", header),
            ),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "user not found".to_string()),
            AppError::DuplicateTransaction => (
                StatusCode::CONFLICT,
                "transaction with this ID already exists".to_string(),
            ),
            AppError::InsufficientFunds => (
                StatusCode::BAD_REQUEST,
                "insufficient funds for this transaction".to_string(),
            ),
            AppError::InvalidAmount => {
                (StatusCode::BAD_REQUEST, "invalid amount format".to_string())
            }
            // Internal detail is logged, never sent to the client.
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "failed to process transaction".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        let body = ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("Unknown")
                .to_string(),
            message: Some(message),
        };

        (status, Json(body)).into_response()
    }
}
