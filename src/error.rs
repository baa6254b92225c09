//! Error types for Tavern
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.
//! Handlers never write error responses themselves.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::federation::CompactionError;

/// Application-wide error type
///
/// Client-caused failures map to 4xx codes. Everything else collapses
/// to a generic 500 whose details are logged but never sent to the caller.
#[derive(Debug, Error)]
pub enum AppError {
    /// Webfinger resource did not parse (400)
    #[error("Malformed resource: {0}")]
    MalformedResource(String),

    /// Request body is not a JSON object (400)
    #[error("Malformed body: {0}")]
    MalformedBody(String),

    /// Submitted activity failed shape validation (400)
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Actor does not exist on this node (404)
    #[error("Actor not found")]
    ActorNotFound,

    /// Accept / Content-Type is not an ActivityPub media type (417)
    #[error("Expected an ActivityPub media type")]
    ContentTypeMismatch,

    /// JSON-LD compaction error (500)
    #[error("Compaction error: {0}")]
    Compaction(#[from] CompactionError),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Keypair generation error (500)
    #[error("Key generation error: {0}")]
    KeyGeneration(String),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status and metric label for this error
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::MalformedResource(_) => (StatusCode::BAD_REQUEST, "malformed_resource"),
            AppError::MalformedBody(_) => (StatusCode::BAD_REQUEST, "malformed_body"),
            AppError::ValidationFailed(_) => (StatusCode::BAD_REQUEST, "validation"),
            AppError::ActorNotFound => (StatusCode::NOT_FOUND, "not_found"),
            AppError::ContentTypeMismatch => {
                (StatusCode::EXPECTATION_FAILED, "content_type_mismatch")
            }
            AppError::Compaction(_) => (StatusCode::INTERNAL_SERVER_ERROR, "compaction"),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database"),
            AppError::KeyGeneration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "key_generation"),
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// 4xx variants echo their message; 5xx variants are logged and
    /// answered with a generic body.
    fn into_response(self) -> Response {
        use axum::Json;

        let (status, error_type) = self.status();

        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[error_type]).inc();

        let error_message = if status.is_server_error() {
            tracing::error!(error = %self, error_type, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(serde_json::json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
