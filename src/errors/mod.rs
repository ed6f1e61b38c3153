//! Error handling module for the survey backend.
//!
//! Provides centralized error types with mapping to HTTP status codes and
//! response envelopes. Human-facing messages are short domain summaries; the
//! raw datastore error travels alongside as a diagnostic cause.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const DATASTORE_ERROR: &str = "DATASTORE_ERROR";
    pub const PARTIAL_WRITE: &str = "PARTIAL_WRITE";
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Point lookup matched zero rows
    NotFound(String),
    /// Request rejected before touching the datastore
    Validation(String),
    /// Underlying datastore request failed
    Datastore { message: String, cause: String },
    /// A multi-step write failed after an earlier step succeeded; the
    /// completed steps are not rolled back
    Partial { message: String, cause: String },
}

impl AppError {
    /// Wrap a datastore failure with a domain-specific summary.
    pub fn datastore(message: impl Into<String>, err: sqlx::Error) -> Self {
        AppError::Datastore {
            message: message.into(),
            cause: err.to_string(),
        }
    }

    /// Mark a failure that left an earlier write of the same operation in place.
    pub fn partial(message: impl Into<String>, err: sqlx::Error) -> Self {
        AppError::Partial {
            message: message.into(),
            cause: err.to_string(),
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Datastore { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Partial { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::Datastore { .. } => codes::DATASTORE_ERROR,
            AppError::Partial { .. } => codes::PARTIAL_WRITE,
        }
    }

    /// Get the human-facing error message.
    pub fn message(&self) -> String {
        match self {
            AppError::NotFound(msg) => msg.clone(),
            AppError::Validation(msg) => msg.clone(),
            AppError::Datastore { message, .. } => message.clone(),
            AppError::Partial { message, .. } => message.clone(),
        }
    }

    /// Get the underlying cause, when one was captured.
    pub fn cause(&self) -> Option<&str> {
        match self {
            AppError::Datastore { cause, .. } | AppError::Partial { cause, .. } => {
                Some(cause.as_str())
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())?;
        if let Some(cause) = self.cause() {
            write!(f, " ({})", cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Datastore error: {:?}", err);
        AppError::Datastore {
            message: "Datastore request failed".to_string(),
            cause: err.to_string(),
        }
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
                cause: error.cause().map(str::to_string),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}
