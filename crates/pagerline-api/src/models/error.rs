//! Unified error handling for the API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API error response with an HTTP status code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// HTTP status code.
    #[serde(skip)]
    pub status: StatusCode,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status,
        }
    }

    /// Bad request (400).
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message, StatusCode::BAD_REQUEST)
    }

    /// Not found (404). `message` is used as is.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message, StatusCode::NOT_FOUND)
    }

    /// Conflict (409).
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message, StatusCode::CONFLICT)
    }

    /// Internal server error (500).
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Service unavailable (503).
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new("SERVICE_UNAVAILABLE", message, StatusCode::SERVICE_UNAVAILABLE)
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = self.status;
        let body = serde_json::json!({
            "success": false,
            "error": {
                "code": self.code,
                "message": self.message,
            }
        });
        (status, axum::Json(body)).into_response()
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorResponse {}

// Conversions from the domain layers.

impl From<pagerline_alerts::Error> for ErrorResponse {
    fn from(e: pagerline_alerts::Error) -> Self {
        match e {
            pagerline_alerts::Error::NotFound(msg) => Self::not_found(msg),
            pagerline_alerts::Error::Validation(msg) => Self::bad_request(msg),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<pagerline_storage::Error> for ErrorResponse {
    fn from(e: pagerline_storage::Error) -> Self {
        match e {
            pagerline_storage::Error::NotFound(msg) => Self::not_found(msg),
            pagerline_storage::Error::AlreadyExists(msg) => Self::conflict(msg),
            pagerline_storage::Error::InvalidInput(msg) => Self::bad_request(msg),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<pagerline_core::Error> for ErrorResponse {
    fn from(e: pagerline_core::Error) -> Self {
        match e {
            pagerline_core::Error::NotFound(msg) => Self::not_found(msg),
            pagerline_core::Error::Validation(msg) => Self::bad_request(msg),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for ErrorResponse {
    fn from(e: anyhow::Error) -> Self {
        Self::internal(e.to_string())
    }
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ErrorResponse>;
