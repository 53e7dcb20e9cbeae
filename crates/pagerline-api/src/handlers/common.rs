//! Shared handler utilities: result types, response builders and
//! request validation.

use axum::http::StatusCode;
use axum::response::Json;

use pagerline_core::AlertId;

use crate::models::{common::ApiResponse, error::ErrorResponse};

/// Result type for all API handlers. The success value is wrapped in
/// [`ApiResponse`].
pub type HandlerResult<T> = Result<Json<ApiResponse<T>>, ErrorResponse>;

/// Result type for handlers that create a resource (201).
pub type CreatedResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ErrorResponse>;

/// Result type for utility functions that return parsed values.
pub type ExtractResult<T> = Result<T, ErrorResponse>;

/// Parse an alert id from a path segment.
pub fn parse_alert_id(value: &str) -> ExtractResult<AlertId> {
    AlertId::from_string(value)
        .map_err(|_| ErrorResponse::bad_request(format!("Invalid alert ID: {}", value)))
}

/// Require a non-blank body field, returning it trimmed.
pub fn require_field<'a>(name: &str, value: &'a str) -> ExtractResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ErrorResponse::bad_request(format!(
            "Missing required field: {}",
            name
        )));
    }
    Ok(value)
}

/// Create a successful response with data.
pub fn ok<T: serde::Serialize>(data: T) -> HandlerResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

/// Create a 201 response with data.
pub fn created<T: serde::Serialize>(data: T) -> CreatedResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(data))))
}
