//! API error types mapped to HTTP status codes.
//!
//! Every variant renders a JSON body. Internal failures are logged here and
//! answered with a generic message.

use axum::Json;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::{
    core::collection::StoreError,
    record::PatchError,
    runtime::handle::RuntimeError,
};

/// Boundary error type that implements `IntoResponse`.
///
/// - `BadRequest` → 400 `{"error": ...}`
/// - `NotFound` → 404 `{"error": ...}`
/// - `NoMatch` → 404 `{"message": ...}`
/// - `MethodNotAllowed` → 405 `{"error": ...}`
/// - `PayloadTooLarge` → 413 `{"error": ...}`
/// - `Internal` → 500 `{"error": "Internal Server Error"}`
#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed request input.
    BadRequest(String),
    /// Unknown route, empty store, or unknown record id.
    NotFound(String),
    /// A search ran over data but nothing matched.
    NoMatch(String),
    /// The path exists but not for this method.
    MethodNotAllowed(String),
    /// The request body exceeds the configured limit.
    PayloadTooLarge(String),
    /// Load, save, or runtime failure.
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::NoMatch(msg) => (StatusCode::NOT_FOUND, json!({ "message": msg })),
            ApiError::MethodNotAllowed(msg) => {
                (StatusCode::METHOD_NOT_ALLOWED, json!({ "error": msg }))
            }
            ApiError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, json!({ "error": msg })),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Internal Server Error" }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

impl From<RuntimeError> for ApiError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::Store(StoreError::NotFound(id)) => {
                ApiError::NotFound(format!("Character with id {id} not found"))
            }
            RuntimeError::Query(err) => ApiError::BadRequest(err.to_string()),
            RuntimeError::Patch(err) => ApiError::from(err),
            other => {
                error!(error = %other, "store operation failed");
                ApiError::Internal
            }
        }
    }
}

impl From<PatchError> for ApiError {
    fn from(err: PatchError) -> Self {
        match err {
            PatchError::NotAnObject | PatchError::Empty => {
                ApiError::BadRequest("No update data provided".to_string())
            }
            PatchError::InvalidJson(_) => {
                ApiError::BadRequest("Request body must be valid JSON".to_string())
            }
            PatchError::UnsupportedValue { .. } => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge("Request body too large".to_string())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}
