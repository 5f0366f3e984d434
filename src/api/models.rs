//! Request and response data transfer objects for the REST API.

use serde::{Deserialize, Serialize};

/// Query string of `GET /characters`.
///
/// Kept as raw text so malformed numbers produce a JSON 400 rather than an
/// extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// One-based page number.
    pub page: Option<String>,
    /// Page size.
    pub per_page: Option<String>,
}

/// Body of successful update and delete responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: String,
}

/// Body of `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server answers.
    pub status: String,
}
