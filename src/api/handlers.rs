//! HTTP request handlers and shared application state.

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::Html;
use tracing::{info, warn};

use crate::api::errors::ApiError;
use crate::api::models::{HealthResponse, ListParams, MessageResponse};
use crate::config;
use crate::core::query::{PageResult, QueryError, SearchQuery};
use crate::record::{RecordPatch, RecordSet};
use crate::runtime::handle::StoreHandle;
use crate::types::RecordId;

const NO_DATA: &str = "No data found";

/// Page size defaults applied before a list request reaches the store.
#[derive(Debug, Clone, Copy)]
pub struct PagingConfig {
    /// Used when `per_page` is omitted.
    pub default_per_page: usize,
    /// Larger requested sizes are clamped to this.
    pub max_per_page: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_per_page: config::DEFAULT_PER_PAGE,
            max_per_page: config::DEFAULT_MAX_PER_PAGE,
        }
    }
}

/// Shared application state passed to every handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Store runtime; the only path to the backing file.
    pub store: StoreHandle,
    /// Page size policy.
    pub paging: PagingConfig,
}

/// `GET /`
pub async fn home() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// `GET /characters?page=&per_page=`
pub async fn list_characters(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<PageResult>, ApiError> {
    let Query(params) = params?;
    let page = parse_positive("page", params.page.as_deref(), 1)?;
    let per_page = parse_positive(
        "per_page",
        params.per_page.as_deref(),
        state.paging.default_per_page,
    )?
    .min(state.paging.max_per_page);

    let result = state.store.list(page, per_page).await?;
    if result.meta.total_records == 0 {
        return Err(ApiError::NotFound(NO_DATA.to_string()));
    }
    Ok(Json(result))
}

/// `GET /characters/search?first_name=&last_name=`
pub async fn search_characters(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<RecordSet>, ApiError> {
    let Query(query) = query?;
    if query.is_empty() {
        return Err(ApiError::BadRequest(QueryError::EmptySearch.to_string()));
    }

    let outcome = state.store.search(query.clone()).await?;
    if outcome.total_records == 0 {
        return Err(ApiError::NotFound(NO_DATA.to_string()));
    }
    if outcome.matches.is_empty() {
        info!(
            first_name = query.first_name.as_deref(),
            last_name = query.last_name.as_deref(),
            "no matching characters"
        );
        return Err(ApiError::NoMatch(
            "No matching characters found".to_string(),
        ));
    }
    Ok(Json(outcome.matches))
}

/// `PUT /characters/{id}` with a JSON object of field overwrites.
///
/// An unknown id is reported before a malformed body.
pub async fn update_character(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&raw_id)?;
    let patch = RecordPatch::from_slice(&body?);
    if let Err(err) = &patch {
        warn!(id, error = %err, "rejected update body");
    }
    state.store.update_parsed(id, patch).await?;
    Ok(Json(MessageResponse {
        message: format!("Character {id} updated successfully"),
    }))
}

/// `DELETE /characters/{id}`
pub async fn delete_character(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&raw_id)?;
    state.store.delete(id).await?;
    Ok(Json(MessageResponse {
        message: format!("Character {id} deleted successfully"),
    }))
}

/// Any unmatched route.
pub async fn fallback() -> ApiError {
    ApiError::NotFound("Resource not found".to_string())
}

/// A known route hit with a method it does not serve.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed("Method not allowed".to_string())
}

fn parse_positive(name: &str, raw: Option<&str>, default: usize) -> Result<usize, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(text) => match text.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(n),
            _ => Err(ApiError::BadRequest(format!(
                "{name} must be a positive integer"
            ))),
        },
    }
}

fn parse_id(raw: &str) -> Result<RecordId, ApiError> {
    raw.parse::<RecordId>()
        .map_err(|_| ApiError::BadRequest(format!("Invalid character id '{raw}'")))
}
