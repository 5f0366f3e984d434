//! REST API layer built on Axum.
//!
//! Thin adapter over the store runtime: handlers validate request input,
//! call [`crate::runtime::handle::StoreHandle`], and map failures through
//! [`errors::ApiError`].

/// API error types mapped to HTTP status codes.
pub mod errors;
/// HTTP request handlers and application state.
pub mod handlers;
/// Request and response data transfer objects.
pub mod models;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, put};
use handlers::AppState;
use tower_http::trace::TraceLayer;

use crate::config;

/// Builds the Axum router with all routes and middleware layers.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home).fallback(handlers::method_not_allowed))
        .route(
            "/health",
            get(handlers::health).fallback(handlers::method_not_allowed),
        )
        .route(
            "/characters",
            get(handlers::list_characters).fallback(handlers::method_not_allowed),
        )
        .route(
            "/characters/search",
            get(handlers::search_characters).fallback(handlers::method_not_allowed),
        )
        .route(
            "/characters/:id",
            put(handlers::update_character)
                .delete(handlers::delete_character)
                .fallback(handlers::method_not_allowed),
        )
        .fallback(handlers::fallback)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(config::MAX_REQUEST_BODY_BYTES))
        .with_state(state)
}
