//! Route definitions for the HTTP API.

pub mod health;
pub mod notes;

use axum::{
    Router,
    http::{Method, Uri},
};

use crate::error::ApiError;
use crate::state::AppState;

/// Prefix for the versioned API.
pub const API_PREFIX: &str = "/api/v1";

/// Build the complete router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .nest(API_PREFIX, notes::routes())
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        .with_state(state)
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("no route for {}", uri.path()))
}

async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    tracing::debug!(method = %method, path = uri.path(), "Method not allowed");
    ApiError::MethodNotAllowed(method.to_string())
}
