//! Health check and service metadata endpoints.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::routes::API_PREFIX;
use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
}

/// Response for `GET /`.
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
    pub version: &'static str,
    pub api: &'static str,
}

/// GET /health - Liveness probe, no authentication.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "notes-api",
    })
}

/// GET / - Service metadata.
async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        message: state.config().project_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        api: API_PREFIX,
    })
}

/// Build health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
}
