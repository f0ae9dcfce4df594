//! notes-server: HTTP API server for the Notes API
//!
//! This crate provides:
//! - Bearer token verification against an external identity provider
//! - The notes service (list/search/paginate, get, create, update, delete),
//!   scoped to the authenticated user
//! - REST endpoints under `/api/v1`, plus `/health` and `/`
//!
//! # Architecture
//!
//! The server is built on Axum with a middleware stack for:
//! - Request tracing and logging
//! - CORS handling
//! - Request ID generation
//! - JSON error responses
//!
//! The document store and the token verifier are trait objects held in
//! [`AppState`], so tests swap in the in-memory store and a shared-secret
//! verifier.
//!
//! # Usage
//!
//! ```rust,ignore
//! use notes_server::{config::ServerConfig, build_app, AppState};
//!
//! let config = ServerConfig::from_env()?;
//! let state = AppState::new(store, verifier, config);
//! let app = build_app(state)?;
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod jwks;
pub mod middleware;
pub mod routes;
pub mod service;
pub mod state;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::middleware::request_id::{propagate_request_id, request_id_layer};

// Re-exports for convenience
pub use auth::{AuthError, SharedSecretVerifier, TokenVerifier, UserIdentity};
pub use config::{AuthConfig, ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use jwks::JwksVerifier;
pub use service::{NotePage, NotesError, NotesService};
pub use state::AppState;

// Re-export dependent crates
pub use notes_core;
pub use notes_store;

/// Build the router with the full middleware stack.
pub fn build_app(state: AppState) -> Result<Router, ConfigError> {
    let cors = build_cors_layer(&state.config().cors_allowed_origins)?;

    Ok(routes::build_router(state)
        .layer(axum::middleware::from_fn(propagate_request_id))
        .layer(request_id_layer())
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

/// Build CORS layer from configuration.
pub fn build_cors_layer(allowed_origins: &str) -> Result<CorsLayer, ConfigError> {
    if allowed_origins.trim() == "*" {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    // Parse comma-separated origins
    let origins = allowed_origins
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<http::HeaderValue>()
                .map_err(|e| ConfigError::InvalidValue {
                    name: "CORS_ALLOWED_ORIGINS".to_string(),
                    reason: format!("{s:?}: {e}"),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_wildcard() {
        assert!(build_cors_layer("*").is_ok());
    }

    #[test]
    fn test_cors_origin_list() {
        assert!(build_cors_layer("http://localhost:3000, http://localhost:8080").is_ok());
    }

    #[test]
    fn test_cors_invalid_origin() {
        let err = build_cors_layer("http://ok.example,bad\norigin").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
