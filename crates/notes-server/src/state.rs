//! Application state shared across handlers.

use std::sync::Arc;

use notes_store::DocumentStore;

use crate::auth::TokenVerifier;
use crate::config::ServerConfig;
use crate::service::NotesService;

/// Application state shared across all handlers.
///
/// This is cloneable and can be extracted in handlers using `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// Note operations over the configured store.
    service: Arc<NotesService>,
    /// Bearer token verifier.
    verifier: Arc<dyn TokenVerifier>,
    /// Server configuration.
    config: Arc<ServerConfig>,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        verifier: Arc<dyn TokenVerifier>,
        config: ServerConfig,
    ) -> Self {
        Self {
            service: Arc::new(NotesService::from_config(store, &config)),
            verifier,
            config: Arc::new(config),
        }
    }

    /// Get a reference to the notes service.
    pub fn service(&self) -> &NotesService {
        &self.service
    }

    /// Get a reference to the token verifier.
    pub fn verifier(&self) -> &dyn TokenVerifier {
        self.verifier.as_ref()
    }

    /// Get a reference to the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service", &self.service)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
