//! Entry point for the notes-server binary.

use std::sync::Arc;

use notes_server::{
    AuthConfig, JwksVerifier, SharedSecretVerifier, TokenVerifier, build_app,
    config::{LogFormat, ServerConfig},
    state::AppState,
};
use notes_store::{DocumentStore, MemoryDocumentStore, PgDocumentStore, StoreConfig};
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = ServerConfig::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level, config.log_format);

    tracing::info!("Starting notes-server");
    tracing::info!(
        port = config.port,
        log_level = %config.log_level,
        collection = %config.notes_collection,
        "Configuration loaded"
    );

    let store = connect_store(&config).await?;
    let verifier = build_verifier(&config.auth);

    // Build application state and router
    let state = AppState::new(store, verifier, config.clone());
    tracing::info!(backend = state.service().backend(), "Document store ready");
    let app = build_app(state)?;

    // Create listener
    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initialize the tracing subscriber. `RUST_LOG` overrides `log_level`.
fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// PostgreSQL when `DATABASE_URL` is set, otherwise the in-memory store.
async fn connect_store(
    config: &ServerConfig,
) -> Result<Arc<dyn DocumentStore>, notes_store::StoreError> {
    match &config.database_url {
        Some(database_url) => {
            let store = PgDocumentStore::connect(StoreConfig {
                database_url: database_url.clone(),
                max_connections: config.database_max_connections,
                ..StoreConfig::default()
            })
            .await?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, notes are kept in memory and lost on restart");
            Ok(Arc::new(MemoryDocumentStore::new()))
        }
    }
}

fn build_verifier(auth: &AuthConfig) -> Arc<dyn TokenVerifier> {
    match auth {
        AuthConfig::Jwks {
            jwks_url,
            issuer,
            audience,
            cache_ttl,
        } => {
            tracing::info!(jwks_url = %jwks_url, "Verifying tokens against identity provider keys");
            Arc::new(JwksVerifier::new(
                jwks_url.clone(),
                issuer.as_deref(),
                audience.as_deref(),
                *cache_ttl,
            ))
        }
        AuthConfig::SharedSecret {
            secret,
            issuer,
            audience,
        } => {
            tracing::warn!("Verifying tokens with a shared secret (AUTH_MODE=secret)");
            Arc::new(SharedSecretVerifier::new(
                secret,
                issuer.as_deref(),
                audience.as_deref(),
            ))
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
