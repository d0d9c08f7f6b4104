//! HTTP surface of the mock authorization server.
//!
//! | Path                     | Method | Operation                      |
//! |--------------------------|--------|--------------------------------|
//! | `/.well-known/jwks.json` | GET    | current key set                |
//! | `/.well-known/jwks.json` | POST   | rotate the signing key         |
//! | `/generate-jwt`          | POST   | sign an arbitrary claim set    |
//! | `/clients`               | POST   | register a machine client      |
//! | `/oauth/token`           | POST   | client-credentials token grant |
//! | `/health`                | GET    | liveness                       |
//!
//! Any other method on these paths, and any other path, is a 404.

pub mod error;
pub mod extract;
pub mod handlers;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ErrorBody};
pub use handlers::GeneratedToken;

use crate::config::Config;
use crate::error::KeyResult;
use crate::keys::{KeySetGenerator, KeyStore};
use crate::registry::ClientRegistry;

/// Route paths.
pub mod paths {
    pub const JWKS: &str = "/.well-known/jwks.json";
    pub const GENERATE_JWT: &str = "/generate-jwt";
    pub const CLIENTS: &str = "/clients";
    pub const TOKEN: &str = "/oauth/token";
    pub const HEALTH: &str = "/health";
}

/// Shared state for HTTP handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub key_store: Arc<KeyStore>,
    pub registry: ClientRegistry,
}

/// Create the HTTP router.
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route(
            paths::JWKS,
            get(handlers::get_jwks).post(handlers::rotate_jwks).fallback(handlers::not_found),
        )
        .route(paths::GENERATE_JWT, post(handlers::generate_jwt).fallback(handlers::not_found))
        .route(paths::CLIENTS, post(handlers::register_client).fallback(handlers::not_found))
        .route(paths::TOKEN, post(handlers::issue_token).fallback(handlers::not_found))
        .route(paths::HEALTH, get(handlers::health).fallback(handlers::not_found))
        .fallback(handlers::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout)),
        )
        .with_state(state)
}

/// The mock authorization server: one key store, one client registry.
pub struct Server {
    config: Config,
    state: AppState,
}

impl Server {
    /// Build a server with a freshly generated signing key and no clients.
    ///
    /// # Errors
    ///
    /// Returns error if the initial key or certificate cannot be generated.
    pub fn new(config: Config) -> KeyResult<Self> {
        let key_store = KeyStore::new(KeySetGenerator::from_config(&config))?;
        Ok(Self::with_key_store(config, Arc::new(key_store)))
    }

    /// Build a server around an existing key store.
    #[must_use]
    pub fn with_key_store(config: Config, key_store: Arc<KeyStore>) -> Self {
        Self { config, state: AppState { key_store, registry: ClientRegistry::new() } }
    }

    #[must_use]
    pub fn router(&self) -> Router {
        create_router(self.state.clone(), self.config.request_timeout)
    }

    #[must_use]
    pub const fn key_store(&self) -> &Arc<KeyStore> {
        &self.state.key_store
    }

    #[must_use]
    pub const fn registry(&self) -> &ClientRegistry {
        &self.state.registry
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Listen on `0.0.0.0:<port>` until Ctrl-C.
    pub async fn run(self) -> anyhow::Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("HTTP server listening on http://{}", listener.local_addr()?);

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("HTTP server shut down");
        Ok(())
    }

    /// Serve on `listener` until `shutdown` resolves, then drain in-flight requests.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(listener, self.router()).with_graceful_shutdown(shutdown).await
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("key_store", &self.state.key_store)
            .finish()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}
