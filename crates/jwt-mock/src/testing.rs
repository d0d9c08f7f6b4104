//! In-process server for end-to-end tests.
//!
//! ```no_run
//! use chrono::{Duration, Utc};
//! use jwt_mock::{Claims, testing::TestServer};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let server = TestServer::start().await?;
//! let now = Utc::now();
//! let claims = Claims::new()
//!     .with("sub", "user-1")
//!     .with("iat", now.timestamp())
//!     .with("exp", (now + Duration::hours(1)).timestamp());
//! let token = server.generate_jwt(&claims)?;
//! // point the service under test at `server.url()` and send `token`
//! server.close().await;
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::client::JwtMockClient;
use crate::config::Config;
use crate::error::{ClientResult, TokenResult};
use crate::keys::{KeySetGenerator, KeyStore};
use crate::server::Server;
use crate::token::{self, Claims};

/// A server listening on a system-chosen port on the loopback interface.
///
/// Shut it down with [`TestServer::close`]; dropping it also stops the
/// listener, without waiting.
pub struct TestServer {
    addr: SocketAddr,
    url: String,
    key_store: Arc<KeyStore>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<std::io::Result<()>>>,
}

impl TestServer {
    /// Start a server with [`Config::for_testing`].
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with(Config::for_testing()).await
    }

    /// Start a server with `config`. The configured port is ignored.
    pub async fn start_with(config: Config) -> anyhow::Result<Self> {
        let generator = KeySetGenerator::from_config(&config);
        let key_store =
            Arc::new(tokio::task::spawn_blocking(move || KeyStore::new(generator)).await??);

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let server = Server::with_key_store(config, Arc::clone(&key_store));
        let (shutdown, signal) = oneshot::channel();
        let task = tokio::spawn(server.serve(listener, async move {
            let _ = signal.await;
        }));

        tracing::debug!(%addr, "Test server started");

        Ok(Self {
            addr,
            url: format!("http://{addr}"),
            key_store,
            shutdown: Some(shutdown),
            task: Some(task),
        })
    }

    /// Base URL, e.g. `http://127.0.0.1:41234`.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Sign `claims` with the server's active key, without a round trip.
    pub fn generate_jwt(&self, claims: &Claims) -> TokenResult<String> {
        token::sign(claims, &self.key_store.signing_key())
    }

    #[must_use]
    pub const fn key_store(&self) -> &Arc<KeyStore> {
        &self.key_store
    }

    /// HTTP client pointed at this server.
    pub fn client(&self) -> ClientResult<JwtMockClient> {
        JwtMockClient::new(&self.url)
    }

    /// Stop accepting connections and wait for in-flight requests to finish.
    pub async fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            match task.await {
                Ok(Ok(())) => tracing::debug!(addr = %self.addr, "Test server stopped"),
                Ok(Err(e)) => tracing::warn!(error = %e, "Test server failed"),
                Err(e) => tracing::warn!(error = %e, "Test server task failed"),
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

impl std::fmt::Debug for TestServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestServer").field("url", &self.url).finish()
    }
}
