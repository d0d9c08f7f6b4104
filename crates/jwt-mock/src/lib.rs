//! JWT Mock Server
//!
//! A mock OAuth 2.0 / OIDC authorization server for integration tests. It
//! publishes a JSON Web Key Set, signs arbitrary claim sets on request and runs
//! the client-credentials grant against an in-memory client registry, so
//! services that verify bearer tokens can be tested without a real identity
//! provider.
//!
//! # Features
//!
//! - **RS256 signing** with a generated RSA key, certified by a generated root
//! - **Key rotation** that swaps key and key set atomically
//! - **Client credentials** grant with `iss`, `sub`, `aud`, `azp`, `scope`, `gty` claims
//! - **In-process harness** ([`testing::TestServer`]) for end-to-end tests
//!
//! # Example
//!
//! ```no_run
//! use jwt_mock::{config::Config, server::Server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let server = Server::new(Config::default())?;
//!     server.run().await
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod keys;
pub mod registry;
pub mod server;
pub mod testing;
pub mod token;

pub use client::JwtMockClient;
pub use config::Config;
pub use error::{ClientError, KeyError, RegistryError, RequestError, TokenError};
pub use keys::{Jwk, Jwks, KeyStore, SigningKey};
pub use registry::{ClientRegistration, ClientRegistry, ClientTokenRequest, ClientTokenResponse};
pub use server::Server;
pub use token::Claims;
