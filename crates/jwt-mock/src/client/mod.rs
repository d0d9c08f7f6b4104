//! HTTP client for a running JWT mock server.
//!
//! Intended for test suites that start the server out of process. Uses
//! connection pooling via reqwest and retries transient failures with
//! exponential backoff. Requests that change server state (client
//! registration and key rotation) are sent exactly once.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;

use crate::error::{ClientError, ClientResult};
use crate::keys::Jwks;
use crate::registry::{ClientRegistration, ClientTokenRequest, ClientTokenResponse};
use crate::server::{ErrorBody, GeneratedToken, paths};
use crate::token::Claims;

/// Retries for transient failures (connection errors, 5xx, 408, 429).
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Per-request timeout. Rotation with large keys can take seconds.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the JWT mock server API.
#[derive(Clone)]
pub struct JwtMockClient {
    client: ClientWithMiddleware,
    /// Shares the connection pool of `client`, without the retry layer.
    once: ClientWithMiddleware,
    base_url: String,
}

impl JwtMockClient {
    /// Create a client for the server at `base_url`, e.g. `http://localhost:8080`.
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        Self::with_max_retries(base_url, DEFAULT_MAX_RETRIES)
    }

    /// Create a client that retries transient failures at most `max_retries` times.
    pub fn with_max_retries(base_url: impl Into<String>, max_retries: u32) -> ClientResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_millis(100), Duration::from_secs(2))
            .build_with_max_retries(max_retries);

        let once = ClientBuilder::new(client.clone()).build();
        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { client, once, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Have the server sign `claims` with its active key.
    pub async fn generate_jwt(&self, claims: &Claims) -> ClientResult<String> {
        let response =
            self.client.post(self.url(paths::GENERATE_JWT)).json(claims).send().await?;

        let body: GeneratedToken = Self::parse(Self::expect(response, StatusCode::OK).await?).await?;
        Ok(body.token)
    }

    /// Register a machine client. Never retried.
    pub async fn register_client(&self, registration: &ClientRegistration) -> ClientResult<()> {
        let response =
            self.once.post(self.url(paths::CLIENTS)).json(registration).send().await?;

        Self::expect(response, StatusCode::ACCEPTED).await?;
        Ok(())
    }

    /// Fetch the published key set.
    pub async fn jwks(&self) -> ClientResult<Jwks> {
        let response = self.client.get(self.url(paths::JWKS)).send().await?;

        Self::parse(Self::expect(response, StatusCode::OK).await?).await
    }

    /// Replace the server's signing key. Never retried.
    pub async fn rotate(&self) -> ClientResult<()> {
        let response = self.once.post(self.url(paths::JWKS)).send().await?;

        Self::expect(response, StatusCode::NO_CONTENT).await?;
        Ok(())
    }

    /// Run the client-credentials grant.
    pub async fn request_token(
        &self,
        request: &ClientTokenRequest,
    ) -> ClientResult<ClientTokenResponse> {
        let response = self.client.post(self.url(paths::TOKEN)).form(request).send().await?;

        Self::parse(Self::expect(response, StatusCode::OK).await?).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Pass the response through if it has the `expected` status.
    ///
    /// Server error bodies are flattened to `"<message>: <error>"`; anything
    /// else is reported verbatim.
    async fn expect(
        response: reqwest::Response,
        expected: StatusCode,
    ) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if status == expected {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => format!("{}: {}", body.message, body.error),
            Err(_) => text,
        };

        tracing::debug!(status = status.as_u16(), expected = expected.as_u16(), %message, "Unexpected response");

        Err(ClientError::unexpected_status(status.as_u16(), message))
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(ClientError::from)
    }
}

impl std::fmt::Debug for JwtMockClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtMockClient").field("base_url", &self.base_url).finish()
    }
}
