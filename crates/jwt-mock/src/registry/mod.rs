//! In-memory registry of machine clients and the client-credentials exchange.

pub mod types;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;

pub use types::{BEARER, CLIENT_CREDENTIALS, ClientRegistration, ClientTokenRequest, ClientTokenResponse};

use crate::error::{RegistryError, RegistryResult};
use crate::keys::SigningKey;
use crate::token::{self, Claims, claims};

/// Issuer of client-credentials tokens.
pub const TOKEN_ISSUER: &str = "https://jwtmock.co";

/// Client token lifetime: 1 hour.
pub const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Registered machine clients, keyed by client id.
///
/// Registrations live for the life of the registry; there is no removal.
#[derive(Clone, Default)]
pub struct ClientRegistry {
    clients: Arc<RwLock<HashMap<String, ClientRegistration>>>,
}

impl ClientRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client. Fails if the id is already taken.
    pub async fn register(&self, registration: ClientRegistration) -> RegistryResult<()> {
        let mut clients = self.clients.write().await;

        if clients.contains_key(&registration.id) {
            return Err(RegistryError::DuplicateClient(registration.id));
        }

        tracing::info!(client_id = %registration.id, scope = %registration.scope, "Registered client");
        clients.insert(registration.id.clone(), registration);

        Ok(())
    }

    /// Number of registered clients.
    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }

    /// Exchange client credentials for a signed access token.
    ///
    /// Checks, in order: the client exists, the secret matches, the grant
    /// type is `client_credentials`.
    pub async fn generate_token(
        &self,
        request: &ClientTokenRequest,
        key: &SigningKey,
    ) -> RegistryResult<ClientTokenResponse> {
        let client = self
            .clients
            .read()
            .await
            .get(&request.client_id)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownClient(request.client_id.clone()))?;

        if !bool::from(client.secret.as_bytes().ct_eq(request.client_secret.as_bytes())) {
            return Err(RegistryError::InvalidSecret);
        }

        if request.grant_type != CLIENT_CREDENTIALS {
            return Err(RegistryError::UnsupportedGrantType(request.grant_type.clone()));
        }

        let now = Utc::now().timestamp();
        let exp = now + TOKEN_LIFETIME_SECS;
        let claims = Claims::new()
            .with(claims::ISSUER, TOKEN_ISSUER)
            .with(claims::SUBJECT, format!("{}@clients", client.id))
            .with(claims::AUDIENCE, request.audience.as_str())
            .with(claims::ISSUED_AT, now)
            .with(claims::EXPIRATION, exp)
            .with(claims::AUTHORIZED_PARTY, client.id.as_str())
            .with(claims::SCOPE, client.scope.as_str())
            .with(claims::GRANT_TYPE, CLIENT_CREDENTIALS);

        let access_token = token::sign(&claims, key)?;

        tracing::info!(client_id = %client.id, kid = %key.id(), "Issued client token");

        Ok(ClientTokenResponse {
            access_token,
            scope: client.scope,
            expires_in: exp,
            token_type: BEARER.to_string(),
        })
    }
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry").finish()
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{Algorithm, DecodingKey, Validation};
    use serde_json::Value;

    use super::*;

    const SECRET: &[u8] = b"registry-test-secret";

    fn key() -> SigningKey {
        SigningKey::secret("kid-1", SECRET)
    }

    async fn registry_with_svc1() -> ClientRegistry {
        let registry = ClientRegistry::new();
        registry.register(ClientRegistration::new("svc1", "s3cr3t", "read")).await.unwrap();
        registry
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let registry = ClientRegistry::new();
        assert!(registry.register(ClientRegistration::new("svc1", "a", "read")).await.is_ok());

        let err = registry.register(ClientRegistration::new("svc1", "b", "write")).await.unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateClient(ref id) if id == "svc1"));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_generate_token() {
        let registry = registry_with_svc1().await;
        let request = ClientTokenRequest::client_credentials("svc1", "s3cr3t", "api");

        let before = Utc::now().timestamp();
        let response = registry.generate_token(&request, &key()).await.unwrap();

        assert_eq!(response.scope, "read");
        assert_eq!(response.token_type, "Bearer");
        assert!(response.expires_in >= before + TOKEN_LIFETIME_SECS);

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&["api"]);
        let decoded = jsonwebtoken::decode::<Value>(
            &response.access_token,
            &DecodingKey::from_secret(SECRET),
            &validation,
        )
        .unwrap();

        assert_eq!(decoded.header.kid.as_deref(), Some("kid-1"));
        let claims = decoded.claims;
        assert_eq!(claims["iss"], TOKEN_ISSUER);
        assert_eq!(claims["sub"], "svc1@clients");
        assert_eq!(claims["aud"], "api");
        assert_eq!(claims["azp"], "svc1");
        assert_eq!(claims["scope"], "read");
        assert_eq!(claims["gty"], "client_credentials");
        assert_eq!(claims["exp"], response.expires_in);
        assert_eq!(claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap(), 3600);
    }

    #[tokio::test]
    async fn test_unknown_client() {
        let registry = registry_with_svc1().await;
        let request = ClientTokenRequest::client_credentials("nobody", "s3cr3t", "api");

        let err = registry.generate_token(&request, &key()).await.unwrap_err();
        assert!(matches!(err, RegistryError::UnknownClient(_)));
        assert!(err.is_auth_failure());
    }

    #[tokio::test]
    async fn test_wrong_secret() {
        let registry = registry_with_svc1().await;
        let request = ClientTokenRequest::client_credentials("svc1", "wrong", "api");

        let err = registry.generate_token(&request, &key()).await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSecret));
        assert!(err.is_auth_failure());
    }

    #[tokio::test]
    async fn test_secret_checked_before_grant_type() {
        let registry = registry_with_svc1().await;
        let mut request = ClientTokenRequest::client_credentials("svc1", "wrong", "api");
        request.grant_type = "password".into();

        let err = registry.generate_token(&request, &key()).await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSecret));
    }

    #[tokio::test]
    async fn test_unsupported_grant_type() {
        let registry = registry_with_svc1().await;
        let mut request = ClientTokenRequest::client_credentials("svc1", "s3cr3t", "api");
        request.grant_type = "authorization_code".into();

        let err = registry.generate_token(&request, &key()).await.unwrap_err();
        assert!(matches!(err, RegistryError::UnsupportedGrantType(ref g) if g == "authorization_code"));
    }
}
