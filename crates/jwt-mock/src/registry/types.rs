//! Machine client request and response types.

use serde::{Deserialize, Serialize};

/// Token type returned by the token endpoint.
pub const BEARER: &str = "Bearer";

/// The only grant type the token endpoint accepts.
pub const CLIENT_CREDENTIALS: &str = "client_credentials";

/// A machine client allowed to use the client-credentials grant.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRegistration {
    #[serde(rename = "client_id")]
    pub id: String,
    #[serde(rename = "client_secret")]
    pub secret: String,
    pub scope: String,
}

impl ClientRegistration {
    #[must_use]
    pub fn new(id: impl Into<String>, secret: impl Into<String>, scope: impl Into<String>) -> Self {
        Self { id: id.into(), secret: secret.into(), scope: scope.into() }
    }
}

impl std::fmt::Debug for ClientRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistration")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Client-credentials token request (sent form-url-encoded).
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ClientTokenRequest {
    pub client_id: String,
    pub client_secret: String,
    pub grant_type: String,
    pub audience: String,
}

impl ClientTokenRequest {
    /// A `client_credentials` request.
    #[must_use]
    pub fn client_credentials(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            grant_type: CLIENT_CREDENTIALS.to_string(),
            audience: audience.into(),
        }
    }
}

impl std::fmt::Debug for ClientTokenRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientTokenRequest")
            .field("client_id", &self.client_id)
            .field("grant_type", &self.grant_type)
            .field("audience", &self.audience)
            .finish()
    }
}

/// Token endpoint response.
///
/// `expires_in` carries the absolute expiry as a Unix timestamp, not a
/// relative number of seconds. Existing consumers depend on that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientTokenResponse {
    pub access_token: String,
    pub scope: String,
    pub expires_in: i64,
    pub token_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_wire_names() {
        let reg: ClientRegistration = serde_json::from_str(
            r#"{"client_id":"svc1","client_secret":"s3cr3t","scope":"read"}"#,
        )
        .unwrap();
        assert_eq!(reg, ClientRegistration::new("svc1", "s3cr3t", "read"));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let reg = ClientRegistration::new("svc1", "s3cr3t", "read");
        assert!(!format!("{reg:?}").contains("s3cr3t"));

        let req = ClientTokenRequest::client_credentials("svc1", "s3cr3t", "api");
        assert!(!format!("{req:?}").contains("s3cr3t"));
        assert_eq!(req.grant_type, CLIENT_CREDENTIALS);
    }
}
