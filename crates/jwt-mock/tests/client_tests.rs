//! Outbound client and test harness tests.
//!
//! Happy paths run against a real [`TestServer`]; error paths against wiremock.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, Validation};
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use jwt_mock::client::JwtMockClient;
use jwt_mock::error::ClientError;
use jwt_mock::keys::Jwks;
use jwt_mock::registry::{ClientRegistration, ClientTokenRequest};
use jwt_mock::testing::TestServer;
use jwt_mock::token::Claims;

fn claims() -> Claims {
    let now = Utc::now();
    Claims::new()
        .with("sub", "olg387f")
        .with("iat", now.timestamp())
        .with("exp", (now + Duration::hours(1)).timestamp())
}

fn decode(token: &str, jwks: &Jwks, audience: Option<&str>) -> Value {
    let kid = jsonwebtoken::decode_header(token).unwrap().kid.unwrap();
    let jwk = jwks.find(&kid).unwrap();

    let mut validation = Validation::new(Algorithm::RS256);
    match audience {
        Some(aud) => validation.set_audience(&[aud]),
        None => validation.validate_aud = false,
    }
    jsonwebtoken::decode::<Value>(token, &jwk.decoding_key().unwrap(), &validation)
        .unwrap()
        .claims
}

// =============================================================================
// Against a running server
// =============================================================================

#[tokio::test]
async fn test_harness_generate_jwt() {
    let server = TestServer::start().await.unwrap();
    let client = server.client().unwrap();

    let token = server.generate_jwt(&claims()).unwrap();
    let jwks = client.jwks().await.unwrap();

    assert_eq!(decode(&token, &jwks, None)["sub"], "olg387f");
    assert_eq!(server.key_store().signing_key().id(), jwks.keys[0].kid);

    server.close().await;
}

#[tokio::test]
async fn test_client_round_trip() {
    let server = TestServer::start().await.unwrap();
    let client = server.client().unwrap();

    let token = client.generate_jwt(&claims()).await.unwrap();
    let jwks = client.jwks().await.unwrap();
    assert_eq!(decode(&token, &jwks, None)["sub"], "olg387f");

    client.register_client(&ClientRegistration::new("svc1", "s3cr3t", "read")).await.unwrap();
    let response = client
        .request_token(&ClientTokenRequest::client_credentials("svc1", "s3cr3t", "api"))
        .await
        .unwrap();

    let claims = decode(&response.access_token, &jwks, Some("api"));
    assert_eq!(claims["sub"], "svc1@clients");
    assert_eq!(claims["scope"], "read");

    server.close().await;
}

#[tokio::test]
async fn test_client_rotate() {
    let server = TestServer::start().await.unwrap();
    let client = server.client().unwrap();

    let before = client.jwks().await.unwrap();
    client.rotate().await.unwrap();
    let after = client.jwks().await.unwrap();

    assert_ne!(before.keys[0].kid, after.keys[0].kid);
    assert_eq!(server.key_store().signing_key().id(), after.keys[0].kid);

    server.close().await;
}

#[tokio::test]
async fn test_client_surfaces_server_errors() {
    let server = TestServer::start().await.unwrap();
    let client = server.client().unwrap();

    let registration = ClientRegistration::new("svc1", "s3cr3t", "read");
    client.register_client(&registration).await.unwrap();

    let err = client.register_client(&registration).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(err.to_string().contains("Failed to register client"));

    let err = client
        .request_token(&ClientTokenRequest::client_credentials("svc1", "wrong", "api"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::UnexpectedStatus { status: 400, ref message }
            if message == "Failed to generate token: client secret is wrong"
    ));

    server.close().await;
}

#[tokio::test]
async fn test_two_servers_are_independent() {
    let first = TestServer::start().await.unwrap();
    let second = TestServer::start().await.unwrap();

    assert_ne!(first.url(), second.url());
    assert_ne!(first.key_store().snapshot().kid(), second.key_store().snapshot().kid());

    first.close().await;
    second.close().await;
}

// =============================================================================
// Against wiremock
// =============================================================================

fn mock_client(server: &MockServer) -> JwtMockClient {
    JwtMockClient::with_max_retries(server.uri(), 0).unwrap()
}

#[tokio::test]
async fn test_register_expects_accepted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/clients"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let err = mock_client(&mock_server)
        .register_client(&ClientRegistration::new("svc1", "s3cr3t", "read"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(200));
}

#[tokio::test]
async fn test_rotate_failure_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/.well-known/jwks.json"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "Failed to refresh JWK set",
            "error": "key generation failed: rsa: entropy exhausted"
        })))
        .mount(&mock_server)
        .await;

    let err = mock_client(&mock_server).rotate().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(
        err.to_string(),
        "Unexpected status 500: Failed to refresh JWK set: key generation failed: rsa: entropy exhausted"
    );
}

#[tokio::test]
async fn test_plain_text_error_kept_verbatim() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/.well-known/jwks.json"))
        .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
        .mount(&mock_server)
        .await;

    let err = mock_client(&mock_server).jwks().await.unwrap_err();
    assert!(matches!(err, ClientError::UnexpectedStatus { status: 404, ref message } if message == "gone"));
}

#[tokio::test]
async fn test_malformed_success_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/generate-jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let err = mock_client(&mock_server).generate_jwt(&claims()).await.unwrap_err();
    assert!(matches!(err, ClientError::Parse(_)));
}

#[tokio::test]
async fn test_token_request_is_form_encoded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_secret=s%26cr3t"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "a.b.c",
            "scope": "read",
            "expires_in": 1_700_003_600,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = mock_client(&mock_server)
        .request_token(&ClientTokenRequest::client_credentials("svc1", "s&cr3t", "api"))
        .await
        .unwrap();

    assert_eq!(response.access_token, "a.b.c");
    assert_eq!(response.expires_in, 1_700_003_600);
}

#[tokio::test]
async fn test_transient_failure_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/.well-known/jwks.json"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/.well-known/jwks.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"keys": []})))
        .mount(&mock_server)
        .await;

    let client = JwtMockClient::with_max_retries(mock_server.uri(), 1).unwrap();
    let jwks = client.jwks().await.unwrap();
    assert!(jwks.keys.is_empty());
}

#[tokio::test]
async fn test_state_changing_requests_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/clients"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/.well-known/jwks.json"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = JwtMockClient::with_max_retries(mock_server.uri(), 3).unwrap();

    let err = client
        .register_client(&ClientRegistration::new("svc1", "s3cr3t", "read"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(503));

    let err = client.rotate().await.unwrap_err();
    assert_eq!(err.status(), Some(503));

    mock_server.verify().await;
}
