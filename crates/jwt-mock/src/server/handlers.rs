//! Endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::AppState;
use super::error::{ApiError, messages};
use super::extract;
use crate::registry::ClientTokenResponse;
use crate::token;

/// Body of a successful `POST /generate-jwt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedToken {
    pub token: String,
}

/// `GET /.well-known/jwks.json`
///
/// Serves the pre-rendered key set, byte-identical until the next rotation.
pub async fn get_jwks(State(state): State<AppState>) -> Response {
    let json = state.key_store.snapshot().jwks_json();

    (
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        json.to_string(),
    )
        .into_response()
}

/// `POST /.well-known/jwks.json`
///
/// Generates a new key and key set and makes them active.
pub async fn rotate_jwks(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    let store = Arc::clone(&state.key_store);

    match tokio::task::spawn_blocking(move || store.rotate()).await {
        Ok(Ok(_)) => Ok(StatusCode::NO_CONTENT),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "{}", messages::REFRESH_JWKS);
            Err(ApiError::internal(messages::REFRESH_JWKS, e))
        }
        Err(e) => {
            tracing::error!(error = %e, "Key rotation task failed");
            Err(ApiError::internal(messages::REFRESH_JWKS, e))
        }
    }
}

/// `POST /generate-jwt`
///
/// Signs an arbitrary JSON claim set with the active key.
pub async fn generate_jwt(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<GeneratedToken>, ApiError> {
    let claims = extract::claims(&body).map_err(|e| {
        tracing::error!(error = %e, "{}", messages::READ_CLAIMS);
        ApiError::bad_request(messages::READ_CLAIMS, e)
    })?;

    let key = state.key_store.signing_key();
    let token = token::sign(&claims, &key).map_err(|e| {
        tracing::error!(error = %e, "{}", messages::GENERATE_JWT);
        ApiError::bad_request(messages::GENERATE_JWT, e)
    })?;

    Ok(Json(GeneratedToken { token }))
}

/// `POST /clients`
pub async fn register_client(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let registration = extract::registration(&body).map_err(|e| {
        tracing::error!(error = %e, "{}", messages::READ_REGISTRATION);
        ApiError::bad_request(messages::READ_REGISTRATION, e)
    })?;

    state.registry.register(registration).await.map_err(|e| {
        tracing::error!(error = %e, "{}", messages::REGISTER_CLIENT);
        ApiError::bad_request(messages::REGISTER_CLIENT, e)
    })?;

    Ok(StatusCode::ACCEPTED)
}

/// `POST /oauth/token`
///
/// Client-credentials grant. Takes a form-url-encoded body.
pub async fn issue_token(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ClientTokenResponse>, ApiError> {
    let request = extract::token_request(&body).map_err(|e| {
        tracing::error!(error = %e, "{}", messages::READ_TOKEN_REQUEST);
        ApiError::bad_request(messages::READ_TOKEN_REQUEST, e)
    })?;

    let key = state.key_store.signing_key();
    let response = state.registry.generate_token(&request, &key).await.map_err(|e| {
        tracing::error!(client_id = %request.client_id, error = %e, "{}", messages::GENERATE_TOKEN);
        ApiError::bad_request(messages::GENERATE_TOKEN, e)
    })?;

    Ok(Json(response))
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "jwt-mock",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Unsupported methods on known paths, and unknown paths.
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
    )
}
