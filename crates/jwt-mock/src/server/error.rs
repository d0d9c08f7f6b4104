//! HTTP error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Fixed, per-operation messages placed in [`ErrorBody::message`].
pub mod messages {
    pub const REFRESH_JWKS: &str = "Failed to refresh JWK set";
    pub const READ_CLAIMS: &str = "Failed to read claims";
    pub const GENERATE_JWT: &str = "Failed to generate JWT";
    pub const READ_REGISTRATION: &str = "Failed to read client registration";
    pub const REGISTER_CLIENT: &str = "Failed to register client";
    pub const READ_TOKEN_REQUEST: &str = "Failed to read client token req";
    pub const GENERATE_TOKEN: &str = "Failed to generate token";
}

/// JSON body of every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// What the server was doing.
    pub message: String,
    /// Why it failed.
    pub error: String,
}

/// A failed request, rendered as `status` plus an [`ErrorBody`].
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    #[must_use]
    pub fn new(status: StatusCode, message: &str, error: impl std::fmt::Display) -> Self {
        Self { status, body: ErrorBody { message: message.to_string(), error: error.to_string() } }
    }

    /// 400 Bad Request.
    #[must_use]
    pub fn bad_request(message: &str, error: impl std::fmt::Display) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, error)
    }

    /// 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: &str, error: impl std::fmt::Display) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, error)
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub const fn body(&self) -> &ErrorBody {
        &self.body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
