//! Error types for the JWT mock server.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.
//! Each layer owns its own enum; the HTTP layer maps them to status codes in
//! [`crate::server::error`].

/// Errors from key material generation and key-set assembly.
#[derive(thiserror::Error, Debug)]
pub enum KeyError {
    /// Key pair or certificate creation failed
    #[error("key generation failed: {0}")]
    Generation(String),

    /// Requested RSA modulus size is outside the supported range
    #[error("unsupported key length {bits} bits: must be between {min} and {max}")]
    UnsupportedKeyLength {
        /// Requested size
        bits: usize,
        /// Smallest supported size
        min: usize,
        /// Largest supported size
        max: usize,
    },

    /// The key is not of a type the certificate authority can bind
    #[error("key type mismatch: expected {expected}, got {actual}")]
    KeyTypeMismatch {
        /// Key type the operation supports
        expected: &'static str,
        /// Key type that was supplied
        actual: &'static str,
    },

    /// Key could not be re-encoded for another library
    #[error("key encoding failed: {0}")]
    Encoding(String),

    /// Serializing the key set failed
    #[error("key set serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl KeyError {
    /// Create a generation error.
    #[must_use]
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Create an encoding error.
    #[must_use]
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding(message.into())
    }
}

impl From<rcgen::Error> for KeyError {
    fn from(err: rcgen::Error) -> Self {
        Self::Generation(format!("certificate: {err}"))
    }
}

impl From<rsa::Error> for KeyError {
    fn from(err: rsa::Error) -> Self {
        Self::Generation(format!("rsa: {err}"))
    }
}

/// Errors from claim validation and token signing.
#[derive(thiserror::Error, Debug)]
pub enum TokenError {
    /// `sub` is absent or empty
    #[error("token subject is missing")]
    MissingRequiredClaim,

    /// Current time is after `exp`
    #[error("token has expired")]
    ExpiredToken,

    /// Current time is before `iat`
    #[error("token was issued in the future")]
    IssuedInFuture,

    /// A registered claim is present with the wrong JSON type
    #[error("invalid claim '{claim}': {message}")]
    InvalidClaim {
        /// Claim name
        claim: String,
        /// What was wrong with it
        message: String,
    },

    /// The JWS could not be produced
    #[error("signing failed: {0}")]
    Signing(String),
}

impl TokenError {
    /// Create an invalid claim error.
    #[must_use]
    pub fn invalid_claim(claim: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidClaim { claim: claim.into(), message: message.into() }
    }

    /// Returns true if the claims themselves were rejected, as opposed to the signer failing.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        !matches!(self, Self::Signing(_))
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Signing(err.to_string())
    }
}

/// Errors from the client registry and the client-credentials exchange.
#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    /// A client with this id is already registered
    #[error("duplicate client registration: {0}")]
    DuplicateClient(String),

    /// No client with this id is registered
    #[error("client does not exist: {0}")]
    UnknownClient(String),

    /// The supplied secret does not match the registered one
    #[error("client secret is wrong")]
    InvalidSecret,

    /// Only `client_credentials` is accepted
    #[error("invalid grant type: {0}")]
    UnsupportedGrantType(String),

    /// Minting the access token failed
    #[error("JWT generation: {0}")]
    Token(#[from] TokenError),
}

impl RegistryError {
    /// Returns true if the caller failed to authenticate (unknown id, bad secret, bad grant).
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::UnknownClient(_) | Self::InvalidSecret | Self::UnsupportedGrantType(_))
    }
}

/// Errors decoding an HTTP request body into a core request type.
#[derive(thiserror::Error, Debug)]
pub enum RequestError {
    /// A required form or JSON field was absent
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    /// A field was present but had the wrong type
    #[error("field '{field}' must be {expected}")]
    InvalidField {
        /// Field name
        field: &'static str,
        /// Expected type description
        expected: &'static str,
    },

    /// The body could not be parsed at all
    #[error("invalid body: {0}")]
    InvalidBody(String),
}

/// Errors from the outbound HTTP client used by test helpers.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// HTTP transport error (connection, DNS, TLS, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Middleware error
    #[error("Middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    /// JSON parsing error
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The server answered with a status the operation does not expect
    #[error("Unexpected status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body or message
        message: String,
    },
}

impl ClientError {
    /// Create an unexpected status error.
    #[must_use]
    pub fn unexpected_status(status: u16, message: impl Into<String>) -> Self {
        Self::UnexpectedStatus { status, message: message.into() }
    }

    /// HTTP status code, if the server answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for key operations.
pub type KeyResult<T> = Result<T, KeyError>;

/// Result type alias for token operations.
pub type TokenResult<T> = Result<T, TokenError>;

/// Result type alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type alias for outbound client operations.
pub type ClientResult<T> = Result<T, ClientError>;
