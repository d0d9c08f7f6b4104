//! Token minting.
//!
//! [`sign`] validates a claim set and produces a compact JWS whose header
//! carries the signing key's `kid`, so verifiers can pick the matching entry
//! from the published key set.

pub mod claims;

use chrono::{DateTime, Utc};
use jsonwebtoken::Header;

pub use claims::{Claims, RequiredClaims};

use crate::error::TokenResult;
use crate::keys::SigningKey;

/// Validate `claims` and sign them with `key`.
pub fn sign(claims: &Claims, key: &SigningKey) -> TokenResult<String> {
    sign_at(claims, key, Utc::now())
}

/// Validate `claims` against `now` and sign them with `key`.
pub fn sign_at(claims: &Claims, key: &SigningKey, now: DateTime<Utc>) -> TokenResult<String> {
    claims.validate_at(now)?;

    let mut header = Header::new(key.algorithm());
    header.kid = Some(key.id().to_owned());

    let token = jsonwebtoken::encode(&header, claims, key.encoding_key())?;

    tracing::debug!(kid = %key.id(), claims = claims.len(), "Signed token");

    Ok(token)
}
