//! Public key set (JWKS) assembly.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey};
use rsa::traits::PublicKeyParts;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};

use super::{Certificate, KeyMaterial, SigningKey};
use crate::error::{KeyError, KeyResult};

/// Keys in the set are only used for signing.
pub const SIGNING_USAGE: &str = "sig";

/// A single published RSA verification key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    #[serde(rename = "use")]
    pub key_use: String,
    pub kid: String,
    pub alg: Algorithm,
    /// RSA modulus (base64url)
    pub n: String,
    /// RSA exponent (base64url)
    pub e: String,
    /// Certificate chain, standard base64 DER
    pub x5c: Vec<String>,
    /// Hex SHA-1 of the leaf certificate DER. Kept for existing JWK consumers.
    pub x5t: String,
    #[serde(rename = "x5t#S256")]
    pub x5t_s256: String,
}

impl Jwk {
    /// Decoding key for verifying tokens signed by the matching private key.
    pub fn decoding_key(&self) -> Result<DecodingKey, jsonwebtoken::errors::Error> {
        DecodingKey::from_rsa_components(&self.n, &self.e)
    }
}

/// A published key set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

impl Jwks {
    /// Find the entry with the given `kid`.
    #[must_use]
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid == kid)
    }
}

/// Build a one-entry key set for `key` certified by `leaf`.
///
/// Deterministic for the same inputs.
pub fn build_key_set(key: &SigningKey, leaf: &Certificate) -> KeyResult<Jwks> {
    let public = match key.material() {
        KeyMaterial::Rsa { public, .. } => public,
        other => {
            return Err(KeyError::KeyTypeMismatch { expected: "RSA", actual: other.key_type() });
        }
    };

    let jwk = Jwk {
        kty: key.material().key_type().to_string(),
        key_use: SIGNING_USAGE.to_string(),
        kid: key.id().to_string(),
        alg: key.algorithm(),
        n: URL_SAFE_NO_PAD.encode(public.n().to_bytes_be()),
        e: URL_SAFE_NO_PAD.encode(public.e().to_bytes_be()),
        x5c: vec![STANDARD.encode(leaf.der())],
        x5t: sha1_thumbprint(leaf.der()),
        x5t_s256: URL_SAFE_NO_PAD.encode(Sha256::digest(leaf.der())),
    };

    Ok(Jwks { keys: vec![jwk] })
}

/// Hex-encoded SHA-1 digest of certificate bytes.
#[must_use]
pub fn sha1_thumbprint(der: &[u8]) -> String {
    hex::encode(Sha1::digest(der))
}
