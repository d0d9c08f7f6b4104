//! Signing key material and its lifecycle.
//!
//! The pipeline runs leaves first:
//! - [`generator`] produces a fresh key pair with a random `kid`
//! - [`cert`] wraps the public half in a self-signed certificate
//! - [`jwks`] turns key + certificate into the published key set
//! - [`store`] owns the active (key, key set) pair and rotates it atomically

pub mod cert;
pub mod generator;
pub mod jwks;
pub mod store;

use jsonwebtoken::{Algorithm, EncodingKey};
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::error::{KeyError, KeyResult};

pub use cert::{Certificate, CertificateGenerator, CertificateIssuer, RootCertificate};
pub use generator::{KeyGenerator, RsaKeyGenerator};
pub use jwks::{Jwk, Jwks};
pub use store::{KeySetGenerator, KeySnapshot, KeyStore};

/// Key material held by a [`SigningKey`].
#[derive(Clone)]
pub enum KeyMaterial {
    /// RSA key pair; the only type that can be published in a key set.
    Rsa {
        private: Box<RsaPrivateKey>,
        public: RsaPublicKey,
    },
    /// Shared secret for HMAC algorithms.
    Secret(Vec<u8>),
}

impl KeyMaterial {
    /// JWK `kty` name for this material.
    #[must_use]
    pub const fn key_type(&self) -> &'static str {
        match self {
            Self::Rsa { .. } => "RSA",
            Self::Secret(_) => "oct",
        }
    }
}

/// A key used to sign tokens.
///
/// The private half is only reachable through the signing path; it is never
/// serialized and is redacted from `Debug` output.
#[derive(Clone)]
pub struct SigningKey {
    id: String,
    algorithm: Algorithm,
    material: KeyMaterial,
    encoding_key: EncodingKey,
}

impl SigningKey {
    /// Wrap an RSA private key. The algorithm is always RS256.
    pub fn rsa(id: impl Into<String>, private: RsaPrivateKey) -> KeyResult<Self> {
        let der = private.to_pkcs1_der().map_err(|e| KeyError::encoding(format!("pkcs1: {e}")))?;
        let encoding_key = EncodingKey::from_rsa_der(der.as_bytes());
        let public = private.to_public_key();

        Ok(Self {
            id: id.into(),
            algorithm: Algorithm::RS256,
            material: KeyMaterial::Rsa { private: Box::new(private), public },
            encoding_key,
        })
    }

    /// Wrap an HMAC secret. Such keys can sign but cannot be certified or published.
    #[must_use]
    pub fn secret(id: impl Into<String>, secret: &[u8]) -> Self {
        Self {
            id: id.into(),
            algorithm: Algorithm::HS256,
            material: KeyMaterial::Secret(secret.to_vec()),
            encoding_key: EncodingKey::from_secret(secret),
        }
    }

    /// Opaque key identifier, published as `kid`.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Signature algorithm this key signs with.
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Key material, for building certificates and key sets.
    #[must_use]
    pub const fn material(&self) -> &KeyMaterial {
        &self.material
    }

    /// RSA public half, if this is an RSA key.
    #[must_use]
    pub const fn rsa_public_key(&self) -> Option<&RsaPublicKey> {
        match &self.material {
            KeyMaterial::Rsa { public, .. } => Some(public),
            KeyMaterial::Secret(_) => None,
        }
    }

    pub(crate) const fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("id", &self.id)
            .field("algorithm", &self.algorithm)
            .field("kty", &self.material.key_type())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_key_debug_redacts_material() {
        let key = SigningKey::secret("k1", b"super-secret-value");
        let debug = format!("{key:?}");
        assert!(debug.contains("k1"));
        assert!(debug.contains("HS256"));
        assert!(!debug.contains("super-secret-value"));
    }

    #[test]
    fn test_secret_key_has_no_public_half() {
        let key = SigningKey::secret("k1", b"secret");
        assert!(key.rsa_public_key().is_none());
        assert_eq!(key.material().key_type(), "oct");
    }
}
