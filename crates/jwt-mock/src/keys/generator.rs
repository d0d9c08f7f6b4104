//! Key pair generation.

use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rsa::RsaPrivateKey;

use super::SigningKey;
use crate::error::{KeyError, KeyResult};

/// Length of generated key identifiers.
pub const KEY_ID_LEN: usize = 16;

/// Smallest modulus the RS256 signer accepts.
pub const MIN_KEY_BITS: usize = 2048;

/// Largest modulus the `rsa` crate will load as a public key.
pub const MAX_KEY_BITS: usize = 4096;

/// Produces fresh signing keys.
pub trait KeyGenerator: Send + Sync {
    /// Generate a key pair of `bits` size with a fresh identifier.
    fn generate_key(&self, bits: usize) -> KeyResult<SigningKey>;
}

/// Generates RS256 keys from the OS random source.
#[derive(Debug, Clone, Copy, Default)]
pub struct RsaKeyGenerator;

impl RsaKeyGenerator {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl KeyGenerator for RsaKeyGenerator {
    fn generate_key(&self, bits: usize) -> KeyResult<SigningKey> {
        check_key_length(bits)?;

        let id = generate_key_id();
        let private = RsaPrivateKey::new(&mut OsRng, bits)?;

        tracing::debug!(kid = %id, bits, "Generated RSA key pair");

        SigningKey::rsa(id, private)
    }
}

/// Reject modulus sizes outside `MIN_KEY_BITS..=MAX_KEY_BITS`.
pub fn check_key_length(bits: usize) -> KeyResult<()> {
    if (MIN_KEY_BITS..=MAX_KEY_BITS).contains(&bits) {
        Ok(())
    } else {
        Err(KeyError::UnsupportedKeyLength { bits, min: MIN_KEY_BITS, max: MAX_KEY_BITS })
    }
}

/// Random alphanumeric key identifier.
#[must_use]
pub fn generate_key_id() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(KEY_ID_LEN).map(char::from).collect()
}
