//! Active signing key and key set, with atomic rotation.
//!
//! The store holds an immutable [`KeySnapshot`] behind an [`ArcSwap`]. Readers
//! load the current snapshot without locking; [`KeyStore::rotate`] builds a
//! complete replacement off to the side and publishes it with a single pointer
//! swap, so a reader sees either the old (key, key set) pair or the new one and
//! never a mix. Rotations are serialized with a mutex that readers never touch.

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;

use super::cert::{CertificateGenerator, CertificateIssuer};
use super::generator::{KeyGenerator, RsaKeyGenerator};
use super::jwks::{Jwks, build_key_set};
use super::SigningKey;
use crate::config::Config;
use crate::error::KeyResult;

/// One generation of key material. Never mutated after construction.
#[derive(Debug)]
pub struct KeySnapshot {
    key: Arc<SigningKey>,
    jwks: Arc<Jwks>,
    jwks_json: Arc<str>,
}

impl KeySnapshot {
    /// Pair a key with its key set, pre-rendering the JSON document.
    pub fn new(key: SigningKey, jwks: Jwks) -> KeyResult<Self> {
        let jwks_json = serde_json::to_string(&jwks)?;
        Ok(Self { key: Arc::new(key), jwks: Arc::new(jwks), jwks_json: Arc::from(jwks_json) })
    }

    #[must_use]
    pub fn signing_key(&self) -> Arc<SigningKey> {
        Arc::clone(&self.key)
    }

    #[must_use]
    pub fn jwks(&self) -> Arc<Jwks> {
        Arc::clone(&self.jwks)
    }

    /// Serialized key set; identical bytes for the life of the snapshot.
    #[must_use]
    pub fn jwks_json(&self) -> Arc<str> {
        Arc::clone(&self.jwks_json)
    }

    #[must_use]
    pub fn kid(&self) -> &str {
        self.key.id()
    }
}

/// Runs key generation, certification and key-set assembly in sequence.
pub struct KeySetGenerator {
    keys: Box<dyn KeyGenerator>,
    certs: Box<dyn CertificateIssuer>,
    key_length: usize,
}

impl KeySetGenerator {
    #[must_use]
    pub fn new(
        keys: impl KeyGenerator + 'static,
        certs: impl CertificateIssuer + 'static,
        key_length: usize,
    ) -> Self {
        Self { keys: Box::new(keys), certs: Box::new(certs), key_length }
    }

    /// RSA keys of the configured length, certified for the configured lifetime.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            RsaKeyGenerator::new(),
            CertificateGenerator::new(config.certificate_lifetime()),
            config.key_length,
        )
    }

    /// Produce a fresh, self-consistent snapshot.
    pub fn generate(&self) -> KeyResult<KeySnapshot> {
        let key = self.keys.generate_key(self.key_length)?;
        let root = self.certs.create_root()?;
        let leaf = self.certs.create_leaf(&root, &key)?;
        let jwks = build_key_set(&key, &leaf)?;

        KeySnapshot::new(key, jwks)
    }

    #[must_use]
    pub const fn key_length(&self) -> usize {
        self.key_length
    }
}

impl std::fmt::Debug for KeySetGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySetGenerator").field("key_length", &self.key_length).finish()
    }
}

/// Owns the active signing key and its published key set.
pub struct KeyStore {
    generator: KeySetGenerator,
    current: ArcSwap<KeySnapshot>,
    rotation: Mutex<()>,
}

impl KeyStore {
    /// Build a store with its first key already generated.
    ///
    /// Fails if any step of the pipeline fails; no partially initialized store
    /// is ever returned.
    pub fn new(generator: KeySetGenerator) -> KeyResult<Self> {
        let initial = generator.generate()?;

        tracing::info!(kid = %initial.kid(), "Initialized key store");

        Ok(Self { generator, current: ArcSwap::from_pointee(initial), rotation: Mutex::new(()) })
    }

    /// Replace the active key and key set with a freshly generated pair.
    ///
    /// On failure the previous pair stays active and the error is returned.
    pub fn rotate(&self) -> KeyResult<Arc<KeySnapshot>> {
        let _guard = self.rotation.lock().unwrap_or_else(PoisonError::into_inner);

        let previous = self.current.load().kid().to_owned();
        let next = match self.generator.generate() {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                tracing::warn!(kid = %previous, error = %e, "Key rotation failed, keeping current key");
                return Err(e);
            }
        };

        self.current.store(Arc::clone(&next));

        tracing::info!(previous = %previous, kid = %next.kid(), "Rotated signing key");

        Ok(next)
    }

    /// Current (key, key set) pair from a single generation.
    #[must_use]
    pub fn snapshot(&self) -> Arc<KeySnapshot> {
        self.current.load_full()
    }

    /// Current signing key.
    #[must_use]
    pub fn signing_key(&self) -> Arc<SigningKey> {
        self.current.load().signing_key()
    }

    /// Current key set.
    #[must_use]
    pub fn jwks(&self) -> Arc<Jwks> {
        self.current.load().jwks()
    }
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStore")
            .field("kid", &self.current.load().kid())
            .field("generator", &self.generator)
            .finish()
    }
}
