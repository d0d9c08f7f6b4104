//! Self-signed certificates for key set entries.
//!
//! Certificates here exist only so the published JWK can carry `x5c` and
//! `x5t` fields. Nothing validates the chain.

use std::time::Duration;

use rcgen::{
    CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose, IsCa, KeyPair,
    KeyUsagePurpose, PKCS_RSA_SHA256, SerialNumber,
};
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use time::OffsetDateTime;

use super::{KeyMaterial, SigningKey};
use crate::error::{KeyError, KeyResult};

/// Organization name on every certificate.
pub const ORG_NAME: &str = "JWT Mock";

/// Builds the root and leaf certificates for a key set.
pub trait CertificateIssuer: Send + Sync {
    /// Build a self-signed root whose validity window starts now.
    fn create_root(&self) -> KeyResult<RootCertificate>;

    /// Build a certificate binding `key`'s public half, sharing the root's validity window.
    fn create_leaf(&self, root: &RootCertificate, key: &SigningKey) -> KeyResult<Certificate>;
}

/// A DER-encoded certificate and its validity window.
#[derive(Debug, Clone)]
pub struct Certificate {
    der: Vec<u8>,
    not_before: OffsetDateTime,
    not_after: OffsetDateTime,
}

impl Certificate {
    /// Raw DER bytes.
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    #[must_use]
    pub const fn not_before(&self) -> OffsetDateTime {
        self.not_before
    }

    #[must_use]
    pub const fn not_after(&self) -> OffsetDateTime {
        self.not_after
    }
}

/// Root certificate plus the template leaves are issued from.
pub struct RootCertificate {
    cert: Certificate,
    params: CertificateParams,
}

impl RootCertificate {
    #[must_use]
    pub const fn certificate(&self) -> &Certificate {
        &self.cert
    }
}

impl std::fmt::Debug for RootCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootCertificate").field("cert", &self.cert).finish()
    }
}

/// Issues certificates valid for a fixed lifetime.
#[derive(Debug, Clone, Copy)]
pub struct CertificateGenerator {
    lifetime: Duration,
}

impl CertificateGenerator {
    #[must_use]
    pub const fn new(lifetime: Duration) -> Self {
        Self { lifetime }
    }

    #[must_use]
    pub const fn lifetime(&self) -> Duration {
        self.lifetime
    }
}

impl CertificateIssuer for CertificateGenerator {
    fn create_root(&self) -> KeyResult<RootCertificate> {
        let not_before = OffsetDateTime::now_utc();
        let not_after = not_before
            .checked_add(
                time::Duration::try_from(self.lifetime)
                    .map_err(|e| KeyError::generation(format!("certificate lifetime: {e}")))?,
            )
            .ok_or_else(|| KeyError::generation("certificate lifetime out of range"))?;

        let mut distinguished_name = DistinguishedName::new();
        distinguished_name.push(DnType::OrganizationName, ORG_NAME);

        let mut params = CertificateParams::default();
        params.distinguished_name = distinguished_name;
        params.serial_number = Some(random_serial());
        params.not_before = not_before;
        params.not_after = not_after;
        params.key_usages = vec![KeyUsagePurpose::KeyEncipherment, KeyUsagePurpose::DigitalSignature];
        params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
        params.is_ca = IsCa::ExplicitNoCa;

        // The root is signed by a throwaway key; only its template outlives this call.
        let root_key = KeyPair::generate()?;
        let cert = params.clone().self_signed(&root_key)?;

        Ok(RootCertificate {
            cert: Certificate { der: cert.der().to_vec(), not_before, not_after },
            params,
        })
    }

    fn create_leaf(&self, root: &RootCertificate, key: &SigningKey) -> KeyResult<Certificate> {
        let private = match key.material() {
            KeyMaterial::Rsa { private, .. } => private,
            other => {
                return Err(KeyError::KeyTypeMismatch { expected: "RSA", actual: other.key_type() });
            }
        };

        let pem = private
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| KeyError::encoding(format!("pkcs8: {e}")))?;
        let key_pair = KeyPair::from_pem_and_sign_algo(&pem, &PKCS_RSA_SHA256)?;

        let mut params = root.params.clone();
        params.serial_number = Some(random_serial());
        let cert = params.self_signed(&key_pair)?;

        Ok(Certificate {
            der: cert.der().to_vec(),
            not_before: root.cert.not_before,
            not_after: root.cert.not_after,
        })
    }
}

fn random_serial() -> SerialNumber {
    let serial = rand::random::<u64>() & 0x7fff_ffff_ffff_ffff;
    SerialNumber::from_slice(&serial.to_be_bytes())
}
