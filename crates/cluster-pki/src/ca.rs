//! Certificate Authority signing primitive.

use chrono::{DateTime, Datelike, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use rcgen::{
    BasicConstraints, CertificateParams, DnType, ExtendedKeyUsagePurpose, Ia5String, IsCa,
    KeyPair, KeyUsagePurpose, SanType,
};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::subject::Subject;
use crate::types::{CertAndKey, KeyStore, PrivateKey};
use crate::validation::{certificate_der, common_name};

/// Length of generated key store passwords.
const KEY_STORE_PASSWORD_LENGTH: usize = 32;

/// Last year a certificate may expire in.
const MAX_NOT_AFTER_YEAR: i32 = 9999;

/// Certificate Authority that signs node certificates.
pub struct CertificateAuthority {
    /// CA certificate, PEM.
    cert_pem: String,
    /// CA certificate, DER.
    cert_der: Vec<u8>,
    /// Subject common name of the CA certificate.
    name: String,
    /// rcgen key pair for signing.
    key_pair: KeyPair,
    /// Issuer parameters reconstructed from the CA certificate.
    issuer_params: CertificateParams,
}

impl CertificateAuthority {
    /// Creates a new Certificate Authority with a self-signed root certificate
    /// valid for ten years.
    ///
    /// # Errors
    ///
    /// Returns an error if certificate generation fails.
    pub fn new(name: &str) -> Result<Self> {
        Self::with_validity(name, 3650)
    }

    /// Creates a new self-signed Certificate Authority valid for `validity_days`.
    ///
    /// # Errors
    ///
    /// Returns an error if certificate generation fails.
    pub fn with_validity(name: &str, validity_days: u32) -> Result<Self> {
        info!("Creating new Certificate Authority: {}", name);

        if name.is_empty() {
            return Err(Error::Validation("CA name cannot be empty".into()));
        }

        let key_pair = KeyPair::generate()
            .map_err(|e| Error::Generation(format!("failed to generate key pair: {e}")))?;

        let mut params = CertificateParams::default();
        params.distinguished_name.push(DnType::CommonName, name);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];

        (params.not_before, params.not_after) = validity_window(validity_days)?;

        let cert = params
            .clone()
            .self_signed(&key_pair)
            .map_err(|e| Error::Generation(format!("failed to generate root certificate: {e}")))?;

        debug!("CA root certificate created successfully");

        Ok(Self {
            cert_pem: cert.pem(),
            cert_der: cert.der().to_vec(),
            name: name.to_string(),
            key_pair,
            issuer_params: params,
        })
    }

    /// Loads a Certificate Authority from its PEM certificate and key.
    ///
    /// # Errors
    ///
    /// Returns an error if the certificate or key cannot be parsed.
    pub fn from_pem(cert_pem: &str, key_pem: &str) -> Result<Self> {
        let key_pair = KeyPair::from_pem(key_pem)
            .map_err(|e| Error::Parse(format!("failed to parse CA key: {e}")))?;
        let issuer_params = CertificateParams::from_ca_cert_pem(cert_pem)
            .map_err(|e| Error::Parse(format!("failed to parse CA certificate: {e}")))?;
        let cert_der = certificate_der(cert_pem.as_bytes())?;
        let name = common_name(&cert_der)?;

        Ok(Self {
            cert_pem: cert_pem.to_string(),
            cert_der,
            name,
            key_pair,
            issuer_params,
        })
    }

    /// Returns the CA certificate in PEM format.
    #[must_use]
    pub fn cert_pem(&self) -> &str {
        &self.cert_pem
    }

    /// Returns the CA private key in PEM format.
    #[must_use]
    pub fn key(&self) -> PrivateKey {
        PrivateKey::new(self.key_pair.serialize_pem().into_bytes())
    }

    /// Returns the CA common name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Issues a server and client certificate for `subject`, signed by this CA.
    ///
    /// The returned bundle carries a PKCS#12 key store with the certificate,
    /// its key and the CA certificate.
    ///
    /// # Errors
    ///
    /// Returns an error if a SAN is invalid or signing fails.
    pub fn issue(&self, subject: &Subject, validity_days: u32) -> Result<CertAndKey> {
        if subject.common_name().is_empty() {
            return Err(Error::Validation("subject common name cannot be empty".into()));
        }
        debug!("Issuing certificate for: {}", subject.common_name());

        let cert_key_pair = KeyPair::generate()
            .map_err(|e| Error::Generation(format!("failed to generate key pair: {e}")))?;

        let mut params = CertificateParams::default();
        params
            .distinguished_name
            .push(DnType::CommonName, subject.common_name());
        if let Some(organization) = subject.organization() {
            params
                .distinguished_name
                .push(DnType::OrganizationName, organization);
        }
        params.is_ca = IsCa::NoCa;
        params.extended_key_usages = vec![
            ExtendedKeyUsagePurpose::ServerAuth,
            ExtendedKeyUsagePurpose::ClientAuth,
        ];
        params.key_usages = vec![
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::KeyEncipherment,
        ];

        (params.not_before, params.not_after) = validity_window(validity_days)?;

        params.subject_alt_names = convert_sans(subject)?;

        let issuer_cert = self
            .issuer_params
            .clone()
            .self_signed(&self.key_pair)
            .map_err(|e| Error::Generation(format!("failed to create issuer cert: {e}")))?;

        let cert = params
            .signed_by(&cert_key_pair, &issuer_cert, &self.key_pair)
            .map_err(|e| Error::Generation(format!("failed to sign certificate: {e}")))?;

        let key_store = self.key_store(cert.der(), &cert_key_pair.serialize_der(), subject.common_name())?;

        Ok(
            CertAndKey::new(
                PrivateKey::new(cert_key_pair.serialize_pem().into_bytes()),
                cert.pem().into_bytes(),
            )
            .with_key_store(key_store),
        )
    }

    fn key_store(&self, cert_der: &[u8], key_der: &[u8], alias: &str) -> Result<KeyStore> {
        let password = generate_password();
        let pfx = p12::PFX::new(cert_der, key_der, Some(self.cert_der.as_slice()), &password, alias)
            .ok_or_else(|| Error::Generation("failed to build PKCS#12 key store".into()))?;
        Ok(KeyStore::new(pfx.to_der(), password))
    }
}

impl std::fmt::Debug for CertificateAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateAuthority")
            .field("name", &self.name)
            .field("key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(KEY_STORE_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

/// Converts the subject's DNS names and IP addresses to rcgen `SanTypes`.
fn convert_sans(subject: &Subject) -> Result<Vec<SanType>> {
    let dns = subject.dns_names().iter().map(|name| {
        Ia5String::try_from(name.clone())
            .map(SanType::DnsName)
            .map_err(|e| Error::San(format!("invalid DNS name '{name}': {e}")))
    });
    let ips = subject
        .ip_addresses()
        .iter()
        .map(|ip| Ok(SanType::IpAddress(*ip)));

    dns.chain(ips).collect()
}

/// Validity period starting an hour in the past and lasting `validity_days`.
///
/// The end must be encodable as an X.509 time, i.e. no later than year 9999.
fn validity_window(validity_days: u32) -> Result<(time::OffsetDateTime, time::OffsetDateTime)> {
    if validity_days == 0 {
        return Err(Error::Validation("validity_days must be greater than 0".into()));
    }

    let now = Utc::now();
    let not_before = now
        .checked_sub_signed(Duration::hours(1))
        .ok_or_else(|| Error::Generation("invalid start of validity".into()))?;
    let not_after = now
        .checked_add_signed(Duration::days(i64::from(validity_days)))
        .filter(|end| end.year() <= MAX_NOT_AFTER_YEAR)
        .ok_or_else(|| Error::Validation(format!("validity of {validity_days} days is out of range")))?;

    Ok((to_rcgen_time(not_before)?, to_rcgen_time(not_after)?))
}

/// Converts a chrono `DateTime` to rcgen `OffsetDateTime`.
fn to_rcgen_time(dt: DateTime<Utc>) -> Result<time::OffsetDateTime> {
    time::OffsetDateTime::from_unix_timestamp(dt.timestamp())
        .map_err(|e| Error::Generation(format!("invalid timestamp: {e}")))
}
