//! Trust anchor: the CA as seen by the node certificate reconciler.
//!
//! The reconciler only needs four things from a CA: whether a CA-wide
//! renewal is in progress, the renewal signal of this cycle, whether a given
//! certificate is close to expiry, and a way to sign a new certificate.
//! [`TrustAnchor`] captures exactly that. [`ManagedCa`] implements it once for
//! every CA kind; the differences between kinds live in [`CaSettings`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ca::CertificateAuthority;
use crate::error::Result;
use crate::naming::ClusterNaming;
use crate::prune::{maybe_delete_old_certs, CaCertStore, CA_CERT_ENTRY};
use crate::subject::Subject;
use crate::types::CertAndKey;
use crate::validation::is_expiring_at;

/// Default validity of issued certificates, in days.
pub const DEFAULT_CERTS_VALIDITY_DAYS: u32 = 365;

/// Default number of days before expiry when certificates are renewed.
pub const DEFAULT_CERTS_RENEWAL_DAYS: u32 = 30;

/// Why (and whether) the CA-wide signing material changed this cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenewalType {
    /// Nothing changed.
    #[default]
    NoRenewal,
    /// A renewal is due but postponed until the maintenance window opens.
    Postponed,
    /// The CA was just created; certificates are added.
    Created,
    /// The CA certificate was renewed with the same key.
    CertRenewed,
    /// The CA key was replaced.
    KeyReplaced,
}

impl RenewalType {
    /// Whether every node certificate must be regenerated.
    #[must_use]
    pub const fn is_ca_renewal(self) -> bool {
        matches!(self, Self::CertRenewed | Self::KeyReplaced)
    }
}

impl std::fmt::Display for RenewalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NoRenewal => "no-renewal",
            Self::Postponed => "postponed",
            Self::Created => "created",
            Self::CertRenewed => "cert-renewed",
            Self::KeyReplaced => "key-replaced",
        };
        f.write_str(s)
    }
}

/// What the node certificate reconciler needs from a CA.
pub trait TrustAnchor {
    /// The renewal signal for this cycle.
    fn renewal_type(&self) -> RenewalType;

    /// Whether a CA-wide renewal is in progress.
    fn ca_renewal_in_progress(&self) -> bool {
        self.renewal_type().is_ca_renewal()
    }

    /// Whether `cert` is within the renewal threshold of its expiry.
    fn is_expiring(&self, cert: &[u8]) -> bool;

    /// Signs a new certificate for `subject`.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    fn sign(&self, subject: &Subject) -> Result<CertAndKey>;
}

/// Per-kind configuration of a managed CA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaSettings {
    /// Human readable name, e.g. `Cluster CA`.
    pub display_name: String,
    /// Prefix used in logs and resource names, e.g. `cluster-ca`.
    pub name_prefix: String,
    /// Secret holding the CA certificates.
    pub cert_secret_name: String,
    /// Secret holding the CA key.
    pub key_secret_name: String,
    /// Validity of issued certificates, in days.
    pub validity_days: u32,
    /// Days before expiry when certificates are renewed.
    pub renewal_days: u32,
    /// Whether the operator generated the CA. `false` for user-supplied CAs.
    pub generate_ca: bool,
}

impl CaSettings {
    /// Settings of the cluster CA of the given cluster.
    #[must_use]
    pub fn cluster_ca(naming: &ClusterNaming) -> Self {
        Self {
            display_name: "Cluster CA".to_string(),
            name_prefix: "cluster-ca".to_string(),
            cert_secret_name: naming.cluster_ca_cert_secret_name(),
            key_secret_name: naming.cluster_ca_key_secret_name(),
            validity_days: DEFAULT_CERTS_VALIDITY_DAYS,
            renewal_days: DEFAULT_CERTS_RENEWAL_DAYS,
            generate_ca: true,
        }
    }

    /// Sets validity and renewal days.
    #[must_use]
    pub const fn with_validity(mut self, validity_days: u32, renewal_days: u32) -> Self {
        self.validity_days = validity_days;
        self.renewal_days = renewal_days;
        self
    }

    /// Marks the CA as user supplied.
    #[must_use]
    pub const fn user_supplied(mut self) -> Self {
        self.generate_ca = false;
        self
    }
}

/// A CA composed of its settings, signing authority, renewal signal and
/// certificate store.
#[derive(Debug)]
pub struct ManagedCa {
    settings: CaSettings,
    authority: CertificateAuthority,
    renewal_type: RenewalType,
    ca_cert_data: CaCertStore,
    ca_certs_removed: bool,
}

impl ManagedCa {
    /// Creates a managed CA. The CA certificate store is seeded with the
    /// authority's current certificate.
    #[must_use]
    pub fn new(settings: CaSettings, authority: CertificateAuthority) -> Self {
        let mut ca_cert_data = CaCertStore::new();
        ca_cert_data.insert(CA_CERT_ENTRY.to_string(), authority.cert_pem().as_bytes().to_vec());

        Self {
            settings,
            authority,
            renewal_type: RenewalType::NoRenewal,
            ca_cert_data,
            ca_certs_removed: false,
        }
    }

    /// Sets the renewal signal decided by the CA renewal logic.
    #[must_use]
    pub const fn with_renewal_type(mut self, renewal_type: RenewalType) -> Self {
        self.renewal_type = renewal_type;
        self
    }

    /// Replaces the CA certificate store, e.g. with data read from the cert secret.
    #[must_use]
    pub fn with_ca_cert_data(mut self, ca_cert_data: CaCertStore) -> Self {
        self.ca_cert_data = ca_cert_data;
        self
    }

    /// Returns the settings.
    #[must_use]
    pub const fn settings(&self) -> &CaSettings {
        &self.settings
    }

    /// Returns the signing authority.
    #[must_use]
    pub const fn authority(&self) -> &CertificateAuthority {
        &self.authority
    }

    /// Returns the CA certificate store.
    #[must_use]
    pub const fn ca_cert_data(&self) -> &CaCertStore {
        &self.ca_cert_data
    }

    /// Whether old CA certificates were removed by [`ManagedCa::maybe_delete_old_certs`].
    #[must_use]
    pub const fn ca_certs_removed(&self) -> bool {
        self.ca_certs_removed
    }

    /// Removes old CA certificates (`ca-YYYY-MM-DDTHH-MM-SSZ.crt`) from the
    /// CA certificate store. User-supplied CAs are never touched.
    pub fn maybe_delete_old_certs(&mut self) {
        if maybe_delete_old_certs(&mut self.ca_cert_data, self.settings.generate_ca) {
            info!("{}: Old CA certificates removed", self);
            self.ca_certs_removed = true;
        }
    }

    /// [`TrustAnchor::is_expiring`] evaluated at `now`.
    #[must_use]
    pub fn is_expiring_at(&self, cert: &[u8], now: DateTime<Utc>) -> bool {
        match is_expiring_at(cert, self.settings.renewal_days, now) {
            Ok(expiring) => expiring,
            Err(e) => {
                debug!("{}: Cannot determine certificate expiry: {e}", self);
                false
            }
        }
    }
}

impl std::fmt::Display for ManagedCa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.settings.name_prefix)
    }
}

impl TrustAnchor for ManagedCa {
    fn renewal_type(&self) -> RenewalType {
        self.renewal_type
    }

    fn is_expiring(&self, cert: &[u8]) -> bool {
        self.is_expiring_at(cert, Utc::now())
    }

    fn sign(&self, subject: &Subject) -> Result<CertAndKey> {
        self.authority.issue(subject, self.settings.validity_days)
    }
}
