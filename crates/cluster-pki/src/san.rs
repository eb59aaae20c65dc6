//! Subject Alternative Name extraction and comparison.

use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use tracing::{debug, info, trace};
use x509_parser::extensions::GeneralName;
use x509_parser::prelude::*;

use crate::subject::Subject;
use crate::types::CertAndKey;
use crate::validation::certificate_der;

/// Result of reading the SANs out of a stored certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SanParse {
    /// The certificate was readable; these are its SANs.
    Parsed(BTreeSet<String>),
    /// The certificate could not be parsed.
    Unparsable,
}

impl SanParse {
    /// Returns `true` only if the parsed set equals `desired` as a set.
    #[must_use]
    pub fn matches(&self, desired: &BTreeSet<String>) -> bool {
        match self {
            Self::Parsed(current) => current == desired,
            Self::Unparsable => false,
        }
    }
}

/// Extracts the SANs from a PEM or DER encoded certificate.
///
/// DNS names, IP addresses, email addresses and URIs are returned as strings;
/// other name kinds are ignored.
#[must_use]
pub fn subject_alt_names(cert: &[u8]) -> SanParse {
    match parse_sans(cert) {
        Ok(sans) => SanParse::Parsed(sans),
        Err(e) => {
            debug!("Failed to parse existing certificate: {e}");
            SanParse::Unparsable
        }
    }
}

fn parse_sans(cert: &[u8]) -> Result<BTreeSet<String>, String> {
    let der = certificate_der(cert).map_err(|e| e.to_string())?;
    sans_from_der(&der)
}

fn sans_from_der(der: &[u8]) -> Result<BTreeSet<String>, String> {
    let (_, cert) = X509Certificate::from_der(der).map_err(|e| e.to_string())?;

    let mut sans = BTreeSet::new();
    if let Some(ext) = cert.subject_alternative_name().map_err(|e| e.to_string())? {
        for name in &ext.value.general_names {
            match name {
                GeneralName::DNSName(dns) => {
                    sans.insert((*dns).to_string());
                }
                GeneralName::IPAddress(bytes) => {
                    if let Some(ip) = ip_from_bytes(bytes) {
                        sans.insert(ip.to_string());
                    }
                }
                GeneralName::RFC822Name(email) => {
                    sans.insert((*email).to_string());
                }
                GeneralName::URI(uri) => {
                    sans.insert((*uri).to_string());
                }
                _ => {}
            }
        }
    }

    Ok(sans)
}

fn ip_from_bytes(bytes: &[u8]) -> Option<IpAddr> {
    match bytes.len() {
        4 => {
            let octets: [u8; 4] = bytes.try_into().ok()?;
            Some(IpAddr::V4(Ipv4Addr::from(octets)))
        }
        16 => {
            let octets: [u8; 16] = bytes.try_into().ok()?;
            Some(IpAddr::V6(Ipv6Addr::from(octets)))
        }
        _ => None,
    }
}

/// Checks whether the SANs of an existing certificate differ from the
/// desired subject. An unreadable certificate always counts as changed.
///
/// `pod_name` is only used for log messages.
#[must_use]
pub fn cert_subject_changed(cert_and_key: &CertAndKey, desired: &Subject, pod_name: &str) -> bool {
    let desired_sans = desired.subject_alt_names();
    let current = subject_alt_names(cert_and_key.cert());

    if current.matches(&desired_sans) {
        trace!("Alternate subjects match. No need to refresh cert for pod {pod_name}.");
        return false;
    }

    info!("Alternate subjects for pod {pod_name} differ");
    match &current {
        SanParse::Parsed(sans) => info!("Current alternate subjects: {sans:?}"),
        SanParse::Unparsable => info!("Current alternate subjects: unknown (certificate unreadable)"),
    }
    info!("Desired alternate subjects: {desired_sans:?}");
    true
}
