//! Certificate validity helpers.

use chrono::{DateTime, Duration, Utc};
use x509_parser::prelude::*;

use crate::error::{Error, Result};

/// Returns the DER bytes of a PEM or DER encoded certificate.
///
/// # Errors
///
/// Returns an error if the PEM envelope cannot be decoded.
pub fn certificate_der(cert: &[u8]) -> Result<Vec<u8>> {
    if cert.starts_with(b"-----BEGIN") {
        let (_, pem) = x509_parser::pem::parse_x509_pem(cert)
            .map_err(|e| Error::Parse(format!("failed to decode PEM: {e}")))?;
        Ok(pem.contents)
    } else {
        Ok(cert.to_vec())
    }
}

/// Returns the end of the validity period of a PEM or DER certificate.
///
/// # Errors
///
/// Returns an error if the certificate cannot be parsed.
pub fn not_after(cert: &[u8]) -> Result<DateTime<Utc>> {
    let der = certificate_der(cert)?;
    let (_, parsed) = X509Certificate::from_der(&der)
        .map_err(|e| Error::Parse(format!("failed to parse certificate: {e}")))?;

    DateTime::from_timestamp(parsed.validity().not_after.timestamp(), 0)
        .ok_or_else(|| Error::Parse("invalid not_after timestamp".into()))
}

/// Returns the subject common name of a PEM or DER certificate.
///
/// # Errors
///
/// Returns an error if the certificate cannot be parsed or has no CN.
pub fn common_name(cert: &[u8]) -> Result<String> {
    let der = certificate_der(cert)?;
    let (_, parsed) = X509Certificate::from_der(&der)
        .map_err(|e| Error::Parse(format!("failed to parse certificate: {e}")))?;

    parsed
        .subject()
        .iter_common_name()
        .next()
        .ok_or_else(|| Error::Parse("common name not found".into()))?
        .as_str()
        .map(String::from)
        .map_err(|e| Error::Parse(format!("failed to parse CN: {e}")))
}

/// Checks whether the certificate is within `renewal_days` of its expiry at `now`.
///
/// A renewal threshold reaching back past the representable time range
/// counts as expiring.
///
/// # Errors
///
/// Returns an error if the certificate cannot be parsed.
pub fn is_expiring_at(cert: &[u8], renewal_days: u32, now: DateTime<Utc>) -> Result<bool> {
    let expires = not_after(cert)?;
    Ok(expires
        .checked_sub_signed(Duration::days(i64::from(renewal_days)))
        .is_none_or(|threshold| now > threshold))
}
