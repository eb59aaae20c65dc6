//! Pruning of superseded CA certificates.
//!
//! When the CA key is replaced, the previous CA certificate is kept in the CA
//! certificate store under a timestamped name so clients keep trusting
//! certificates signed by the old key for a while. Once the transition is
//! over those entries are removed here.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// CA certificate store: entry name to certificate bytes.
pub type CaCertStore = BTreeMap<String, Vec<u8>>;

/// Entry holding the current CA certificate.
pub const CA_CERT_ENTRY: &str = "ca.crt";

/// Names of old CA certificates: `ca-YYYY-MM-DDTHH-MM-SSZ.crt`.
///
/// Kept byte for byte, including the unescaped `.`, so that entries written by
/// earlier releases keep matching.
pub const OLD_CA_CERT_PATTERN: &str = r"^ca-\d{4}-\d{2}-\d{2}T\d{2}-\d{2}-\d{2}Z.crt$";

static OLD_CA_CERT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(OLD_CA_CERT_PATTERN).unwrap_or_else(|_| unreachable!()));

/// Returns `true` if `name` is the name of an old CA certificate.
#[must_use]
pub fn is_old_ca_cert_entry(name: &str) -> bool {
    OLD_CA_CERT_REGEX.is_match(name)
}

/// Name under which the CA certificate replaced at `replaced_at` is kept.
#[must_use]
pub fn old_ca_cert_entry_name(replaced_at: DateTime<Utc>) -> String {
    replaced_at.format("ca-%Y-%m-%dT%H-%M-%SZ.crt").to_string()
}

/// Removes every old CA certificate from `store`.
///
/// Does nothing unless `self_managed` is set: a user-supplied CA's material
/// is never modified. There is no time-based check here; callers invoke this
/// once the trust overlap period is over.
///
/// Returns `true` if at least one entry was removed.
pub fn maybe_delete_old_certs(store: &mut CaCertStore, self_managed: bool) -> bool {
    if !self_managed {
        return false;
    }

    let before = store.len();
    store.retain(|name, _| {
        let old = is_old_ca_cert_entry(name);
        if old {
            debug!("Removing old CA certificate {name}");
        }
        !old
    });

    store.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_case::test_case;

    #[test_case("ca-2023-05-01T10-15-30Z.crt", true ; "old certificate")]
    #[test_case("ca-2023-05-01T10-15-30Zxcrt", true ; "any char before crt")]
    #[test_case("ca.crt", false ; "current certificate")]
    #[test_case("ca.p12", false ; "key store")]
    #[test_case("ca.password", false ; "key store password")]
    #[test_case("ca-2023-5-1T10-15-30Z.crt", false ; "unpadded date")]
    #[test_case("ca-2023-05-01T10:15:30Z.crt", false ; "colons")]
    #[test_case("xca-2023-05-01T10-15-30Z.crt", false ; "prefix")]
    #[test_case("ca-2023-05-01T10-15-30Z.crt.bak", false ; "suffix")]
    fn matches_old_cert_names(name: &str, expected: bool) {
        assert_eq!(is_old_ca_cert_entry(name), expected);
    }

    #[test]
    fn entry_name_round_trips_through_pattern() {
        let at = Utc.with_ymd_and_hms(2024, 2, 29, 23, 5, 9).unwrap();
        let name = old_ca_cert_entry_name(at);
        assert_eq!(name, "ca-2024-02-29T23-05-09Z.crt");
        assert!(is_old_ca_cert_entry(&name));
    }

    fn store() -> CaCertStore {
        BTreeMap::from([
            (CA_CERT_ENTRY.to_string(), b"current".to_vec()),
            ("ca.p12".to_string(), b"p12".to_vec()),
            ("ca-2023-05-01T10-15-30Z.crt".to_string(), b"old-1".to_vec()),
            ("ca-2024-01-02T03-04-05Z.crt".to_string(), b"old-2".to_vec()),
        ])
    }

    #[test]
    fn user_supplied_ca_is_left_alone() {
        let mut data = store();
        assert!(!maybe_delete_old_certs(&mut data, false));
        assert_eq!(data, store());
    }

    #[test]
    fn self_managed_ca_loses_exactly_the_old_entries() {
        let mut data = store();
        assert!(maybe_delete_old_certs(&mut data, true));
        assert_eq!(
            data.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["ca.crt", "ca.p12"]
        );
        assert_eq!(data[CA_CERT_ENTRY], b"current");
    }

    #[test]
    fn nothing_matching_reports_nothing_removed() {
        let mut data = BTreeMap::from([(CA_CERT_ENTRY.to_string(), b"current".to_vec())]);
        assert!(!maybe_delete_old_certs(&mut data, true));
        assert_eq!(data.len(), 1);
    }
}
