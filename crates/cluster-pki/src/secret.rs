//! Conversion between certificate maps and secret data.
//!
//! Node certificates are persisted as one secret per component, with four
//! base64 encoded entries per pod: `<pod>.crt`, `<pod>.key`, `<pod>.p12` and
//! `<pod>.password`. The key store entries are optional.

use std::collections::{BTreeMap, BTreeSet};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, info};

use crate::types::{CertAndKey, CertificateMap, KeyStore, PrivateKey};

/// Secret data: entry name to base64 encoded value.
pub type SecretData = BTreeMap<String, String>;

const CRT: &str = "crt";
const KEY: &str = "key";
const P12: &str = "p12";
const PASSWORD: &str = "password";

/// Encodes a certificate map as secret data.
#[must_use]
pub fn to_secret_data(certs: &CertificateMap) -> SecretData {
    let mut data = SecretData::new();

    for (pod, cert_and_key) in certs {
        data.insert(format!("{pod}.{CRT}"), STANDARD.encode(cert_and_key.cert()));
        data.insert(format!("{pod}.{KEY}"), STANDARD.encode(cert_and_key.key().pem()));

        if let Some(key_store) = cert_and_key.key_store() {
            data.insert(format!("{pod}.{P12}"), STANDARD.encode(key_store.bytes()));
            data.insert(format!("{pod}.{PASSWORD}"), STANDARD.encode(key_store.password()));
        }
    }

    data
}

/// Decodes secret data into a certificate map.
///
/// Pods with only one of certificate and key are left out, so the reconciler
/// issues a fresh certificate for them. The same happens to a pod with an
/// entry that is not valid base64 or a key store password that is not UTF-8.
/// A key store is attached only when both its bytes and password are present.
/// Unknown entries are ignored.
#[must_use]
pub fn from_secret_data(data: &SecretData) -> CertificateMap {
    let mut entries: BTreeMap<&str, BTreeMap<&str, Vec<u8>>> = BTreeMap::new();
    let mut corrupt: BTreeSet<&str> = BTreeSet::new();

    for (name, value) in data {
        let Some((pod, kind)) = name.rsplit_once('.') else {
            continue;
        };
        if ![CRT, KEY, P12, PASSWORD].contains(&kind) {
            continue;
        }

        match STANDARD.decode(value) {
            Ok(decoded) => {
                entries.entry(pod).or_default().insert(kind, decoded);
            }
            Err(e) => {
                info!("Entry {name} is not valid base64 ({e}), dropping stored certificate of pod {pod}");
                corrupt.insert(pod);
            }
        }
    }

    let mut certs = CertificateMap::new();
    for (pod, mut parts) in entries {
        if corrupt.contains(pod) {
            continue;
        }
        let (Some(cert), Some(key)) = (parts.remove(CRT), parts.remove(KEY)) else {
            debug!("Secret data for pod {pod} is incomplete, ignoring it");
            continue;
        };

        let mut cert_and_key = CertAndKey::new(PrivateKey::new(key), cert);
        if let (Some(bytes), Some(password)) = (parts.remove(P12), parts.remove(PASSWORD)) {
            let Ok(password) = String::from_utf8(password) else {
                info!("Key store password of pod {pod} is not UTF-8, dropping stored certificate");
                continue;
            };
            cert_and_key = cert_and_key.with_key_store(KeyStore::new(bytes, password));
        }

        certs.insert(pod.to_string(), cert_and_key);
    }

    certs
}
