//! Core types shared by the reconciler, the trust anchor and the pruner.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Identifies one cluster member.
///
/// Supplied fresh on every reconcile from the live node roster. The pod name
/// is the stable identity used as the certificate map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeRef {
    /// Pod name, e.g. `my-cluster-pool-a-0`.
    pub pod_name: String,
    /// Numeric node ID.
    pub node_id: i32,
    /// Whether the node has the controller role.
    #[serde(default)]
    pub controller: bool,
    /// Whether the node has the broker role.
    #[serde(default = "default_broker")]
    pub broker: bool,
}

const fn default_broker() -> bool {
    true
}

impl NodeRef {
    /// Creates a node reference.
    #[must_use]
    pub fn new(pod_name: impl Into<String>, node_id: i32, controller: bool, broker: bool) -> Self {
        Self {
            pod_name: pod_name.into(),
            node_id,
            controller,
            broker,
        }
    }

    /// Creates a broker-only node whose pod name is derived from the pool name.
    #[must_use]
    pub fn broker(pool_name: &str, node_id: i32) -> Self {
        Self::new(Self::pod_name_for(pool_name, node_id), node_id, false, true)
    }

    /// Creates a controller-only node whose pod name is derived from the pool name.
    #[must_use]
    pub fn controller(pool_name: &str, node_id: i32) -> Self {
        Self::new(Self::pod_name_for(pool_name, node_id), node_id, true, false)
    }

    /// Returns the pod name of node `node_id` in the given pool.
    #[must_use]
    pub fn pod_name_for(pool_name: &str, node_id: i32) -> String {
        format!("{pool_name}-{node_id}")
    }
}

impl std::fmt::Display for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (id: {}, controller: {}, broker: {})",
            self.pod_name, self.node_id, self.controller, self.broker
        )
    }
}

/// A PEM-encoded private key with secure memory handling.
#[derive(Zeroize, ZeroizeOnDrop, Clone, PartialEq, Eq)]
pub struct PrivateKey {
    pem: Vec<u8>,
}

impl PrivateKey {
    /// Creates a private key from PEM-encoded bytes.
    #[must_use]
    pub const fn new(pem: Vec<u8>) -> Self {
        Self { pem }
    }

    /// Returns the PEM-encoded private key bytes.
    #[must_use]
    pub fn pem(&self) -> &[u8] {
        &self.pem
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("pem", &"[REDACTED]")
            .finish()
    }
}

/// PKCS#12 key store holding the certificate and its key.
#[derive(Zeroize, ZeroizeOnDrop, Clone, PartialEq, Eq)]
pub struct KeyStore {
    bytes: Vec<u8>,
    password: String,
}

impl KeyStore {
    /// Creates a key store from its DER bytes and password.
    #[must_use]
    pub const fn new(bytes: Vec<u8>, password: String) -> Self {
        Self { bytes, password }
    }

    /// Returns the DER-encoded PKCS#12 bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the key store password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStore")
            .field("len", &self.bytes.len())
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// An issued certificate together with its private key.
///
/// Opaque to the reconciler: reused bundles are moved into the output map
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertAndKey {
    key: PrivateKey,
    cert: Vec<u8>,
    key_store: Option<KeyStore>,
}

impl CertAndKey {
    /// Creates a bundle from PEM key and certificate bytes.
    #[must_use]
    pub const fn new(key: PrivateKey, cert: Vec<u8>) -> Self {
        Self {
            key,
            cert,
            key_store: None,
        }
    }

    /// Attaches a PKCS#12 key store.
    #[must_use]
    pub fn with_key_store(mut self, key_store: KeyStore) -> Self {
        self.key_store = Some(key_store);
        self
    }

    /// Returns the private key.
    #[must_use]
    pub const fn key(&self) -> &PrivateKey {
        &self.key
    }

    /// Returns the certificate bytes (PEM).
    #[must_use]
    pub fn cert(&self) -> &[u8] {
        &self.cert
    }

    /// Returns the key store, if one was produced.
    #[must_use]
    pub const fn key_store(&self) -> Option<&KeyStore> {
        self.key_store.as_ref()
    }
}

/// Certificates keyed by pod name.
pub type CertificateMap = BTreeMap<String, CertAndKey>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pod_name_is_pool_and_id() {
        assert_eq!(NodeRef::pod_name_for("my-cluster-brokers", 3), "my-cluster-brokers-3");
    }

    #[test]
    fn role_constructors() {
        let broker = NodeRef::broker("pool", 1);
        assert!(broker.broker);
        assert!(!broker.controller);
        assert_eq!(broker.pod_name, "pool-1");

        let controller = NodeRef::controller("pool", 2);
        assert!(controller.controller);
        assert!(!controller.broker);
    }

    #[test]
    fn node_ref_deserializes_with_broker_default() {
        let node: NodeRef =
            serde_json::from_str(r#"{"pod_name":"c-kafka-0","node_id":0}"#).unwrap();
        assert!(node.broker);
        assert!(!node.controller);
    }

    #[test]
    fn private_key_debug_redacted() {
        let key = PrivateKey::new(b"secret-key-material".to_vec());
        let debug = format!("{key:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("secret-key-material"));
    }

    #[test]
    fn key_store_debug_redacts_password() {
        let store = KeyStore::new(vec![1, 2, 3], "hunter2".into());
        let debug = format!("{store:?}");
        assert!(!debug.contains("hunter2"));
        assert_eq!(store.password(), "hunter2");
    }

    #[test]
    fn cert_and_key_accessors() {
        let bundle = CertAndKey::new(PrivateKey::new(b"key".to_vec()), b"cert".to_vec());
        assert_eq!(bundle.cert(), b"cert");
        assert_eq!(bundle.key().pem(), b"key");
        assert!(bundle.key_store().is_none());

        let bundle = bundle.with_key_store(KeyStore::new(vec![9], "pw".into()));
        assert_eq!(bundle.key_store().map(KeyStore::bytes), Some(&[9u8][..]));
    }
}
