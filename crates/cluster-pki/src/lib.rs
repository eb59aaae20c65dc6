//! Node certificate management for streaming cluster operators.
//!
//! Keeps every cluster node (brokers, controllers, Cruise Control) supplied
//! with a TLS certificate signed by the cluster CA, while touching as few
//! certificates as possible: a changed certificate restarts the pod.
//!
//! # Overview
//!
//! - [`subjects`] computes the desired [`Subject`] of each node
//! - [`reconcile`] decides per node whether to reuse, regenerate or issue
//! - [`san`] compares stored certificates against the desired SANs
//! - [`prune`] removes superseded CA certificates after a key replacement
//! - [`anchor`] is the CA seen by the reconciler ([`TrustAnchor`])
//!
//! # Example
//!
//! ```
//! use cluster_pki::{
//!     generate_broker_certs, CaSettings, CertificateAuthority, ClusterNaming,
//!     ExternalAddresses, ManagedCa, NodeRef,
//! };
//!
//! let naming = ClusterNaming::new("my-cluster", "kafka");
//! let ca = ManagedCa::new(
//!     CaSettings::cluster_ca(&naming),
//!     CertificateAuthority::new("Cluster CA").unwrap(),
//! );
//!
//! let nodes = vec![NodeRef::broker("my-cluster-brokers", 0)];
//! let first = generate_broker_certs(&ca, &naming, None, &nodes, &ExternalAddresses::default(), true)
//!     .unwrap();
//!
//! // Nothing changed: the stored certificate is reused.
//! let second = generate_broker_certs(&ca, &naming, Some(first.certs.clone()), &nodes, &ExternalAddresses::default(), true)
//!     .unwrap();
//! assert_eq!(first.certs, second.certs);
//! ```

#![forbid(unsafe_code)]

pub mod anchor;
pub mod ca;
pub mod error;
pub mod naming;
pub mod prune;
pub mod reconcile;
pub mod san;
pub mod secret;
pub mod subject;
pub mod subjects;
pub mod types;
pub mod validation;

pub use anchor::{CaSettings, ManagedCa, RenewalType, TrustAnchor};
pub use ca::CertificateAuthority;
pub use error::{Error, Result};
pub use naming::ClusterNaming;
pub use prune::{
    is_old_ca_cert_entry, maybe_delete_old_certs, old_ca_cert_entry_name, CaCertStore, CA_CERT_ENTRY,
};
pub use reconcile::{
    generate_broker_certs, generate_cruise_control_certs, maybe_copy_or_generate_certs,
    reconcile_with_report, CertAction, Reconciled, RegenerationReason,
};
pub use san::{cert_subject_changed, subject_alt_names, SanParse};
pub use secret::{from_secret_data, to_secret_data, SecretData};
pub use subject::Subject;
pub use subjects::{broker_subject_fn, cruise_control_subject_fn, ExternalAddresses};
pub use types::{CertAndKey, CertificateMap, KeyStore, NodeRef, PrivateKey};
