//! End-to-end tests for node certificate reconciliation.
//!
//! These tests drive the public API the way an operator reconcile loop does:
//! certificates are issued, persisted as secret data, read back and
//! reconciled again.

use std::collections::{BTreeMap, BTreeSet};

use cluster_pki::{
    from_secret_data, generate_broker_certs, generate_cruise_control_certs, maybe_delete_old_certs,
    old_ca_cert_entry_name, subject_alt_names, to_secret_data, CaCertStore, CaSettings, CertAction,
    CertAndKey, CertificateAuthority, ClusterNaming, ExternalAddresses, ManagedCa, NodeRef,
    PrivateKey, RegenerationReason, RenewalType, SanParse,
};

fn naming() -> ClusterNaming {
    ClusterNaming::new("my-cluster", "kafka")
}

fn cluster_ca() -> ManagedCa {
    ManagedCa::new(
        CaSettings::cluster_ca(&naming()),
        CertificateAuthority::new("Cluster CA").unwrap(),
    )
}

fn sans(cert: &CertAndKey) -> BTreeSet<String> {
    match subject_alt_names(cert.cert()) {
        SanParse::Parsed(sans) => sans,
        SanParse::Unparsable => BTreeSet::new(),
    }
}

fn pool() -> Vec<NodeRef> {
    vec![
        NodeRef::controller("my-cluster-controllers", 0),
        NodeRef::controller("my-cluster-controllers", 1),
        NodeRef::broker("my-cluster-brokers", 2),
        NodeRef::broker("my-cluster-brokers", 3),
    ]
}

// ============================================================================
// Bootstrap
// ============================================================================

#[test]
fn broker_with_ip_and_dns_bootstrap_addresses() {
    let ca = cluster_ca();
    let nodes = vec![NodeRef::new("broker-0", 0, false, true)];
    let external = ExternalAddresses {
        bootstrap: BTreeSet::from(["10.0.0.5".to_string(), "kafka.example.com".to_string()]),
        per_node: BTreeMap::new(),
    };

    let result = generate_broker_certs(&ca, &naming(), None, &nodes, &external, false).unwrap();

    assert_eq!(result.certs.len(), 1);
    let sans = sans(&result.certs["broker-0"]);
    assert!(sans.contains("10.0.0.5"));
    assert!(sans.contains("kafka.example.com"));
    assert!(sans.contains("my-cluster-kafka-bootstrap.kafka.svc"));
    assert!(sans.contains("my-cluster-kafka-brokers.kafka.svc.cluster.local"));
    assert!(sans.contains("broker-0.my-cluster-kafka-brokers.kafka.svc"));
    assert!(sans.contains("broker-0.my-cluster-kafka-brokers.kafka.svc.cluster.local"));
    assert_eq!(result.actions["broker-0"], CertAction::Issued);
}

#[test]
fn controllers_never_carry_external_addresses() {
    let ca = cluster_ca();
    let external = ExternalAddresses {
        bootstrap: BTreeSet::from(["bootstrap.example.com".to_string()]),
        per_node: BTreeMap::from([
            (0, BTreeSet::from(["192.168.0.10".to_string()])),
            (2, BTreeSet::from(["broker-2.example.com".to_string()])),
        ]),
    };

    let result = generate_broker_certs(&ca, &naming(), None, &pool(), &external, true).unwrap();

    for controller in ["my-cluster-controllers-0", "my-cluster-controllers-1"] {
        let sans = sans(&result.certs[controller]);
        assert!(!sans.contains("bootstrap.example.com"));
        assert!(!sans.contains("192.168.0.10"));
        assert!(!sans.contains("broker-2.example.com"));
    }
    let broker = sans(&result.certs["my-cluster-brokers-2"]);
    assert!(broker.contains("bootstrap.example.com"));
    assert!(broker.contains("broker-2.example.com"));
}

// ============================================================================
// Steady state
// ============================================================================

#[test]
fn persisted_certificates_are_reused() {
    let ca = cluster_ca();
    let external = ExternalAddresses::default();

    let first = generate_broker_certs(&ca, &naming(), None, &pool(), &external, true).unwrap();
    let stored = to_secret_data(&first.certs);

    let existing = from_secret_data(&stored);
    let second = generate_broker_certs(&ca, &naming(), Some(existing), &pool(), &external, true).unwrap();

    assert_eq!(second.changed_pods().count(), 0);
    assert_eq!(to_secret_data(&second.certs), stored);
}

#[test]
fn external_listener_change_only_rolls_brokers() {
    let ca = cluster_ca();
    let first = generate_broker_certs(&ca, &naming(), None, &pool(), &ExternalAddresses::default(), true).unwrap();

    let external = ExternalAddresses {
        bootstrap: BTreeSet::from(["new-bootstrap.example.com".to_string()]),
        per_node: BTreeMap::new(),
    };
    let second = generate_broker_certs(&ca, &naming(), Some(first.certs.clone()), &pool(), &external, true).unwrap();

    assert_eq!(
        second.changed_pods().collect::<Vec<_>>(),
        vec!["my-cluster-brokers-2", "my-cluster-brokers-3"]
    );
    assert_eq!(
        second.actions["my-cluster-brokers-2"],
        CertAction::Regenerated(vec![RegenerationReason::SubjectChanged])
    );
    assert_eq!(
        second.certs["my-cluster-controllers-0"],
        first.certs["my-cluster-controllers-0"]
    );
}

#[test]
fn cluster_domain_change_rolls_everything() {
    let ca = cluster_ca();
    let external = ExternalAddresses::default();
    let first = generate_broker_certs(&ca, &naming(), None, &pool(), &external, true).unwrap();

    let moved = naming().with_cluster_domain("example.internal");
    let second = generate_broker_certs(&ca, &moved, Some(first.certs), &pool(), &external, false).unwrap();

    assert_eq!(second.changed_pods().count(), 4);
}

// ============================================================================
// CA renewal
// ============================================================================

#[test]
fn key_replacement_regenerates_all_certificates() {
    let external = ExternalAddresses::default();
    let first = generate_broker_certs(&cluster_ca(), &naming(), None, &pool(), &external, true).unwrap();

    let renewed = ManagedCa::new(
        CaSettings::cluster_ca(&naming()),
        CertificateAuthority::new("Cluster CA").unwrap(),
    )
    .with_renewal_type(RenewalType::KeyReplaced);
    let second = generate_broker_certs(&renewed, &naming(), Some(first.certs.clone()), &pool(), &external, false)
        .unwrap();

    for (pod, cert) in &second.certs {
        assert_ne!(cert, &first.certs[pod]);
        assert_eq!(second.actions[pod], CertAction::Renewed);
        assert_eq!(sans(cert), sans(&first.certs[pod]));
    }
}

#[test]
fn expiring_certificates_renew_only_inside_maintenance_window() {
    let ca = ManagedCa::new(
        CaSettings::cluster_ca(&naming()).with_validity(10, 30),
        CertificateAuthority::new("Cluster CA").unwrap(),
    );
    let external = ExternalAddresses::default();
    let first = generate_broker_certs(&ca, &naming(), None, &pool(), &external, true).unwrap();

    let outside = generate_broker_certs(&ca, &naming(), Some(first.certs.clone()), &pool(), &external, false)
        .unwrap();
    assert_eq!(outside.certs, first.certs);

    let inside = generate_broker_certs(&ca, &naming(), Some(first.certs), &pool(), &external, true).unwrap();
    assert!(inside
        .actions
        .values()
        .all(|action| *action == CertAction::Regenerated(vec![RegenerationReason::Expiring])));
}

#[test]
fn corrupted_stored_certificate_heals() {
    let ca = cluster_ca();
    let external = ExternalAddresses::default();
    let mut existing = generate_broker_certs(&ca, &naming(), None, &pool(), &external, true)
        .unwrap()
        .certs;
    existing.insert(
        "my-cluster-brokers-3".to_string(),
        CertAndKey::new(PrivateKey::new(b"key".to_vec()), b"-----BEGIN CERTIFICATE-----\nZm9v\n-----END CERTIFICATE-----\n".to_vec()),
    );

    let healed = generate_broker_certs(&ca, &naming(), Some(existing), &pool(), &external, false).unwrap();

    assert_eq!(healed.changed_pods().collect::<Vec<_>>(), vec!["my-cluster-brokers-3"]);
    assert!(matches!(
        subject_alt_names(healed.certs["my-cluster-brokers-3"].cert()),
        SanParse::Parsed(_)
    ));
}

// ============================================================================
// Cruise Control
// ============================================================================

#[test]
fn cruise_control_certificate() {
    let ca = cluster_ca();
    let nodes = vec![NodeRef::new("my-cluster-cruise-control", 0, false, false)];

    let result = generate_cruise_control_certs(&ca, &naming(), None, &nodes, true).unwrap();

    let sans = sans(&result.certs["my-cluster-cruise-control"]);
    assert!(sans.contains("localhost"));
    assert!(sans.contains("my-cluster-cruise-control.kafka.svc.cluster.local"));
}

// ============================================================================
// Old CA certificate pruning
// ============================================================================

#[test]
fn pruning_after_key_replacement() {
    let old_name = old_ca_cert_entry_name(chrono::Utc::now());
    let mut store = CaCertStore::from([
        ("ca.crt".to_string(), b"new".to_vec()),
        (old_name.clone(), b"old".to_vec()),
    ]);

    let untouched = store.clone();
    assert!(!maybe_delete_old_certs(&mut store, false));
    assert_eq!(store, untouched);

    assert!(maybe_delete_old_certs(&mut store, true));
    assert!(!store.contains_key(&old_name));
    assert!(store.contains_key("ca.crt"));
}
