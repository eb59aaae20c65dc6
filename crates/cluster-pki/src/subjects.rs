//! Per-service subject builders.
//!
//! Each builder returns a function value mapping a [`NodeRef`] to the
//! [`Subject`] its certificate must carry. The functions are pure and can be
//! called repeatedly and concurrently.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::naming::ClusterNaming;
use crate::subject::Subject;
use crate::types::NodeRef;

/// Organization name written into every node certificate subject.
pub const ORGANIZATION_NAME: &str = "cluster-operator";

/// Externally configured listener addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalAddresses {
    /// Bootstrap addresses shared by all brokers.
    #[serde(default)]
    pub bootstrap: BTreeSet<String>,
    /// Per-node addresses keyed by node ID.
    #[serde(default)]
    pub per_node: BTreeMap<i32, BTreeSet<String>>,
}

impl ExternalAddresses {
    /// Returns `true` when no external address is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bootstrap.is_empty() && self.per_node.values().all(BTreeSet::is_empty)
    }
}

/// Subject function for broker and controller nodes.
///
/// Controller-only nodes never get SANs for the external listeners, so
/// listener changes don't roll them.
pub fn broker_subject_fn<'a>(
    naming: &'a ClusterNaming,
    external: &'a ExternalAddresses,
) -> impl Fn(&NodeRef) -> Subject + 'a {
    move |node| {
        let brokers_service = naming.brokers_service_name();

        let mut subject = Subject::builder(naming.kafka_component_name())
            .organization(ORGANIZATION_NAME)
            .dns_names(naming.all_service_dns_names(&naming.bootstrap_service_name()))
            .dns_names(naming.all_service_dns_names(&brokers_service))
            .dns(naming.pod_dns_name(&brokers_service, &node.pod_name))
            .dns(naming.pod_dns_name_without_cluster_domain(&brokers_service, &node.pod_name));

        if node.broker {
            subject = subject.addresses(&external.bootstrap);

            if let Some(addresses) = external.per_node.get(&node.node_id) {
                subject = subject.addresses(addresses);
            }
        }

        subject.build()
    }
}

/// Subject function for Cruise Control.
pub fn cruise_control_subject_fn(naming: &ClusterNaming) -> impl Fn(&NodeRef) -> Subject + '_ {
    move |_node| {
        let service = naming.cruise_control_service_name();

        Subject::builder(service.clone())
            .organization(ORGANIZATION_NAME)
            .dns_names(naming.all_service_dns_names(&service))
            .dns("localhost")
            .build()
    }
}
