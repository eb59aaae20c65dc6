//! Static naming rules for cluster resources and their DNS names.

use serde::{Deserialize, Serialize};

/// Cluster domain used when none is configured.
pub const DEFAULT_CLUSTER_DOMAIN: &str = "cluster.local";

/// Names of the resources belonging to one cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterNaming {
    cluster_name: String,
    namespace: String,
    cluster_domain: String,
}

impl ClusterNaming {
    /// Creates naming rules for `cluster_name` in `namespace` using the default cluster domain.
    #[must_use]
    pub fn new(cluster_name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            namespace: namespace.into(),
            cluster_domain: DEFAULT_CLUSTER_DOMAIN.to_string(),
        }
    }

    /// Overrides the cluster domain.
    #[must_use]
    pub fn with_cluster_domain(mut self, cluster_domain: impl Into<String>) -> Self {
        self.cluster_domain = cluster_domain.into();
        self
    }

    /// Returns the cluster name.
    #[must_use]
    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    /// Returns the namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the cluster domain.
    #[must_use]
    pub fn cluster_domain(&self) -> &str {
        &self.cluster_domain
    }

    /// `<cluster>-kafka`
    #[must_use]
    pub fn kafka_component_name(&self) -> String {
        format!("{}-kafka", self.cluster_name)
    }

    /// `<cluster>-kafka-bootstrap`
    #[must_use]
    pub fn bootstrap_service_name(&self) -> String {
        format!("{}-kafka-bootstrap", self.cluster_name)
    }

    /// `<cluster>-kafka-brokers`
    #[must_use]
    pub fn brokers_service_name(&self) -> String {
        format!("{}-kafka-brokers", self.cluster_name)
    }

    /// `<cluster>-cruise-control`
    #[must_use]
    pub fn cruise_control_service_name(&self) -> String {
        format!("{}-cruise-control", self.cluster_name)
    }

    /// Secret holding the public cluster CA certificates.
    #[must_use]
    pub fn cluster_ca_cert_secret_name(&self) -> String {
        format!("{}-cluster-ca-cert", self.cluster_name)
    }

    /// Secret holding the cluster CA private key.
    #[must_use]
    pub fn cluster_ca_key_secret_name(&self) -> String {
        format!("{}-cluster-ca", self.cluster_name)
    }

    /// `<service>.<namespace>.svc`
    #[must_use]
    pub fn service_dns_name_without_cluster_domain(&self, service: &str) -> String {
        format!("{service}.{}.svc", self.namespace)
    }

    /// `<service>.<namespace>.svc.<cluster-domain>`
    #[must_use]
    pub fn service_dns_name(&self, service: &str) -> String {
        format!("{service}.{}.svc.{}", self.namespace, self.cluster_domain)
    }

    /// Every name a service is reachable under from inside the cluster:
    /// `<service>`, `<service>.<namespace>`, `<service>.<namespace>.svc` and
    /// the fully qualified name.
    #[must_use]
    pub fn all_service_dns_names(&self, service: &str) -> Vec<String> {
        vec![
            service.to_string(),
            format!("{service}.{}", self.namespace),
            self.service_dns_name_without_cluster_domain(service),
            self.service_dns_name(service),
        ]
    }

    /// `<pod>.<service>.<namespace>.svc`
    #[must_use]
    pub fn pod_dns_name_without_cluster_domain(&self, service: &str, pod_name: &str) -> String {
        format!("{pod_name}.{}", self.service_dns_name_without_cluster_domain(service))
    }

    /// `<pod>.<service>.<namespace>.svc.<cluster-domain>`
    #[must_use]
    pub fn pod_dns_name(&self, service: &str, pod_name: &str) -> String {
        format!("{pod_name}.{}", self.service_dns_name(service))
    }
}
