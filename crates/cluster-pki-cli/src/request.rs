//! Reconcile request documents.

use std::path::Path;

use serde::{Deserialize, Serialize};

use cluster_pki::anchor::{DEFAULT_CERTS_RENEWAL_DAYS, DEFAULT_CERTS_VALIDITY_DAYS};
use cluster_pki::{ExternalAddresses, NodeRef, RenewalType};

use crate::error::CliError;

/// Component whose node certificates are reconciled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Component {
    /// Broker and controller nodes.
    #[default]
    Kafka,
    /// The Cruise Control pod.
    CruiseControl,
}

/// Input of one reconciliation, as written by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileRequest {
    /// Cluster name.
    pub cluster: String,
    /// Namespace of the cluster.
    pub namespace: String,
    /// Component to reconcile.
    #[serde(default)]
    pub component: Component,
    /// Current node roster.
    #[serde(default)]
    pub nodes: Vec<NodeRef>,
    /// External listener addresses.
    #[serde(default)]
    pub external_addresses: ExternalAddresses,
    /// Whether expiring certificates may be renewed now.
    #[serde(default)]
    pub maintenance_window_open: bool,
    /// CA renewal signal of this cycle.
    #[serde(default)]
    pub renewal_type: RenewalType,
    /// Validity of issued certificates, in days.
    #[serde(default = "default_validity_days")]
    pub validity_days: u32,
    /// Days before expiry when certificates are renewed.
    #[serde(default = "default_renewal_days")]
    pub renewal_days: u32,
}

/// Longest accepted certificate validity, in days.
pub const MAX_VALIDITY_DAYS: u32 = 36_500;

const fn default_validity_days() -> u32 {
    DEFAULT_CERTS_VALIDITY_DAYS
}

const fn default_renewal_days() -> u32 {
    DEFAULT_CERTS_RENEWAL_DAYS
}

impl ReconcileRequest {
    /// Reads a request from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid request.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let raw = std::fs::read_to_string(path)?;
        let request: Self = serde_json::from_str(&raw)
            .map_err(|e| CliError::Request(format!("{}: {e}", path.display())))?;
        request.validate()?;
        Ok(request)
    }

    fn validate(&self) -> Result<(), CliError> {
        if self.cluster.is_empty() || self.namespace.is_empty() {
            return Err(CliError::Request("cluster and namespace must be set".into()));
        }
        if self.validity_days == 0 || self.validity_days > MAX_VALIDITY_DAYS {
            return Err(CliError::Request(format!(
                "validity_days must be between 1 and {MAX_VALIDITY_DAYS}, got {}",
                self.validity_days
            )));
        }
        if self.renewal_days >= self.validity_days {
            return Err(CliError::Request(format!(
                "renewal_days ({}) must be less than validity_days ({})",
                self.renewal_days, self.validity_days
            )));
        }
        if let Some(duplicate) = first_duplicate_pod(&self.nodes) {
            return Err(CliError::Request(format!("pod {duplicate} listed twice")));
        }
        Ok(())
    }
}

fn first_duplicate_pod(nodes: &[NodeRef]) -> Option<&str> {
    let mut seen = std::collections::BTreeSet::new();
    nodes
        .iter()
        .map(|node| node.pod_name.as_str())
        .find(|pod| !seen.insert(*pod))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<ReconcileRequest, CliError> {
        let request: ReconcileRequest =
            serde_json::from_str(json).map_err(|e| CliError::Request(e.to_string()))?;
        request.validate()?;
        Ok(request)
    }

    #[test]
    fn minimal_request_uses_defaults() {
        let request = parse(r#"{"cluster": "my-cluster", "namespace": "kafka"}"#).unwrap();

        assert_eq!(request.component, Component::Kafka);
        assert!(request.nodes.is_empty());
        assert!(request.external_addresses.is_empty());
        assert!(!request.maintenance_window_open);
        assert_eq!(request.renewal_type, RenewalType::NoRenewal);
        assert_eq!(request.validity_days, DEFAULT_CERTS_VALIDITY_DAYS);
    }

    #[test]
    fn full_request() {
        let request = parse(
            r#"{
                "cluster": "my-cluster",
                "namespace": "kafka",
                "component": "kafka",
                "nodes": [
                    {"pod_name": "my-cluster-pool-0", "node_id": 0, "controller": true, "broker": false},
                    {"pod_name": "my-cluster-pool-1", "node_id": 1}
                ],
                "external_addresses": {
                    "bootstrap": ["10.0.0.5"],
                    "per_node": {"1": ["broker-1.example.com"]}
                },
                "maintenance_window_open": true,
                "renewal_type": "key-replaced"
            }"#,
        )
        .unwrap();

        assert!(request.nodes[0].controller);
        assert!(!request.nodes[0].broker);
        assert!(request.nodes[1].broker);
        assert!(request.external_addresses.per_node[&1].contains("broker-1.example.com"));
        assert_eq!(request.renewal_type, RenewalType::KeyReplaced);
    }

    #[test]
    fn cruise_control_component() {
        let request =
            parse(r#"{"cluster": "c", "namespace": "n", "component": "cruise-control"}"#).unwrap();
        assert_eq!(request.component, Component::CruiseControl);
    }

    #[test]
    fn duplicate_pods_are_rejected() {
        let result = parse(
            r#"{"cluster": "c", "namespace": "n", "nodes": [
                {"pod_name": "c-pool-0", "node_id": 0},
                {"pod_name": "c-pool-0", "node_id": 1}
            ]}"#,
        );
        assert!(matches!(result, Err(CliError::Request(msg)) if msg.contains("c-pool-0")));
    }

    #[test]
    fn validity_is_bounded() {
        let result = parse(r#"{"cluster": "c", "namespace": "n", "validity_days": 100000000}"#);
        assert!(matches!(result, Err(CliError::Request(msg)) if msg.contains("validity_days")));

        let result = parse(r#"{"cluster": "c", "namespace": "n", "validity_days": 0, "renewal_days": 0}"#);
        assert!(matches!(result, Err(CliError::Request(_))));
    }

    #[test]
    fn renewal_window_must_fit_validity() {
        let result = parse(r#"{"cluster": "c", "namespace": "n", "validity_days": 10, "renewal_days": 10}"#);
        assert!(matches!(result, Err(CliError::Request(_))));
    }
}
