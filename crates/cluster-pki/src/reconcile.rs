//! Node certificate reconciliation.
//!
//! For every node of the desired node set the reconciler decides whether the
//! previously issued certificate can be reused, must be regenerated, or has to
//! be issued for the first time. Reusing is the default: a changed
//! certificate restarts the pod.
//!
//! Decisions are made per node and do not depend on each other. A signing
//! failure for any node fails the whole call and nothing is returned, so the
//! caller never persists a mix of old and new material.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use crate::anchor::{RenewalType, TrustAnchor};
use crate::error::{Error, Result};
use crate::naming::ClusterNaming;
use crate::san::cert_subject_changed;
use crate::subject::Subject;
use crate::subjects::{broker_subject_fn, cruise_control_subject_fn, ExternalAddresses};
use crate::types::{CertAndKey, CertificateMap, NodeRef};

/// Why an existing certificate is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegenerationReason {
    /// The SANs of the existing certificate differ from the desired ones.
    SubjectChanged,
    /// The certificate is close to expiry and the maintenance window is open.
    Expiring,
    /// The trust anchor signalled that certificates are being added.
    CertificateAdded,
}

impl std::fmt::Display for RegenerationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::SubjectChanged => "DNS names changed",
            Self::Expiring => "certificate is expiring",
            Self::CertificateAdded => "certificate added",
        };
        f.write_str(s)
    }
}

/// What happened to one node's certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertAction {
    /// The existing certificate was kept unchanged.
    Reused,
    /// No certificate existed; a new one was issued.
    Issued,
    /// A CA-wide renewal is in progress; a new certificate was issued.
    Renewed,
    /// The existing certificate was replaced for the given reasons.
    Regenerated(Vec<RegenerationReason>),
}

impl CertAction {
    /// Whether the node's certificate changed, i.e. the pod needs a restart.
    #[must_use]
    pub const fn is_changed(&self) -> bool {
        !matches!(self, Self::Reused)
    }
}

impl std::fmt::Display for CertAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reused => f.write_str("reused"),
            Self::Issued => f.write_str("issued"),
            Self::Renewed => f.write_str("renewed (CA renewal)"),
            Self::Regenerated(reasons) => {
                let reasons: Vec<String> = reasons.iter().map(ToString::to_string).collect();
                write!(f, "regenerated ({})", reasons.join(", "))
            }
        }
    }
}

/// Certificates of one reconciliation together with the per-pod actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    /// Certificates keyed by pod name.
    pub certs: CertificateMap,
    /// What happened to each pod's certificate.
    pub actions: BTreeMap<String, CertAction>,
}

impl Reconciled {
    /// Pods whose certificate changed.
    pub fn changed_pods(&self) -> impl Iterator<Item = &str> {
        self.actions
            .iter()
            .filter(|(_, action)| action.is_changed())
            .map(|(pod, _)| pod.as_str())
    }
}

/// Reuses, regenerates or issues the certificate of every node.
///
/// `existing` holds the certificates stored by the previous reconciliation
/// (`None` if there are none yet). The returned map has exactly one entry per
/// node in `nodes`.
///
/// # Errors
///
/// Returns a validation error if two nodes share a pod name, otherwise the
/// first signing error; no partial result is returned.
pub fn maybe_copy_or_generate_certs<'a, A, I, F>(
    anchor: &A,
    nodes: I,
    subject_fn: F,
    existing: Option<CertificateMap>,
    maintenance_window_open: bool,
) -> Result<CertificateMap>
where
    A: TrustAnchor + ?Sized,
    I: IntoIterator<Item = &'a NodeRef>,
    F: Fn(&NodeRef) -> Subject,
{
    reconcile_with_report(anchor, nodes, subject_fn, existing, maintenance_window_open)
        .map(|reconciled| reconciled.certs)
}

/// Same as [`maybe_copy_or_generate_certs`], but also reports what happened
/// to every pod's certificate.
///
/// # Errors
///
/// Returns a validation error if two nodes share a pod name, otherwise the
/// first signing error; no partial result is returned.
pub fn reconcile_with_report<'a, A, I, F>(
    anchor: &A,
    nodes: I,
    subject_fn: F,
    existing: Option<CertificateMap>,
    maintenance_window_open: bool,
) -> Result<Reconciled>
where
    A: TrustAnchor + ?Sized,
    I: IntoIterator<Item = &'a NodeRef>,
    F: Fn(&NodeRef) -> Subject,
{
    let nodes: Vec<&NodeRef> = nodes.into_iter().collect();
    let mut pod_names = BTreeSet::new();
    if let Some(duplicate) = nodes.iter().find(|node| !pod_names.insert(node.pod_name.as_str())) {
        return Err(Error::Validation(format!("pod {} is listed more than once", duplicate.pod_name)));
    }

    let mut existing = existing.unwrap_or_default();
    let ca_renewal = anchor.ca_renewal_in_progress();
    let renewal_type = anchor.renewal_type();

    let mut certs = CertificateMap::new();
    let mut actions = BTreeMap::new();

    for node in nodes {
        let pod_name = &node.pod_name;
        let subject = subject_fn(node);

        let (cert_and_key, action) = match existing.remove(pod_name) {
            Some(current) if !ca_renewal => {
                debug!("Certificate for node {} already exists", node);

                let reasons = regeneration_reasons(
                    anchor,
                    &current,
                    &subject,
                    pod_name,
                    renewal_type,
                    maintenance_window_open,
                );

                if reasons.is_empty() {
                    (current, CertAction::Reused)
                } else {
                    let reasons_str: Vec<String> = reasons.iter().map(ToString::to_string).collect();
                    info!(
                        "Certificate for pod {} need to be regenerated because: {}",
                        pod_name,
                        reasons_str.join(", ")
                    );
                    (anchor.sign(&subject)?, CertAction::Regenerated(reasons))
                }
            }
            Some(_) => {
                debug!("Generating new certificate for node {} (CA renewal: {})", node, renewal_type);
                (anchor.sign(&subject)?, CertAction::Renewed)
            }
            None => {
                debug!("Generating new certificate for node {}", node);
                (anchor.sign(&subject)?, CertAction::Issued)
            }
        };

        certs.insert(pod_name.clone(), cert_and_key);
        actions.insert(pod_name.clone(), action);
    }

    Ok(Reconciled { certs, actions })
}

fn regeneration_reasons<A: TrustAnchor + ?Sized>(
    anchor: &A,
    current: &CertAndKey,
    subject: &Subject,
    pod_name: &str,
    renewal_type: RenewalType,
    maintenance_window_open: bool,
) -> Vec<RegenerationReason> {
    let mut reasons = Vec::with_capacity(3);

    if cert_subject_changed(current, subject, pod_name) {
        reasons.push(RegenerationReason::SubjectChanged);
    }

    if anchor.is_expiring(current.cert()) {
        if maintenance_window_open {
            reasons.push(RegenerationReason::Expiring);
        } else {
            debug!("Certificate for pod {pod_name} is expiring, waiting for the maintenance window");
        }
    }

    if renewal_type == RenewalType::Created {
        reasons.push(RegenerationReason::CertificateAdded);
    }

    reasons
}

/// Reconciles the certificates of broker and controller nodes.
///
/// # Errors
///
/// Returns the first signing error.
pub fn generate_broker_certs<A: TrustAnchor + ?Sized>(
    anchor: &A,
    naming: &ClusterNaming,
    existing: Option<CertificateMap>,
    nodes: &[NodeRef],
    external: &ExternalAddresses,
    maintenance_window_open: bool,
) -> Result<Reconciled> {
    debug!("Reconciling kafka broker certificates");
    reconcile_with_report(
        anchor,
        nodes,
        broker_subject_fn(naming, external),
        existing,
        maintenance_window_open,
    )
}

/// Reconciles the Cruise Control certificate.
///
/// # Errors
///
/// Returns the first signing error.
pub fn generate_cruise_control_certs<A: TrustAnchor + ?Sized>(
    anchor: &A,
    naming: &ClusterNaming,
    existing: Option<CertificateMap>,
    nodes: &[NodeRef],
    maintenance_window_open: bool,
) -> Result<Reconciled> {
    debug!("Reconciling Cruise Control certificates");
    reconcile_with_report(
        anchor,
        nodes,
        cruise_control_subject_fn(naming),
        existing,
        maintenance_window_open,
    )
}
