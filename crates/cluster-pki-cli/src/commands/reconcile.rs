//! `reconcile` command implementation.

use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::{debug, info};

use cluster_pki::{
    from_secret_data, generate_broker_certs, generate_cruise_control_certs, to_secret_data,
    CaSettings, CertAction, CertificateMap, ClusterNaming, ManagedCa, Reconciled, SecretData,
};

use crate::ca_dir;
use crate::cli::ReconcileArgs;
use crate::error::CliError;
use crate::output::{OutputFormat, PodAction, ReconcileReport, SigningCa};
use crate::request::{Component, ReconcileRequest};

/// Reconcile command executor.
#[derive(Debug)]
pub struct ReconcileCommand {
    cluster_domain: String,
}

impl ReconcileCommand {
    /// Create a new reconcile command.
    #[must_use]
    pub fn new(cluster_domain: impl Into<String>) -> Self {
        Self {
            cluster_domain: cluster_domain.into(),
        }
    }

    /// Execute the reconcile command.
    ///
    /// # Errors
    ///
    /// Returns an error if an input cannot be read, signing fails, or the
    /// output cannot be written.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &ReconcileArgs,
    ) -> Result<(), CliError> {
        let report = self.reconcile(args)?;
        format.write(writer, &report)
    }

    /// Run one reconciliation and persist its secret data.
    ///
    /// # Errors
    ///
    /// See [`ReconcileCommand::execute`].
    pub fn reconcile(&self, args: &ReconcileArgs) -> Result<ReconcileReport, CliError> {
        let request = ReconcileRequest::load(&args.request)?;
        let naming = ClusterNaming::new(&request.cluster, &request.namespace)
            .with_cluster_domain(&self.cluster_domain);

        let settings = CaSettings::cluster_ca(&naming)
            .with_validity(request.validity_days, request.renewal_days);
        let ca = ManagedCa::new(settings, ca_dir::load_authority(&args.ca)?)
            .with_renewal_type(request.renewal_type);

        let existing = args.existing.as_deref().map(load_existing).transpose()?.flatten();

        let reconciled = match request.component {
            Component::Kafka => generate_broker_certs(
                &ca,
                &naming,
                existing,
                &request.nodes,
                &request.external_addresses,
                request.maintenance_window_open,
            )?,
            Component::CruiseControl => generate_cruise_control_certs(
                &ca,
                &naming,
                existing,
                &request.nodes,
                request.maintenance_window_open,
            )?,
        };

        let written_to = match &args.out {
            Some(out) => {
                write_secret_data(out, &to_secret_data(&reconciled.certs))?;
                Some(out.display().to_string())
            }
            None => None,
        };

        let settings = ca.settings();
        let signing_ca = SigningCa {
            name: settings.display_name.clone(),
            cert_secret: settings.cert_secret_name.clone(),
            key_secret: settings.key_secret_name.clone(),
        };

        Ok(report(&reconciled, signing_ca, written_to))
    }
}

/// Reads the secret data of the previous reconciliation. A missing file
/// means there is none yet.
fn load_existing(path: &Path) -> Result<Option<CertificateMap>, CliError> {
    if !path.exists() {
        debug!("No existing secret data at {}", path.display());
        return Ok(None);
    }

    let raw = fs::read_to_string(path)?;
    let data: SecretData = serde_json::from_str(&raw)
        .map_err(|e| CliError::Request(format!("{}: {e}", path.display())))?;
    Ok(Some(from_secret_data(&data)))
}

/// Writes the secret data next to `path` first and renames it into place, so
/// a failed write leaves the previous data untouched.
fn write_secret_data(path: &Path, data: &SecretData) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    info!("Wrote secret data for {} entries to {}", data.len(), path.display());
    Ok(())
}

fn report(reconciled: &Reconciled, ca: SigningCa, written_to: Option<String>) -> ReconcileReport {
    let pods = reconciled
        .actions
        .iter()
        .map(|(pod, action)| {
            let (name, reasons) = match action {
                CertAction::Reused => ("reused", Vec::new()),
                CertAction::Issued => ("issued", Vec::new()),
                CertAction::Renewed => ("renewed", Vec::new()),
                CertAction::Regenerated(reasons) => {
                    ("regenerated", reasons.iter().map(ToString::to_string).collect())
                }
            };
            PodAction {
                pod: pod.clone(),
                action: name.to_string(),
                reasons,
            }
        })
        .collect();

    ReconcileReport {
        ca,
        pods,
        written_to,
    }
}
