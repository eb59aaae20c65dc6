//! `init-ca` command implementation.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use tracing::info;

use cluster_pki::{old_ca_cert_entry_name, CertificateAuthority, CA_CERT_ENTRY};

use crate::ca_dir;
use crate::cli::InitCaArgs;
use crate::error::CliError;
use crate::output::{CaSummary, OutputFormat};

/// Init-CA command executor.
#[derive(Debug, Default)]
pub struct InitCaCommand;

impl InitCaCommand {
    /// Create a new init-ca command.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Execute the init-ca command.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory already holds a CA and `--force`
    /// is not given, or if generation or writing fails.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &InitCaArgs,
    ) -> Result<(), CliError> {
        let summary = self.init(args)?;
        format.write(writer, &summary)
    }

    /// Create the CA described by `args`.
    ///
    /// # Errors
    ///
    /// See [`InitCaCommand::execute`].
    pub fn init(&self, args: &InitCaArgs) -> Result<CaSummary, CliError> {
        fs::create_dir_all(&args.out)?;

        let replaced = retire_current_cert(&args.out, args.force)?;

        let ca = CertificateAuthority::with_validity(&args.name, args.validity_days)?;
        fs::write(args.out.join(CA_CERT_ENTRY), ca.cert_pem())?;
        ca_dir::write_key(&args.out, ca.key().pem())?;

        info!("Wrote CA {} to {}", ca.name(), args.out.display());

        Ok(CaSummary {
            name: ca.name().to_string(),
            directory: args.out.display().to_string(),
            validity_days: args.validity_days,
            replaced,
        })
    }
}

/// Moves an existing `ca.crt` aside under its old-certificate name so nodes
/// keep trusting it until it is pruned.
fn retire_current_cert(dir: &Path, force: bool) -> Result<Option<String>, CliError> {
    let current = dir.join(CA_CERT_ENTRY);
    if !current.exists() {
        return Ok(None);
    }
    if !force {
        return Err(CliError::CaDirectory(format!(
            "{} already holds a CA, use --force to replace it",
            dir.display()
        )));
    }

    let old_name = old_ca_cert_entry_name(Utc::now());
    fs::rename(&current, dir.join(&old_name))?;
    info!("Kept replaced CA certificate as {old_name}");
    Ok(Some(old_name))
}
