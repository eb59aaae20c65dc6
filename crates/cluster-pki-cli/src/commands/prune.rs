//! `prune` command implementation.

use std::fs;
use std::io::Write;

use tracing::info;

use cluster_pki::maybe_delete_old_certs;

use crate::ca_dir;
use crate::cli::PruneArgs;
use crate::error::CliError;
use crate::output::{OutputFormat, PruneReport};

/// Prune command executor.
#[derive(Debug, Default)]
pub struct PruneCommand;

impl PruneCommand {
    /// Create a new prune command.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Execute the prune command.
    ///
    /// # Errors
    ///
    /// Returns an error if the CA directory cannot be read or a file cannot
    /// be removed.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &PruneArgs,
    ) -> Result<(), CliError> {
        let report = self.prune(args)?;
        format.write(writer, &report)
    }

    /// Remove old CA certificate files from the CA directory.
    ///
    /// # Errors
    ///
    /// See [`PruneCommand::execute`].
    pub fn prune(&self, args: &PruneArgs) -> Result<PruneReport, CliError> {
        let mut store = ca_dir::read_cert_store(&args.ca)?;
        let before: Vec<String> = store.keys().cloned().collect();

        if !maybe_delete_old_certs(&mut store, args.self_managed) {
            return Ok(PruneReport {
                removed: Vec::new(),
                kept: before,
            });
        }

        let mut removed = Vec::new();
        for name in before {
            if !store.contains_key(&name) {
                fs::remove_file(args.ca.join(&name))?;
                info!("Removed {name}");
                removed.push(name);
            }
        }

        Ok(PruneReport {
            removed,
            kept: store.into_keys().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const OLD: &str = "ca-2024-03-01T12-00-00Z.crt";

    fn populate(dir: &Path) {
        fs::write(dir.join("ca.crt"), b"current").unwrap();
        fs::write(dir.join(OLD), b"old").unwrap();
        fs::write(dir.join("ca-backup.crt"), b"other").unwrap();
    }

    fn args(dir: &Path, self_managed: bool) -> PruneArgs {
        PruneArgs {
            ca: dir.to_path_buf(),
            self_managed,
        }
    }

    #[test]
    fn removes_old_certificates_of_self_managed_ca() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path());

        let report = PruneCommand::new().prune(&args(dir.path(), true)).unwrap();

        assert_eq!(report.removed, vec![OLD.to_string()]);
        assert_eq!(report.kept, vec!["ca-backup.crt".to_string(), "ca.crt".to_string()]);
        assert!(!dir.path().join(OLD).exists());
        assert!(dir.path().join("ca.crt").exists());
    }

    #[test]
    fn leaves_user_supplied_ca_untouched() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path());

        let report = PruneCommand::new().prune(&args(dir.path(), false)).unwrap();

        assert!(report.removed.is_empty());
        assert_eq!(report.kept.len(), 3);
        assert!(dir.path().join(OLD).exists());
    }
}
