//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Result of `init-ca`.
#[derive(Debug, Clone, Serialize)]
pub struct CaSummary {
    /// CA common name.
    pub name: String,
    /// Directory the CA was written to.
    pub directory: String,
    /// Validity of the CA certificate in days.
    pub validity_days: u32,
    /// Entry name of the replaced CA certificate, if any.
    pub replaced: Option<String>,
}

impl TableDisplay for CaSummary {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Cluster CA")?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Name:           {}", self.name)?;
        writeln!(writer, "Directory:      {}", self.directory)?;
        writeln!(writer, "Validity:       {} days", self.validity_days)?;
        if let Some(replaced) = &self.replaced {
            writeln!(writer, "Replaced:       kept as {replaced}")?;
        }
        Ok(())
    }
}

/// Action taken for one pod.
#[derive(Debug, Clone, Serialize)]
pub struct PodAction {
    /// Pod name.
    pub pod: String,
    /// Short action name.
    pub action: String,
    /// Regeneration reasons, empty unless regenerated.
    pub reasons: Vec<String>,
}

/// The CA that signed the certificates of a reconciliation.
#[derive(Debug, Clone, Serialize)]
pub struct SigningCa {
    /// Display name, e.g. `Cluster CA`.
    pub name: String,
    /// Secret holding the CA certificates.
    pub cert_secret: String,
    /// Secret holding the CA key.
    pub key_secret: String,
}

/// Result of `reconcile`.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    /// The signing CA.
    pub ca: SigningCa,
    /// Per-pod actions, sorted by pod name.
    pub pods: Vec<PodAction>,
    /// Where the secret data was written.
    pub written_to: Option<String>,
}

impl ReconcileReport {
    /// Number of pods whose certificate changed.
    #[must_use]
    pub fn changed(&self) -> usize {
        self.pods.iter().filter(|pod| pod.action != "reused").count()
    }
}

impl TableDisplay for ReconcileReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.pods.is_empty() {
            writeln!(writer, "No nodes to reconcile")?;
            return Ok(());
        }

        writeln!(
            writer,
            "Signed by {} (secrets {}, {})",
            self.ca.name, self.ca.cert_secret, self.ca.key_secret
        )?;
        writeln!(writer)?;
        writeln!(writer, "{:<48}  {:<12}  REASONS", "POD", "ACTION")?;
        writeln!(writer, "{}", "─".repeat(96))?;

        for pod in &self.pods {
            writeln!(
                writer,
                "{:<48}  {:<12}  {}",
                truncate(&pod.pod, 48),
                pod.action,
                pod.reasons.join(", ")
            )?;
        }

        writeln!(writer)?;
        writeln!(
            writer,
            "Total: {} pod(s), {} changed",
            self.pods.len(),
            self.changed()
        )?;
        if let Some(path) = &self.written_to {
            writeln!(writer, "Secret data written to {path}")?;
        }
        Ok(())
    }
}

/// Result of `prune`.
#[derive(Debug, Clone, Serialize)]
pub struct PruneReport {
    /// Removed certificate files.
    pub removed: Vec<String>,
    /// Certificate files left in place.
    pub kept: Vec<String>,
}

impl TableDisplay for PruneReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.removed.is_empty() {
            writeln!(writer, "No old CA certificates removed")?;
        } else {
            writeln!(writer, "Removed")?;
            for name in &self.removed {
                writeln!(writer, "  {name}")?;
            }
        }
        writeln!(writer)?;
        writeln!(writer, "Kept")?;
        for name in &self.kept {
            writeln!(writer, "  {name}")?;
        }
        Ok(())
    }
}

/// Truncate a string to a maximum length, adding "..." if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{kept}...")
    }
}
