//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use cluster_pki::naming::DEFAULT_CLUSTER_DOMAIN;

use crate::request::MAX_VALIDITY_DAYS;

/// Node certificate management for streaming clusters.
#[derive(Parser, Debug, Clone)]
#[command(name = "cluster-pki")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Kubernetes cluster domain used in service DNS names.
    #[arg(long, env = "KUBERNETES_SERVICE_DNS_DOMAIN", default_value = DEFAULT_CLUSTER_DOMAIN)]
    pub cluster_domain: String,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create a self-signed cluster CA.
    InitCa(InitCaArgs),

    /// Reconcile node certificates against the CA.
    Reconcile(ReconcileArgs),

    /// Remove old CA certificates from the CA directory.
    Prune(PruneArgs),
}

/// Arguments for `init-ca`.
#[derive(Parser, Debug, Clone)]
pub struct InitCaArgs {
    /// Directory to write `ca.crt` and `ca.key` to.
    #[arg(long)]
    pub out: PathBuf,

    /// Common name of the CA certificate.
    #[arg(long, default_value = "Cluster CA")]
    pub name: String,

    /// CA certificate validity in days.
    #[arg(
        long,
        default_value_t = 365,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_VALIDITY_DAYS))
    )]
    pub validity_days: u32,

    /// Replace an existing CA. The old certificate is kept under a
    /// timestamped name until it is pruned.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for `reconcile`.
#[derive(Parser, Debug, Clone)]
pub struct ReconcileArgs {
    /// Directory holding `ca.crt` and `ca.key`.
    #[arg(long, env = "CLUSTER_PKI_CA_DIR")]
    pub ca: PathBuf,

    /// Reconcile request (JSON).
    #[arg(long)]
    pub request: PathBuf,

    /// Secret data of the previous reconciliation (JSON).
    #[arg(long)]
    pub existing: Option<PathBuf>,

    /// Where to write the resulting secret data (JSON). Without it the
    /// reconciliation is only reported.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Arguments for `prune`.
#[derive(Parser, Debug, Clone)]
pub struct PruneArgs {
    /// Directory holding the CA certificates.
    #[arg(long, env = "CLUSTER_PKI_CA_DIR")]
    pub ca: PathBuf,

    /// The CA is generated by the operator. Old certificates of a
    /// user-supplied CA are never removed.
    #[arg(long)]
    pub self_managed: bool,
}
