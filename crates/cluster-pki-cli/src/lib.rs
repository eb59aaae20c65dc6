//! # cluster-pki-cli
//!
//! Command-line front end for `cluster-pki`.
//!
//! Provides commands for:
//! - Creating or replacing the cluster CA
//! - Reconciling node certificates from a request document
//! - Pruning old CA certificates
//!
//! The CA lives in a plain directory (`ca.crt`, `ca.key` and replaced
//! `ca-<timestamp>Z.crt` files); node certificates are read and written as
//! secret data JSON, the same layout the operator stores in its secrets.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ca_dir;
pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod request;

pub use cli::{Cli, Commands, Format};
pub use error::CliError;
pub use output::OutputFormat;
pub use request::{Component, ReconcileRequest};
