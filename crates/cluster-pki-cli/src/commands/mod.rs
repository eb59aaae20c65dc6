//! CLI command implementations.
//!
//! - [`init_ca`] - Create or replace the cluster CA
//! - [`reconcile`] - Reconcile node certificates
//! - [`prune`] - Remove old CA certificates

pub mod init_ca;
pub mod prune;
pub mod reconcile;

pub use init_ca::InitCaCommand;
pub use prune::PruneCommand;
pub use reconcile::ReconcileCommand;
