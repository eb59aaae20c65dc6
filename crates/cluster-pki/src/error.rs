//! PKI error types.

use thiserror::Error;

/// Result type for PKI operations.
pub type Result<T> = std::result::Result<T, Error>;

/// PKI error variants.
#[derive(Debug, Error)]
pub enum Error {
    /// Certificate or key generation failed.
    #[error("certificate generation failed: {0}")]
    Generation(String),

    /// Certificate or key parsing failed.
    #[error("certificate parsing failed: {0}")]
    Parse(String),

    /// Invalid input such as an empty common name.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Subject Alternative Name error.
    #[error("SAN error: {0}")]
    San(String),
}
