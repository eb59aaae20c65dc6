//! On-disk layout of a CA directory.
//!
//! A CA directory holds the current certificate (`ca.crt`), its key
//! (`ca.key`) and any replaced certificates still kept for trust overlap
//! (`ca-<timestamp>Z.crt`).

use std::fs;
use std::path::Path;

use tracing::debug;

use cluster_pki::{CaCertStore, CertificateAuthority, CA_CERT_ENTRY};

use crate::error::CliError;

/// File name of the CA key.
pub const CA_KEY_FILE: &str = "ca.key";

/// Loads the signing authority from `dir`.
///
/// # Errors
///
/// Returns an error if `ca.crt` or `ca.key` is missing or unparsable.
pub fn load_authority(dir: &Path) -> Result<CertificateAuthority, CliError> {
    let cert_path = dir.join(CA_CERT_ENTRY);
    let key_path = dir.join(CA_KEY_FILE);
    if !cert_path.is_file() || !key_path.is_file() {
        return Err(CliError::CaDirectory(format!(
            "{} does not hold {CA_CERT_ENTRY} and {CA_KEY_FILE}",
            dir.display()
        )));
    }

    let cert_pem = fs::read_to_string(cert_path)?;
    let key_pem = fs::read_to_string(key_path)?;
    Ok(CertificateAuthority::from_pem(&cert_pem, &key_pem)?)
}

/// Reads every `*.crt` file of `dir` into a CA certificate store.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn read_cert_store(dir: &Path) -> Result<CaCertStore, CliError> {
    let mut store = CaCertStore::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !name.ends_with(".crt") {
            continue;
        }

        debug!("Reading CA certificate {name}");
        store.insert(name, fs::read(entry.path())?);
    }

    Ok(store)
}

/// Writes the CA key, readable by the owner only where supported.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_key(dir: &Path, key_pem: &[u8]) -> Result<(), CliError> {
    let path = dir.join(CA_KEY_FILE);
    fs::write(&path, key_pem)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}
