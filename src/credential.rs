//! Service-account key loading.
//!
//! The key file is read and checked before anything touches the network, so a bad path
//! or a broken file never costs a connection attempt.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use yup_oauth2::ServiceAccountKey;

/// Errors raised while loading the service-account credential.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// The key file could not be read (missing, unreadable, not a file).
    #[error("cannot read credential file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file is not a service-account key.
    #[error("credential file {} is not a valid service account key: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The key carries no project id, so no Firestore path can be formed.
    #[error("credential file {} is missing the project_id", path.display())]
    ProjectIdMissing { path: PathBuf },
    /// The OAuth client rejected the key material.
    #[error("service account key was rejected: {0}")]
    InvalidKey(#[source] std::io::Error),
}

/// Reads and parses the service-account key at `path`.
pub async fn load_service_account_key(path: &Path) -> Result<ServiceAccountKey, CredentialError> {
    debug!(path = %path.display(), "reading service account key");

    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CredentialError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let key: ServiceAccountKey =
        serde_json::from_str(&raw).map_err(|source| CredentialError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

    match key.project_id.as_deref() {
        Some(id) if !id.trim().is_empty() => {
            info!(project_id = id, client_email = %key.client_email, "loaded service account key");
            Ok(key)
        }
        _ => Err(CredentialError::ProjectIdMissing {
            path: path.to_path_buf(),
        }),
    }
}
