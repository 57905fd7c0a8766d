use crate::credential::CredentialError;
use crate::firestore::FirestoreError;
use thiserror::Error;

/// Failure of a snapshot run, by the stage that failed.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// The service-account key could not be loaded or was rejected locally.
    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),
    /// No access token could be obtained from the service.
    #[error("connection error: {0:#}")]
    Connection(#[source] anyhow::Error),
    /// Running or streaming the collection query failed.
    #[error("query error: {0}")]
    Query(#[from] FirestoreError),
}
