//! Reads every document of a Cloud Firestore collection into an in-memory snapshot.
//!
//! ```rust,no_run
//! # use device_snapshot::{devices, SnapshotOptions};
//! # async fn run() -> Result<(), device_snapshot::SnapshotError> {
//! let options = SnapshotOptions::new("service-account.json");
//! let client = devices::initialize(&options).await?;
//! let snapshot = devices::fetch_all(&client, &options.collection).await?;
//! devices::report(&snapshot, devices::OutputFormat::Json, &mut std::io::stdout()).ok();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod credential;
pub mod devices;
pub mod error;
pub mod firestore;

pub use config::SnapshotOptions;
pub use error::SnapshotError;

use crate::core::middleware::{AuthMiddleware, ServiceAccountTokens, StaticToken, TokenProvider};
use crate::credential::{load_service_account_key, CredentialError};
use firestore::{documents_url, FirebaseFirestore, FIRESTORE_V1_API};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use yup_oauth2::ServiceAccountKey;

/// Bearer token the Firestore emulator accepts for unrestricted access.
const EMULATOR_TOKEN: &str = "owner";

/// An application handle owning one service-account credential.
pub struct FirebaseApp {
    key: ServiceAccountKey,
    project_id: String,
}

impl FirebaseApp {
    pub(crate) fn new(key: ServiceAccountKey, project_id: String) -> Self {
        Self { key, project_id }
    }

    /// Loads the credential at `path`. Nothing is sent over the network.
    pub async fn from_key_file(path: &Path) -> Result<Self, CredentialError> {
        let key = load_service_account_key(path).await?;
        let project_id = key
            .project_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CredentialError::ProjectIdMissing {
                path: path.to_path_buf(),
            })?;
        Ok(Self::new(key, project_id))
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Connects to the production Firestore endpoint with a token minted from the key.
    pub async fn firestore(&self, database_id: &str) -> Result<FirebaseFirestore, SnapshotError> {
        let tokens = ServiceAccountTokens::new(self.key.clone()).await?;
        let base_url = documents_url(FIRESTORE_V1_API, self.project_id(), database_id);
        connect(base_url, Arc::new(tokens)).await
    }

    /// Connects to a local Firestore emulator at `host` (`host:port`).
    pub async fn firestore_emulator(
        &self,
        host: &str,
        database_id: &str,
    ) -> Result<FirebaseFirestore, SnapshotError> {
        let base_url = documents_url(&format!("http://{}/v1", host), self.project_id(), database_id);
        connect(base_url, Arc::new(StaticToken(EMULATOR_TOKEN.to_string()))).await
    }
}

/// Mints one token through `provider` and returns a client rooted at `base_url`.
///
/// The token is requested up front so an unreachable token endpoint or a revoked key
/// fails here rather than on the first query.
pub async fn connect(
    base_url: String,
    provider: Arc<dyn TokenProvider>,
) -> Result<FirebaseFirestore, SnapshotError> {
    provider.token().await.map_err(SnapshotError::Connection)?;
    info!(%base_url, "connected to firestore");
    Ok(FirebaseFirestore::new_with_url(
        AuthMiddleware::new(provider),
        base_url,
    ))
}
