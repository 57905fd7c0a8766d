//! Options for a snapshot run.

use std::path::PathBuf;

/// Collection read when none is configured.
pub const DEFAULT_COLLECTION: &str = "devices";

/// Firestore database id used when none is configured.
pub const DEFAULT_DATABASE: &str = "(default)";

/// Everything `initialize` and `fetch_all` need to know about where to read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotOptions {
    /// Path to the service-account key JSON file.
    pub credential_path: PathBuf,
    /// Collection whose documents are read.
    pub collection: String,
    /// Firestore database id within the project.
    pub database_id: String,
    /// `host:port` of a local Firestore emulator. When set, requests go there over
    /// plain HTTP with the emulator's fixed bearer token.
    pub emulator_host: Option<String>,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            credential_path: PathBuf::new(),
            collection: DEFAULT_COLLECTION.to_string(),
            database_id: DEFAULT_DATABASE.to_string(),
            emulator_host: None,
        }
    }
}

impl SnapshotOptions {
    pub fn new(credential_path: impl Into<PathBuf>) -> Self {
        Self {
            credential_path: credential_path.into(),
            ..Self::default()
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_database(mut self, database_id: impl Into<String>) -> Self {
        self.database_id = database_id.into();
        self
    }

    pub fn with_emulator_host(mut self, host: Option<String>) -> Self {
        self.emulator_host = host.filter(|h| !h.trim().is_empty());
        self
    }
}
