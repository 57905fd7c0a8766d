//! The device snapshot run: connect, read the whole collection, print it.
//!
//! Each step either completes or returns an error; nothing is retried and a failed fetch
//! never yields a partial snapshot.

#[cfg(test)]
mod tests;

use crate::config::SnapshotOptions;
use crate::firestore::FirebaseFirestore;
use crate::{FirebaseApp, SnapshotError};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::Write;
use tracing::{debug, info, warn};

/// The fields of one device document.
pub type DeviceFields = Map<String, Value>;

/// Every document of a collection, keyed by document id, in retrieval order.
///
/// Serializes as a single JSON object `{ "<id>": { <fields> }, ... }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DeviceCollectionSnapshot {
    #[serde(skip)]
    collection: String,
    devices: IndexMap<String, DeviceFields>,
    #[serde(skip)]
    read_time: Option<DateTime<Utc>>,
}

impl DeviceCollectionSnapshot {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Self::default()
        }
    }

    /// Adds a device. A repeated id keeps its original position and returns the old fields.
    pub fn insert(&mut self, id: String, fields: DeviceFields) -> Option<DeviceFields> {
        self.devices.insert(id, fields)
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn get(&self, id: &str) -> Option<&DeviceFields> {
        self.devices.get(id)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.devices.keys().map(String::as_str)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, DeviceFields> {
        self.devices.iter()
    }

    /// Server time at which the collection was read, when the service reported one.
    pub fn read_time(&self) -> Option<DateTime<Utc>> {
        self.read_time
    }

    pub fn into_map(self) -> IndexMap<String, DeviceFields> {
        self.devices
    }
}

/// How `report` renders a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One line of compact JSON.
    #[default]
    Json,
    /// Indented JSON.
    Pretty,
}

/// Loads the credential named in `options` and opens an authenticated Firestore client.
pub async fn initialize(options: &SnapshotOptions) -> Result<FirebaseFirestore, SnapshotError> {
    let app = FirebaseApp::from_key_file(&options.credential_path).await?;

    match options.emulator_host.as_deref() {
        Some(host) => {
            info!(host, "using firestore emulator");
            app.firestore_emulator(host, &options.database_id).await
        }
        None => app.firestore(&options.database_id).await,
    }
}

/// Reads every document in `collection`.
///
/// The whole result is consumed before returning; the first error aborts the fetch and
/// discards whatever was read.
pub async fn fetch_all(
    client: &FirebaseFirestore,
    collection: &str,
) -> Result<DeviceCollectionSnapshot, SnapshotError> {
    let mut stream = client.collection(collection).stream().await?;
    let mut snapshot = DeviceCollectionSnapshot::new(collection);

    while let Some(doc) = stream.try_next().await? {
        let (id, fields) = doc.into_parts()?;
        debug!(id = %id, fields = fields.len(), "read document");
        if snapshot.insert(id.clone(), fields).is_some() {
            warn!(id = %id, "document id returned twice, keeping the latest fields");
        }
    }

    snapshot.read_time = stream.read_time().and_then(|raw| {
        DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| warn!(read_time = raw, error = %e, "unparseable read time"))
            .ok()
    });

    info!(collection, documents = snapshot.len(), "fetched collection snapshot");
    Ok(snapshot)
}

/// Writes the snapshot to `out` as one JSON document followed by a newline.
pub fn report<W: Write>(
    snapshot: &DeviceCollectionSnapshot,
    format: OutputFormat,
    out: &mut W,
) -> std::io::Result<()> {
    match format {
        OutputFormat::Json => serde_json::to_writer(&mut *out, snapshot)?,
        OutputFormat::Pretty => serde_json::to_writer_pretty(&mut *out, snapshot)?,
    }
    writeln!(out)?;
    out.flush()
}
