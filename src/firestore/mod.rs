//! Cloud Firestore module.
//!
//! A read-only slice of the Firestore REST API: enough to reach a top-level collection
//! and stream every document in it through `runQuery`.
//!
//! Requests carry a bearer token from the `AuthMiddleware`. No retry middleware is
//! installed: a failed request is reported to the caller as-is.

pub mod models;
pub mod reference;
pub mod snapshot;
pub mod stream;


use self::reference::CollectionReference;
use crate::core::middleware::AuthMiddleware;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use thiserror::Error;

/// Root of the production Firestore REST API.
pub const FIRESTORE_V1_API: &str = "https://firestore.googleapis.com/v1";

/// Errors that can occur during Firestore operations.
#[derive(Error, Debug)]
pub enum FirestoreError {
    /// Wrapper for `reqwest::Error`.
    #[error("HTTP Request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    /// Wrapper for `reqwest_middleware::Error`.
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),
    /// Errors returned by the Firestore API.
    #[error("API error: {0}")]
    ApiError(String),
    /// Wrapper for `serde_json::Error`.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Builds the `.../documents` root for a project and database under `api_root`.
pub fn documents_url(api_root: &str, project_id: &str, database_id: &str) -> String {
    format!(
        "{}/projects/{}/databases/{}/documents",
        api_root.trim_end_matches('/'),
        project_id,
        database_id
    )
}

/// Client for interacting with Cloud Firestore.
pub struct FirebaseFirestore {
    client: ClientWithMiddleware,
    base_url: String,
}

impl FirebaseFirestore {
    /// Creates a client rooted at a `.../documents` URL, see [`documents_url`].
    pub fn new_with_url(middleware: AuthMiddleware, base_url: String) -> Self {
        let client = ClientBuilder::new(Client::new()).with(middleware).build();
        Self { client, base_url }
    }

    #[cfg(test)]
    pub(crate) fn new_with_client(client: ClientWithMiddleware, base_url: String) -> Self {
        Self { client, base_url }
    }

    /// The `.../documents` root every request is built on.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Gets a `CollectionReference` for a top-level collection.
    ///
    /// # Arguments
    ///
    /// * `collection_id` - The ID of the collection (e.g., "devices").
    pub fn collection(&'_ self, collection_id: &str) -> CollectionReference<'_> {
        CollectionReference {
            client: &self.client,
            parent_path: self.base_url.clone(),
            collection_id: collection_id.to_string(),
        }
    }
}
