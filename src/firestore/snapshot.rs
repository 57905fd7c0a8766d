use super::models::Document;
use super::reference::{
    convert_fields_to_map, convert_fields_to_serde_value, convert_value_to_serde_value,
};
use super::FirestoreError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as SerdeValue};

/// A snapshot of a document in Firestore.
///
/// It contains data read from a document in your Firestore database.
/// The data can be extracted with `.fields()` or `.data()`.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    pub(crate) id: String,
    pub(crate) document: Document,
    pub(crate) read_time: Option<String>,
}

impl DocumentSnapshot {
    pub(crate) fn new(document: Document, read_time: Option<String>) -> Self {
        let id = document
            .name
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        Self {
            id,
            document,
            read_time,
        }
    }

    /// The ID of the document.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The full resource name of the document.
    pub fn name(&self) -> &str {
        &self.document.name
    }

    /// The time the document was created.
    pub fn create_time(&self) -> Option<&str> {
        self.document.create_time.as_deref()
    }

    /// The time the document was last updated.
    pub fn update_time(&self) -> Option<&str> {
        self.document.update_time.as_deref()
    }

    /// The time this snapshot was read.
    pub fn read_time(&self) -> Option<&str> {
        self.read_time.as_deref()
    }

    /// All fields of the document as plain JSON values.
    pub fn fields(&self) -> Result<Map<String, SerdeValue>, FirestoreError> {
        convert_fields_to_map(self.document.fields.clone())
    }

    /// Consumes the snapshot, returning its id and fields.
    pub fn into_parts(self) -> Result<(String, Map<String, SerdeValue>), FirestoreError> {
        let fields = convert_fields_to_map(self.document.fields)?;
        Ok((self.id, fields))
    }

    /// Retrieves all fields in the document as a specific type.
    pub fn data<T: DeserializeOwned>(&self) -> Result<T, FirestoreError> {
        let serde_value = convert_fields_to_serde_value(self.document.fields.clone())?;
        Ok(serde_json::from_value(serde_value)?)
    }

    /// Retrieves a top-level field from the document.
    pub fn get_field<T: DeserializeOwned>(&self, field: &str) -> Result<Option<T>, FirestoreError> {
        match self.document.fields.get(field) {
            Some(value) => {
                let serde_value = convert_value_to_serde_value(value.clone())?;
                Ok(Some(serde_json::from_value(serde_value)?))
            }
            None => Ok(None),
        }
    }
}
