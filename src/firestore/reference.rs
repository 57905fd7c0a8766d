use super::models::{
    double, CollectionSelector, RunQueryRequest, StructuredQuery, Value, ValueType,
};
use super::stream::{run_query_request, DocumentStream};
use super::FirestoreError;
use reqwest_middleware::ClientWithMiddleware;
use serde::de::Error;
use serde_json::map::Map;
use serde_json::Value as SerdeValue;
use std::collections::HashMap;

// Helper to convert Firestore's value map to a standard serde_json::Value
pub(crate) fn convert_fields_to_map(
    fields: HashMap<String, Value>,
) -> Result<Map<String, SerdeValue>, FirestoreError> {
    let mut map = Map::new();
    for (key, value) in fields {
        map.insert(key, convert_value_to_serde_value(value)?);
    }
    Ok(map)
}

pub(crate) fn convert_fields_to_serde_value(
    fields: HashMap<String, Value>,
) -> Result<SerdeValue, FirestoreError> {
    Ok(SerdeValue::Object(convert_fields_to_map(fields)?))
}

pub(crate) fn convert_value_to_serde_value(value: Value) -> Result<SerdeValue, FirestoreError> {
    use serde_json::json;
    Ok(match value.value_type {
        ValueType::StringValue(s) => SerdeValue::String(s),
        ValueType::IntegerValue(s) => {
            let i: i64 = s.parse().map_err(|e| {
                <serde_json::Error as Error>::custom(format!(
                    "Failed to parse integer string '{}': {}",
                    s, e
                ))
            })?;
            SerdeValue::Number(i.into())
        }
        // JSON has no non-finite numbers; keep Firestore's own spelling.
        ValueType::DoubleValue(d) => match serde_json::Number::from_f64(d) {
            Some(n) => SerdeValue::Number(n),
            None => SerdeValue::String(double::non_finite_name(d).unwrap_or("NaN").to_string()),
        },
        ValueType::BooleanValue(b) => SerdeValue::Bool(b),
        ValueType::MapValue(map_value) => convert_fields_to_serde_value(map_value.fields)?,
        ValueType::ArrayValue(array_value) => {
            let values = array_value
                .values
                .into_iter()
                .map(convert_value_to_serde_value)
                .collect::<Result<Vec<_>, _>>()?;
            SerdeValue::Array(values)
        }
        ValueType::NullValue(_) => SerdeValue::Null,
        ValueType::TimestampValue(s) => SerdeValue::String(s),
        ValueType::GeoPointValue(gp) => {
            json!({ "latitude": gp.latitude, "longitude": gp.longitude })
        }
        ValueType::BytesValue(s) => SerdeValue::String(s),
        ValueType::ReferenceValue(s) => SerdeValue::String(s),
    })
}

/// A reference to a top-level collection.
#[derive(Clone)]
pub struct CollectionReference<'a> {
    pub(crate) client: &'a ClientWithMiddleware,
    pub(crate) parent_path: String,
    pub(crate) collection_id: String,
}

impl<'a> CollectionReference<'a> {
    /// The collection id, e.g. `devices`.
    pub fn id(&self) -> &str {
        &self.collection_id
    }

    /// Runs an unfiltered query over the collection and streams back its documents.
    ///
    /// The request is sent before this returns, so an HTTP-level rejection (bad token,
    /// missing permission) is reported here. Failures while the body is still arriving are
    /// yielded by the stream, which then ends.
    pub async fn stream(&self) -> Result<DocumentStream, FirestoreError> {
        let request = RunQueryRequest {
            structured_query: StructuredQuery {
                from: vec![CollectionSelector {
                    collection_id: self.collection_id.clone(),
                    all_descendants: None,
                }],
            },
        };

        run_query_request(self.client, &self.parent_path, &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_convert_typed_fields() {
        let fields: HashMap<String, Value> = serde_json::from_value(json!({
            "status": { "stringValue": "on" },
            "brightness": { "integerValue": "80" },
            "temperature": { "doubleValue": 21.5 },
            "online": { "booleanValue": true },
            "room": { "nullValue": null },
            "schedule": { "arrayValue": { "values": [
                { "stringValue": "08:00" },
                { "integerValue": "2" }
            ] } },
            "config": { "mapValue": { "fields": {
                "mode": { "stringValue": "eco" }
            } } },
            "location": { "geoPointValue": { "latitude": 25.2, "longitude": 55.3 } },
            "installed": { "timestampValue": "2024-03-01T10:00:00Z" },
            "owner": { "referenceValue": "projects/p/databases/(default)/documents/users/u1" }
        }))
        .unwrap();

        let value = convert_fields_to_serde_value(fields).unwrap();
        assert_eq!(
            value,
            json!({
                "status": "on",
                "brightness": 80,
                "temperature": 21.5,
                "online": true,
                "room": null,
                "schedule": ["08:00", 2],
                "config": { "mode": "eco" },
                "location": { "latitude": 25.2, "longitude": 55.3 },
                "installed": "2024-03-01T10:00:00Z",
                "owner": "projects/p/databases/(default)/documents/users/u1"
            })
        );
    }

    #[test]
    fn test_empty_containers() {
        let fields: HashMap<String, Value> = serde_json::from_value(json!({
            "tags": { "arrayValue": {} },
            "meta": { "mapValue": {} }
        }))
        .unwrap();

        let value = convert_fields_to_serde_value(fields).unwrap();
        assert_eq!(value, json!({ "tags": [], "meta": {} }));
    }

    #[test]
    fn test_non_finite_doubles() {
        let fields: HashMap<String, Value> = serde_json::from_value(json!({
            "nan": { "doubleValue": "NaN" },
            "hot": { "doubleValue": "Infinity" },
            "cold": { "doubleValue": "-Infinity" },
            "whole": { "doubleValue": 3 }
        }))
        .unwrap();

        let value = convert_fields_to_serde_value(fields).unwrap();
        assert_eq!(
            value,
            json!({ "nan": "NaN", "hot": "Infinity", "cold": "-Infinity", "whole": 3.0 })
        );

        let bad: Result<HashMap<String, Value>, _> =
            serde_json::from_value(json!({ "x": { "doubleValue": "warm" } }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_bad_integer_is_rejected() {
        let fields: HashMap<String, Value> = serde_json::from_value(json!({
            "count": { "integerValue": "twelve" }
        }))
        .unwrap();

        let err = convert_fields_to_serde_value(fields).unwrap_err();
        assert!(matches!(err, FirestoreError::SerializationError(_)));
    }
}
