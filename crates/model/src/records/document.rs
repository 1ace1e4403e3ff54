use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const RESOURCE_TYPE_FIELD: &str = "resourceType";
pub const TIMESTAMP_FIELD: &str = "_ts";
pub const ID_FIELD: &str = "id";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Document is not a JSON object")]
    NotAnObject,

    #[error("Document is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Field '{field}' must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
}

/// A change-feed document with its required fields validated.
///
/// Everything besides `resourceType` and `_ts` is kept untouched in `fields`
/// and serialized back next to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "resourceType")]
    pub resource_type: String,
    #[serde(rename = "_ts")]
    pub ts: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(resource_type: impl Into<String>, ts: i64) -> Self {
        Self {
            resource_type: resource_type.into(),
            ts,
            fields: Map::new(),
        }
    }

    /// Adds a free-form field. `resourceType` and `_ts` live in their typed
    /// fields and are ignored here.
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        if name != RESOURCE_TYPE_FIELD && name != TIMESTAMP_FIELD {
            self.fields.insert(name, value);
        }
        self
    }

    /// Validates a raw store payload.
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        let Value::Object(mut fields) = value else {
            return Err(DocumentError::NotAnObject);
        };

        let resource_type = match fields.remove(RESOURCE_TYPE_FIELD) {
            Some(Value::String(s)) => s,
            Some(_) => {
                return Err(DocumentError::InvalidField {
                    field: RESOURCE_TYPE_FIELD,
                    expected: "a string",
                });
            }
            None => return Err(DocumentError::MissingField(RESOURCE_TYPE_FIELD)),
        };

        let ts = match fields.remove(TIMESTAMP_FIELD) {
            Some(Value::Number(n)) => n.as_i64().ok_or(DocumentError::InvalidField {
                field: TIMESTAMP_FIELD,
                expected: "an integer number of seconds",
            })?,
            Some(_) => {
                return Err(DocumentError::InvalidField {
                    field: TIMESTAMP_FIELD,
                    expected: "an integer number of seconds",
                });
            }
            None => return Err(DocumentError::MissingField(TIMESTAMP_FIELD)),
        };

        Ok(Document {
            resource_type,
            ts,
            fields,
        })
    }

    pub fn id(&self) -> Option<&str> {
        self.fields.get(ID_FIELD).and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

impl TryFrom<Value> for Document {
    type Error = DocumentError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Document::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_keeps_extra_fields() {
        let doc = Document::from_value(json!({
            "id": "p-1",
            "resourceType": "Patient",
            "_ts": 1488362400,
            "name": [{"family": "Chalmers"}]
        }))
        .unwrap();

        assert_eq!(doc.resource_type, "Patient");
        assert_eq!(doc.ts, 1_488_362_400);
        assert_eq!(doc.id(), Some("p-1"));
        assert!(doc.get("name").is_some());
        assert!(doc.get(RESOURCE_TYPE_FIELD).is_none());
    }

    #[test]
    fn test_missing_required_fields() {
        assert_eq!(
            Document::from_value(json!({"_ts": 1})),
            Err(DocumentError::MissingField(RESOURCE_TYPE_FIELD))
        );
        assert_eq!(
            Document::from_value(json!({"resourceType": "Patient"})),
            Err(DocumentError::MissingField(TIMESTAMP_FIELD))
        );
        assert_eq!(
            Document::from_value(json!(["Patient", 1])),
            Err(DocumentError::NotAnObject)
        );
    }

    #[test]
    fn test_mistyped_required_fields() {
        assert!(matches!(
            Document::from_value(json!({"resourceType": 7, "_ts": 1})),
            Err(DocumentError::InvalidField { field: RESOURCE_TYPE_FIELD, .. })
        ));
        assert!(matches!(
            Document::from_value(json!({"resourceType": "Patient", "_ts": "100"})),
            Err(DocumentError::InvalidField { field: TIMESTAMP_FIELD, .. })
        ));
        assert!(matches!(
            Document::from_value(json!({"resourceType": "Patient", "_ts": 100.5})),
            Err(DocumentError::InvalidField { field: TIMESTAMP_FIELD, .. })
        ));
    }

    #[test]
    fn test_serializes_back_to_store_shape() {
        let doc = Document::new("Observation", 300).with_field("id", json!("o-1"));
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            value,
            json!({"resourceType": "Observation", "_ts": 300, "id": "o-1"})
        );
    }

    #[test]
    fn test_reserved_names_are_not_extra_fields() {
        let doc = Document::new("Patient", 100)
            .with_field(RESOURCE_TYPE_FIELD, json!("Observation"))
            .with_field(TIMESTAMP_FIELD, json!(5))
            .with_field("id", json!("p-1"));

        assert_eq!(doc.resource_type, "Patient");
        assert_eq!(doc.ts, 100);
        assert_eq!(doc.fields.len(), 1);
        assert_eq!(
            serde_json::to_string(&doc).unwrap(),
            r#"{"resourceType":"Patient","_ts":100,"id":"p-1"}"#
        );
    }
}
