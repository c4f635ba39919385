//! Record types that actions operate on.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Primary key of a record.
///
/// Keys arrive from the UI as JSON, so both integers and strings are valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordKey(pub Value);

impl RecordKey {
    /// Whether the key carries no usable value (`null` or empty string).
    pub fn is_blank(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Get the key as JSON.
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{}", other),
        }
    }
}

impl From<i64> for RecordKey {
    fn from(id: i64) -> Self {
        Self(Value::from(id))
    }
}

impl From<&str> for RecordKey {
    fn from(id: &str) -> Self {
        Self(Value::from(id))
    }
}

impl From<String> for RecordKey {
    fn from(id: String) -> Self {
        Self(Value::from(id))
    }
}

impl From<Value> for RecordKey {
    fn from(id: Value) -> Self {
        Self(id)
    }
}

/// A record is the unit of data an action is bound to.
///
/// Records are plain attribute maps tagged with the model they belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Model the record belongs to, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Attribute map, including the primary key under `id`.
    pub attributes: Map<String, Value>,
}

impl Record {
    /// Create a record from an attribute map.
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self {
            model: None,
            attributes,
        }
    }

    /// Create a record for a model.
    pub fn for_model(model: impl Into<String>, attributes: Map<String, Value>) -> Self {
        Self {
            model: Some(model.into()),
            attributes,
        }
    }

    /// Build a record from a JSON object. Returns `None` for non-objects.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object().map(|attributes| Self::new(attributes.clone()))
    }

    /// Get the primary key (`id` attribute).
    pub fn key(&self) -> Option<RecordKey> {
        self.attributes
            .get("id")
            .filter(|v| !v.is_null())
            .map(|v| RecordKey(v.clone()))
    }

    /// Get an attribute.
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    /// Set an attribute.
    pub fn set(&mut self, attribute: impl Into<String>, value: Value) {
        self.attributes.insert(attribute.into(), value);
    }

    /// A record is trashed when it carries a non-empty `deleted_at`.
    pub fn is_trashed(&self) -> bool {
        match self.attributes.get("deleted_at") {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Bool(b)) => *b,
            Some(_) => true,
        }
    }

    /// Convert the record into its attribute JSON.
    pub fn to_value(&self) -> Value {
        Value::Object(self.attributes.clone())
    }

    /// Copy the record without its key, timestamps, and the given attributes.
    pub fn replicate(&self, except: &[String]) -> Record {
        const UNIQUE: [&str; 4] = ["id", "created_at", "updated_at", "deleted_at"];

        let attributes = self
            .attributes
            .iter()
            .filter(|(name, _)| !UNIQUE.contains(&name.as_str()))
            .filter(|(name, _)| !except.iter().any(|e| e == *name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Record {
            model: self.model.clone(),
            attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_value(&value).unwrap()
    }

    #[test]
    fn test_record_key() {
        assert_eq!(record(json!({"id": 7})).key(), Some(RecordKey::from(7)));
        assert_eq!(record(json!({"id": null})).key(), None);
        assert_eq!(record(json!({"name": "x"})).key(), None);
    }

    #[test]
    fn test_is_trashed() {
        assert!(!record(json!({"id": 1})).is_trashed());
        assert!(!record(json!({"id": 1, "deleted_at": null})).is_trashed());
        assert!(!record(json!({"id": 1, "deleted_at": ""})).is_trashed());
        assert!(record(json!({"id": 1, "deleted_at": "2024-01-01 00:00:00"})).is_trashed());
    }

    #[test]
    fn test_from_value_rejects_non_objects() {
        assert!(Record::from_value(&json!([1, 2])).is_none());
        assert!(Record::from_value(&json!("x")).is_none());
    }

    #[test]
    fn test_replicate_drops_key_and_excluded() {
        let original = record(json!({
            "id": 5,
            "title": "Post",
            "slug": "post",
            "created_at": "2024-01-01"
        }));

        let replica = original.replicate(&["slug".to_string()]);
        assert_eq!(replica.key(), None);
        assert_eq!(replica.get("title"), Some(&json!("Post")));
        assert!(replica.get("slug").is_none());
        assert!(replica.get("created_at").is_none());
    }

    #[test]
    fn test_key_display() {
        assert_eq!(RecordKey::from(42).to_string(), "42");
        assert_eq!(RecordKey::from("abc").to_string(), "abc");
        assert!(RecordKey(Value::Null).is_blank());
        assert!(RecordKey::from("").is_blank());
    }
}
