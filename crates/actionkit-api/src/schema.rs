//! Field descriptors for modal forms and infolists.
//!
//! The UI owns rendering; actions only describe the fields in order.

use serde::Serialize;
use serde_json::{Map, Value};

/// A single form or infolist field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Component type understood by the UI (e.g. `text-input`, `hidden`).
    #[serde(rename = "component")]
    pub kind: String,

    /// State path of the field.
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,

    #[serde(rename = "default", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,

    /// Component-specific props.
    #[serde(flatten)]
    pub props: Map<String, Value>,
}

impl Field {
    /// Create a field of the given component type.
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            label: None,
            required: false,
            default_value: None,
            props: Map::new(),
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new("text-input", name)
    }

    pub fn textarea(name: impl Into<String>) -> Self {
        Self::new("textarea", name)
    }

    pub fn hidden(name: impl Into<String>) -> Self {
        Self::new("hidden", name)
    }

    pub fn file_upload(name: impl Into<String>) -> Self {
        Self::new("file-upload", name)
    }

    pub fn entry(name: impl Into<String>) -> Self {
        Self::new("text-entry", name)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Set an arbitrary component prop.
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    /// Restrict an upload to the given MIME types.
    pub fn with_accepted_file_types(self, types: &[String]) -> Self {
        self.with_prop("acceptedFileTypes", types.to_vec())
    }
}

/// Collect field defaults into initial form data.
pub fn default_form_data(fields: &[Field]) -> Map<String, Value> {
    fields
        .iter()
        .filter_map(|field| {
            field
                .default_value
                .as_ref()
                .map(|value| (field.name.clone(), value.clone()))
        })
        .collect()
}
