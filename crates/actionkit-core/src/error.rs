//! Error types for actionkit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Field-level validation messages raised by a handler.
///
/// These must reach the UI unchanged so it can render per-field errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    /// Create an empty error bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an error bag with a single message.
    pub fn with_message(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Add a message for a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Get the messages for a field.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    /// Get the first message overall.
    pub fn first(&self) -> Option<&str> {
        self.fields
            .values()
            .flat_map(|messages| messages.iter())
            .next()
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.first().unwrap_or("The given data was invalid."))
    }
}

/// Errors raised while executing an action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Field-level validation failure. Never swallowed by dispatch.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// The caller may not perform the action.
    #[error("Unauthorized")]
    Unauthorized,

    /// A referenced record, component, or handler does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The record store rejected an operation.
    #[error("Record error: {0}")]
    Record(String),

    /// Any other failure raised inside a handler.
    #[error("{0}")]
    Handler(String),
}

impl ActionError {
    /// Create a handler error from any message.
    pub fn handler(message: impl Into<String>) -> Self {
        ActionError::Handler(message.into())
    }

    /// Check if this is a validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, ActionError::Validation(_))
    }
}

impl From<ValidationErrors> for ActionError {
    fn from(errors: ValidationErrors) -> Self {
        ActionError::Validation(errors)
    }
}

/// Result type alias for handler execution.
pub type ActionResult<T> = Result<T, ActionError>;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No config directory found.
    #[error("Config directory not found")]
    NoConfigDir,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The signing key is unusable.
    #[error("Invalid app key: {0}")]
    InvalidKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_collect_messages() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "The email field is required.");
        errors.add("email", "The email must be valid.");
        errors.add("name", "The name field is required.");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("email").map(|m| m.len()), Some(2));
        assert_eq!(errors.first(), Some("The email field is required."));
    }

    #[test]
    fn test_error_display() {
        let err = ActionError::NotFound("Component".to_string());
        assert_eq!(err.to_string(), "Component not found");

        let err: ActionError = ValidationErrors::with_message("name", "Required").into();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Validation failed: Required");
    }
}
