//! Handler results and side-channel notifications.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result returned by an action handler.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// The handler produced nothing (or no handler was set).
    Empty,

    /// A JSON value for the UI.
    Value(Value),

    /// Navigate elsewhere; forwarded to the client unchanged.
    Redirect(Redirect),
}

impl ActionOutcome {
    /// Check if the outcome carries nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self, ActionOutcome::Empty)
    }

    /// Get the redirect intent, if any.
    pub fn as_redirect(&self) -> Option<&Redirect> {
        match self {
            ActionOutcome::Redirect(redirect) => Some(redirect),
            _ => None,
        }
    }

    /// Convert the outcome into JSON. Redirects and empty results become `null`.
    pub fn into_value(self) -> Value {
        match self {
            ActionOutcome::Value(value) => value,
            ActionOutcome::Empty | ActionOutcome::Redirect(_) => Value::Null,
        }
    }
}

impl From<Value> for ActionOutcome {
    fn from(value: Value) -> Self {
        ActionOutcome::Value(value)
    }
}

impl From<Redirect> for ActionOutcome {
    fn from(redirect: Redirect) -> Self {
        ActionOutcome::Redirect(redirect)
    }
}

/// Where a redirect points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "url", rename_all = "lowercase")]
pub enum RedirectTarget {
    /// An explicit URL.
    Url(String),
    /// The previous page (the referer).
    Back,
}

/// A redirect intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    pub target: RedirectTarget,
    pub status: u16,
}

impl Redirect {
    /// Redirect to a URL with `302 Found`.
    pub fn to(url: impl Into<String>) -> Self {
        Self {
            target: RedirectTarget::Url(url.into()),
            status: 302,
        }
    }

    /// Redirect back to the previous page.
    pub fn back(status: u16) -> Self {
        Self {
            target: RedirectTarget::Back,
            status,
        }
    }

    /// Get the target URL, if explicit.
    pub fn url(&self) -> Option<&str> {
        match &self.target {
            RedirectTarget::Url(url) => Some(url),
            RedirectTarget::Back => None,
        }
    }
}

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Danger,
}

/// A toast-style notification delivered out of band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl Notification {
    pub fn success(title: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, title)
    }

    pub fn danger(title: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Danger, title)
    }

    fn new(level: NotificationLevel, title: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            body: None,
        }
    }

    /// Set the body text.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}
