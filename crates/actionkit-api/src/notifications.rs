//! Notification cookie encoding.
//!
//! After a standalone action the queued notifications are mirrored into a
//! short-lived, script-readable cookie holding base64 encoded JSON, so the
//! client can show them without another request.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use actionkit_core::Notification;

/// Encode notifications as a cookie value. `None` when there are none.
pub fn encode_cookie(notifications: &[Notification]) -> Option<String> {
    if notifications.is_empty() {
        return None;
    }
    match serde_json::to_vec(notifications) {
        Ok(json) => Some(STANDARD.encode(json)),
        Err(e) => {
            tracing::warn!("Failed to encode notifications: {}", e);
            None
        }
    }
}

/// Decode a cookie value. Malformed values yield no notifications.
pub fn decode_cookie(value: &str) -> Vec<Notification> {
    STANDARD
        .decode(value)
        .ok()
        .and_then(|json| serde_json::from_slice(&json).ok())
        .unwrap_or_default()
}
