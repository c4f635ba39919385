//! Dispatch responses.

use serde_json::{json, Value};

use actionkit_core::{Notification, Redirect, ValidationErrors};

use crate::context::RequestContext;
use crate::lang;

/// Session key for field errors flashed with a back redirect.
pub const ERRORS_FLASH_KEY: &str = "errors";

/// Session key for the data flashed after a standalone action.
pub const ACTION_DATA_FLASH_KEY: &str = "action_updated_data";

/// Session key for notifications flashed for the next page.
pub const NOTIFICATIONS_FLASH_KEY: &str = "_notifications";

/// What the HTTP layer should send back.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchResponse {
    /// A JSON envelope.
    Json { status: u16, body: Value },

    /// A redirect, with notifications to mirror into a cookie.
    Redirect {
        redirect: Redirect,
        notifications: Vec<Notification>,
    },
}

impl DispatchResponse {
    /// `200 {success: true, message, result}`.
    pub fn success(result: Value) -> Self {
        DispatchResponse::Json {
            status: 200,
            body: json!({
                "success": true,
                "message": lang::ACTION_EXECUTED,
                "result": result,
            }),
        }
    }

    /// `{success: false, message}` with the given status.
    pub fn failure(status: u16, message: impl Into<String>) -> Self {
        DispatchResponse::Json {
            status,
            body: json!({
                "success": false,
                "message": message.into(),
            }),
        }
    }

    pub fn redirect(redirect: Redirect, notifications: Vec<Notification>) -> Self {
        DispatchResponse::Redirect {
            redirect,
            notifications,
        }
    }

    /// HTTP status of the response.
    pub fn status(&self) -> u16 {
        match self {
            DispatchResponse::Json { status, .. } => *status,
            DispatchResponse::Redirect { redirect, .. } => redirect.status,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, DispatchResponse::Redirect { .. })
    }

    pub fn body(&self) -> Option<&Value> {
        match self {
            DispatchResponse::Json { body, .. } => Some(body),
            DispatchResponse::Redirect { .. } => None,
        }
    }

    pub fn notifications(&self) -> &[Notification] {
        match self {
            DispatchResponse::Json { .. } => &[],
            DispatchResponse::Redirect { notifications, .. } => notifications,
        }
    }
}

/// Flash field errors and redirect back with `302`.
pub fn back_with_errors(ctx: &RequestContext, errors: &ValidationErrors) -> DispatchResponse {
    let errors = serde_json::to_value(errors).unwrap_or(Value::Null);
    ctx.session().flash(ERRORS_FLASH_KEY, errors);
    DispatchResponse::redirect(Redirect::back(302), flash_notifications(ctx))
}

/// Drain queued notifications, flashing them for the next page.
pub fn flash_notifications(ctx: &RequestContext) -> Vec<Notification> {
    let notifications = ctx.take_notifications();
    if !notifications.is_empty() {
        let value = serde_json::to_value(&notifications).unwrap_or(Value::Null);
        ctx.session().flash(NOTIFICATIONS_FLASH_KEY, value);
    }
    notifications
}
