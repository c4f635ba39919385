//! Rendering dispatch results as HTTP responses.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::json;

use actionkit_api::notifications::encode_cookie;
use actionkit_api::{DispatchResponse, ExportFile, TransferError};
use actionkit_core::{ActionsConfig, Notification, ValidationErrors};

fn status(code: u16, fallback: StatusCode) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(fallback)
}

/// Mirror notifications into a short-lived cookie readable by client script.
fn with_notification_cookie(
    jar: CookieJar,
    config: &ActionsConfig,
    notifications: &[Notification],
) -> CookieJar {
    let Some(value) = encode_cookie(notifications) else {
        return jar;
    };
    let max_age = i64::try_from(config.session.notification_cookie_max_age_secs).unwrap_or(60);
    let cookie = Cookie::build((config.session.notification_cookie.clone(), value))
        .path("/")
        .max_age(time::Duration::seconds(max_age))
        .http_only(false)
        .same_site(SameSite::Lax);
    jar.add(cookie)
}

/// Render a dispatch response. Back redirects go to `back`.
pub(crate) fn dispatch(
    response: DispatchResponse,
    back: &str,
    config: &ActionsConfig,
    jar: CookieJar,
) -> Response {
    match response {
        DispatchResponse::Json { status: code, body } => {
            (status(code, StatusCode::INTERNAL_SERVER_ERROR), jar, Json(body)).into_response()
        }
        DispatchResponse::Redirect {
            redirect,
            notifications,
        } => {
            let location = redirect.url().unwrap_or(back).to_string();
            let jar = with_notification_cookie(jar, config, &notifications);
            (
                status(redirect.status, StatusCode::SEE_OTHER),
                jar,
                [(header::LOCATION, location)],
            )
                .into_response()
        }
    }
}

/// `422` with the field errors.
pub(crate) fn validation(errors: &ValidationErrors, jar: CookieJar) -> Response {
    let body = json!({
        "message": errors.to_string(),
        "errors": errors,
    });
    (StatusCode::UNPROCESSABLE_ENTITY, jar, Json(body)).into_response()
}

/// A downloadable file.
pub(crate) fn download(file: ExportFile) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", file.file_name.replace('"', ""));
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, file.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response()
}

pub(crate) fn transfer_error(err: &TransferError) -> Response {
    let body = json!({
        "success": false,
        "message": err.to_string(),
    });
    (status(err.status(), StatusCode::INTERNAL_SERVER_ERROR), Json(body)).into_response()
}

/// `{success: false, message}` with the given status.
pub(crate) fn failure(code: StatusCode, message: impl Into<String>) -> Response {
    let body = json!({
        "success": false,
        "message": message.into(),
    });
    (code, Json(body)).into_response()
}
