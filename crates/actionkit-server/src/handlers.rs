//! Endpoint handlers.

use std::collections::HashMap;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use actionkit_api::dispatch::back_with_errors;
use actionkit_api::{configure_record_actions, transfer, ExecuteRequest, UploadedFile};
use actionkit_core::RecordKey;

use crate::response;
use crate::state::{is_inertia, referer, AppState};

/// `POST /actions/execute`
pub(crate) async fn execute(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(body): Json<Map<String, Value>>,
) -> Response {
    let (ctx, jar) = state.begin(jar, &headers);
    let inertia = is_inertia(&headers);
    let request = ExecuteRequest::from_body(body).with_inertia(inertia);
    let back = referer(&headers);

    match actionkit_api::execute(&ctx, &request) {
        Ok(dispatched) => response::dispatch(dispatched, &back, ctx.config(), jar),
        Err(errors) if inertia => {
            let dispatched = back_with_errors(&ctx, &errors);
            response::dispatch(dispatched, &back, ctx.config(), jar)
        }
        Err(errors) => {
            tracing::debug!("Action validation failed: {}", errors);
            response::validation(&errors, jar)
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExportQuery {
    token: Option<String>,
}

/// `GET /actions/export?token=…`
pub(crate) async fn export(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Query(query): Query<ExportQuery>,
) -> Response {
    let (ctx, jar) = state.begin(jar, &headers);
    match transfer::export(&ctx, query.token.as_deref()) {
        Ok(file) => (jar, response::download(file)).into_response(),
        Err(e) => {
            tracing::warn!("Export rejected: {}", e);
            (jar, response::transfer_error(&e)).into_response()
        }
    }
}

/// `POST /actions/import` with `importer` and `file` multipart fields.
pub(crate) async fn import(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let mut importer = None;
    let mut file = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Malformed import upload: {}", e);
                return response::failure(StatusCode::BAD_REQUEST, e.to_string());
            }
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("importer") => match field.text().await {
                Ok(text) => importer = Some(text),
                Err(e) => return response::failure(StatusCode::BAD_REQUEST, e.to_string()),
            },
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                match field.bytes().await {
                    Ok(bytes) => {
                        file = Some(UploadedFile {
                            file_name,
                            content_type,
                            bytes: bytes.to_vec(),
                        })
                    }
                    Err(e) => return response::failure(StatusCode::BAD_REQUEST, e.to_string()),
                }
            }
            _ => {}
        }
    }

    let (ctx, jar) = state.begin(jar, &headers);
    let dispatched = transfer::import(&ctx, importer.as_deref(), file);
    response::dispatch(dispatched, &referer(&headers), ctx.config(), jar)
}

/// Parse a record key from a query string, preferring integers.
fn parse_key(raw: &str) -> RecordKey {
    raw.parse::<i64>()
        .map(RecordKey::from)
        .unwrap_or_else(|_| RecordKey::from(raw))
}

/// `GET /components/{component}/actions?record=…`
///
/// Serializes the component's actions, which stores standalone handlers
/// in the session and issues their tokens.
pub(crate) async fn component_actions(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Path(name): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let (ctx, jar) = state.begin(jar, &headers);
    let Some(component) = ctx.components().get(&name) else {
        let missing = response::failure(StatusCode::NOT_FOUND, "Component not found");
        return (jar, missing).into_response();
    };

    let key = query
        .get("record")
        .filter(|raw| !raw.is_empty())
        .map(|raw| parse_key(raw));
    let record = match &key {
        Some(key) => match component.resolve_record(key, &ctx) {
            Some(record) => Some(record),
            None => {
                return (jar, response::failure(StatusCode::NOT_FOUND, "Record not found"))
                    .into_response()
            }
        },
        None => None,
    };

    let panel = component
        .panel()
        .or_else(|| ctx.panel())
        .map(str::to_string);
    let actions: Vec<Value> = configure_record_actions(
        component.name(),
        panel.as_deref(),
        key.as_ref(),
        component.actions(&ctx),
    )
    .into_iter()
    .map(|mut action| Value::Object(action.to_array_with_record(record.as_ref(), &ctx)))
    .collect();

    let bulk_actions: Vec<Value> = component
        .bulk_actions(&ctx)
        .into_iter()
        .map(|mut group| group.to_array(&ctx))
        .collect();

    tracing::debug!(component = %name, actions = actions.len(), "Rendered component actions");
    let body = json!({
        "actions": actions,
        "bulkActions": bulk_actions,
    });
    (jar, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key() {
        assert_eq!(parse_key("12"), RecordKey::from(12));
        assert_eq!(parse_key("abc-1"), RecordKey::from("abc-1"));
    }
}
