//! Action dispatch.
//!
//! Decodes a submitted token, resolves it to an action or a stored handler,
//! re-authorizes, reconstructs arguments and maps the result to a response.
//!
//! ```text
//! token ──decode──┬── {action_id}  ──> session handler ──> 303 back
//!                 └── {component}  ──> component action ──> JSON envelope
//! ```
//!
//! Validation failures are returned as `Err` so the HTTP layer can render
//! field errors. Every other failure becomes a [`DispatchResponse`].

mod arguments;
mod response;

pub use arguments::{hydrate, resolve, Hydrated};
pub use response::{
    back_with_errors, flash_notifications, DispatchResponse, ACTION_DATA_FLASH_KEY,
    ERRORS_FLASH_KEY, NOTIFICATIONS_FLASH_KEY,
};

use serde_json::{Map, Value};
use thiserror::Error;

use actionkit_core::{ActionError, ActionOutcome, Redirect, ValidationErrors};

use crate::context::RequestContext;
use crate::lang;
use crate::session::handler_key;
use crate::token::{ActionToken, ComponentPayload, StandalonePayload, TokenError};

/// Body keys that are never part of the standalone payload.
const RESERVED_KEYS: [&str; 3] = ["token", "_action_token", "action"];

/// An execution request as received by the HTTP layer.
#[derive(Debug, Clone, Default)]
pub struct ExecuteRequest {
    pub token: Option<String>,
    pub body: Map<String, Value>,

    /// The client expects navigation semantics rather than raw JSON.
    pub inertia: bool,
}

impl ExecuteRequest {
    /// Build a request from a JSON body, reading `token` from it.
    pub fn from_body(body: Map<String, Value>) -> Self {
        let token = body
            .get("token")
            .and_then(Value::as_str)
            .map(str::to_string);
        Self {
            token,
            body,
            inertia: false,
        }
    }

    pub fn with_inertia(mut self, inertia: bool) -> Self {
        self.inertia = inertia;
        self
    }

    /// Data for component actions: the `data` object, if any.
    fn component_data(&self) -> Map<String, Value> {
        self.body
            .get("data")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }

    /// Data for standalone actions: the `data` object when the key is
    /// present, otherwise the body without reserved keys.
    fn standalone_data(&self) -> Map<String, Value> {
        match self.body.get("data") {
            Some(data) => data.as_object().cloned().unwrap_or_default(),
            None => self
                .body
                .iter()
                .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        }
    }
}

/// Failures mapped to responses at the dispatch boundary.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{0}")]
    Decode(#[from] TokenError),

    #[error("{0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Handler(String),
}

/// Internal result: validation failures travel separately.
enum Failure {
    Validation(ValidationErrors),
    Dispatch(DispatchError),
}

impl From<DispatchError> for Failure {
    fn from(err: DispatchError) -> Self {
        Failure::Dispatch(err)
    }
}

impl From<TokenError> for Failure {
    fn from(err: TokenError) -> Self {
        Failure::Dispatch(DispatchError::Decode(err))
    }
}

impl From<ActionError> for Failure {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::Validation(errors) => Failure::Validation(errors),
            other => Failure::Dispatch(DispatchError::Handler(other.to_string())),
        }
    }
}

/// Execute a submitted action token.
pub fn execute(
    ctx: &RequestContext,
    request: &ExecuteRequest,
) -> Result<DispatchResponse, ValidationErrors> {
    match run(ctx, request) {
        Ok(response) => Ok(response),
        Err(Failure::Validation(errors)) => Err(errors),
        Err(Failure::Dispatch(err)) => Ok(failure_response(ctx, request, err)),
    }
}

fn run(ctx: &RequestContext, request: &ExecuteRequest) -> Result<DispatchResponse, Failure> {
    let token = request.token.as_deref().unwrap_or_default();
    match ctx.tokens().decode(token)? {
        ActionToken::Standalone(payload) => run_standalone(ctx, payload, request),
        ActionToken::Component(payload) => run_component(ctx, payload, request),
    }
}

fn run_component(
    ctx: &RequestContext,
    payload: ComponentPayload,
    request: &ExecuteRequest,
) -> Result<DispatchResponse, Failure> {
    let component = ctx
        .components()
        .get(&payload.component)
        .ok_or_else(|| DispatchError::NotFound("Component not found".to_string()))?;

    let mut action = component
        .find_action(&payload.action, ctx)
        .ok_or_else(|| DispatchError::NotFound("Action not found".to_string()))?;

    let key = payload.id.filter(|id| !id.is_blank());
    let record = key
        .as_ref()
        .and_then(|key| component.resolve_record(key, ctx));

    if !action.can_authorize(record.as_ref(), ctx) {
        tracing::warn!(
            component = %payload.component,
            action = %payload.action,
            "Action authorization failed"
        );
        return Err(DispatchError::Unauthorized.into());
    }

    if let Some(key) = &key {
        action.resolve_record_context(key, ctx);
    }

    let data = request.component_data();
    let outcome = action.execute(record.as_ref(), &data, ctx)?;

    match outcome {
        ActionOutcome::Redirect(redirect) => {
            tracing::info!(url = ?redirect.url(), "Action returned a redirect");
            Ok(DispatchResponse::redirect(redirect, flash_notifications(ctx)))
        }
        other => {
            flash_notifications(ctx);
            Ok(DispatchResponse::success(other.into_value()))
        }
    }
}

fn run_standalone(
    ctx: &RequestContext,
    payload: StandalonePayload,
    request: &ExecuteRequest,
) -> Result<DispatchResponse, Failure> {
    let key = handler_key(&payload.action_id);
    let Some(stored) = ctx.session().handler(&key) else {
        tracing::warn!(action_id = %payload.action_id, "Standalone handler missing or expired");
        let errors = ValidationErrors::with_message("action", lang::ACTION_EXPIRED);
        return Ok(back_with_errors(ctx, &errors));
    };
    if !stored.stable {
        ctx.session().forget_handler(&key);
    }

    let data = request.standalone_data();
    let hydrated = hydrate(&data, ctx);
    let args = resolve(stored.handler.params(), &data, &hydrated);

    tracing::debug!(action_id = %payload.action_id, args = args.len(), "Calling standalone handler");
    let outcome = stored.handler.call(ctx, &args)?;

    if let ActionOutcome::Redirect(redirect) = outcome {
        return Ok(DispatchResponse::redirect(redirect, flash_notifications(ctx)));
    }

    let mut action_data = args.written_data().unwrap_or(data);
    if let ActionOutcome::Value(Value::Object(result)) = outcome {
        action_data.extend(result);
    }

    ctx.session()
        .flash(ACTION_DATA_FLASH_KEY, Value::Object(action_data));
    let notifications = flash_notifications(ctx);

    Ok(DispatchResponse::redirect(Redirect::back(303), notifications))
}

fn failure_response(
    ctx: &RequestContext,
    request: &ExecuteRequest,
    err: DispatchError,
) -> DispatchResponse {
    match err {
        DispatchError::NotFound(message) => DispatchResponse::failure(404, message),
        DispatchError::Unauthorized => DispatchResponse::failure(403, lang::UNAUTHORIZED),
        DispatchError::Decode(_) | DispatchError::Handler(_) => {
            tracing::error!("Action execution failed: {}", err);
            let message = format!("{}: {}", lang::ACTION_FAILED, err);
            if request.inertia {
                back_with_errors(ctx, &ValidationErrors::with_message("action", message))
            } else {
                DispatchResponse::failure(500, message)
            }
        }
    }
}
