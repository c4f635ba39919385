//! The action definition.
//!
//! An [`Action`] combines the capability mixins with an identity, an
//! optional handler, authorization rules and client navigation hints. It
//! produces the serialized view consumed by the UI and the token the UI
//! submits back to the dispatcher.
//!
//! An action takes one of two token strategies:
//! - *standalone*: it carries a [`Handler`], which is stored in the session
//!   under a generated action id and referenced from the token
//! - *component*: it carries a [`ComponentContext`] and is looked up again
//!   by name on the component at dispatch time
//!
//! A handler always wins when both are present.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use actionkit_core::{ActionOutcome, ActionResult, Record, RecordKey};

use crate::auth::{PermissionCheck, User};
use crate::context::RequestContext;
use crate::handler::{Argument, Arguments, Handler};
use crate::mixins::{ActionUrl, Condition, Modal, Presentation, Scope, UrlSource, Visibility};
use crate::schema::{self, Field};
use crate::session::handler_key;
use crate::token::ActionToken;

/// Custom authorization predicate.
pub type AuthorizeFn = Arc<dyn Fn(Option<&Record>, Option<&User>) -> bool + Send + Sync>;

/// Computes pre-filled modal form data from a record.
pub type FillFormFn = Arc<dyn Fn(&Record) -> ActionResult<Map<String, Value>> + Send + Sync>;

/// How the UI renders the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Button,
    Link,
    Icon,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Button => "button",
            Variant::Link => "link",
            Variant::Icon => "icon",
        }
    }
}

/// The component an action belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentContext {
    /// Registered component name.
    pub class: String,
    pub id: Option<RecordKey>,
    pub panel: Option<String>,
}

impl ComponentContext {
    pub fn new(class: impl Into<String>, id: Option<RecordKey>, panel: Option<String>) -> Self {
        Self {
            class: class.into(),
            id,
            panel,
        }
    }
}

/// Behavior layered onto an action by the built-in catalog.
///
/// Every hook defaults to doing nothing.
pub trait ActionExtension: Send + Sync {
    /// Configure the action from a concrete record id.
    fn resolve_record_context(&self, _action: &mut Action, _key: &RecordKey, _ctx: &RequestContext) {}

    /// Adjust the action right before it is serialized.
    fn before_serialize(&self, _action: &mut Action, _record: Option<&Record>, _ctx: &RequestContext) {}

    /// Add keys to the serialized view. Runs before null filtering.
    fn after_serialize(
        &self,
        _action: &Action,
        _record: Option<&Record>,
        _ctx: &RequestContext,
        _out: &mut Map<String, Value>,
    ) {
    }

    /// Replace direct execution. `None` falls through to the handler.
    fn execute(
        &self,
        _action: &Action,
        _record: Option<&Record>,
        _data: &Map<String, Value>,
        _ctx: &RequestContext,
    ) -> Option<ActionResult<ActionOutcome>> {
        None
    }
}

/// A declarative, authorizable unit of backend behavior bound to a UI control.
#[derive(Clone)]
pub struct Action {
    name: Option<String>,
    presentation: Presentation,
    visibility: Visibility,
    modal: Modal,
    url: ActionUrl,

    tooltip: Option<String>,
    size: Option<String>,
    variant: Variant,
    outlined: bool,
    disabled: bool,
    extra_attributes: Map<String, Value>,

    method: String,
    is_submit: bool,
    submit_form: Option<String>,
    preserve_state: bool,
    preserve_scroll: bool,

    handler: Option<Handler>,
    action_url: Option<String>,
    stable_id: Option<String>,
    cached_token: Option<String>,
    component: Option<ComponentContext>,

    authorize: Option<AuthorizeFn>,
    required_permission: Option<String>,
    required_ability: Option<String>,

    fill_form: Option<FillFormFn>,
    extension: Option<Arc<dyn ActionExtension>>,
}

impl Default for Action {
    fn default() -> Self {
        Self {
            name: None,
            presentation: Presentation::default(),
            visibility: Visibility::default(),
            modal: Modal::default(),
            url: ActionUrl::default(),
            tooltip: None,
            size: None,
            variant: Variant::Button,
            outlined: false,
            disabled: false,
            extra_attributes: Map::new(),
            method: "POST".to_string(),
            is_submit: false,
            submit_form: None,
            preserve_state: true,
            preserve_scroll: true,
            handler: None,
            action_url: None,
            stable_id: None,
            cached_token: None,
            component: None,
            authorize: None,
            required_permission: None,
            required_ability: None,
            fill_form: None,
            extension: None,
        }
    }
}

impl Action {
    /// Create an action with a name.
    pub fn make(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    // =========================================================================
    // Identity and presentation
    // =========================================================================

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.presentation.label = Some(label.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.presentation.icon = Some(icon.into());
        self
    }

    pub fn with_icon_position(mut self, position: impl Into<String>) -> Self {
        self.presentation.icon_position = position.into();
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.presentation.color = Some(color.into());
        self
    }

    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn with_outlined(mut self, outlined: bool) -> Self {
        self.outlined = outlined;
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    /// Render as a text link.
    pub fn link(self) -> Self {
        self.with_variant(Variant::Link)
    }

    pub fn button(self) -> Self {
        self.with_variant(Variant::Button)
    }

    /// Render as an icon-only button.
    pub fn icon_button(self) -> Self {
        self.with_variant(Variant::Icon)
    }

    pub fn with_extra_attributes(mut self, attributes: Map<String, Value>) -> Self {
        self.extra_attributes = attributes;
        self
    }

    // =========================================================================
    // Visibility
    // =========================================================================

    pub fn hidden(mut self, condition: impl Into<Condition>) -> Self {
        self.visibility.set_hidden(condition);
        self
    }

    pub fn visible(mut self, condition: impl Into<Condition>) -> Self {
        self.visibility.set_visible(condition);
        self
    }

    // =========================================================================
    // Modal
    // =========================================================================

    pub fn requires_confirmation(mut self, value: bool) -> Self {
        self.modal.requires_confirmation = value;
        self
    }

    /// Force a modal even without confirmation or schema.
    pub fn with_modal(mut self, value: bool) -> Self {
        self.modal.enabled = value;
        self
    }

    pub fn with_modal_heading(mut self, heading: impl Into<String>) -> Self {
        self.modal.heading = Some(heading.into());
        self
    }

    pub fn with_modal_description(mut self, description: impl Into<String>) -> Self {
        self.modal.description = Some(description.into());
        self
    }

    pub fn with_modal_submit_label(mut self, label: impl Into<String>) -> Self {
        self.modal.submit_label = Some(label.into());
        self
    }

    pub fn with_modal_cancel_label(mut self, label: impl Into<String>) -> Self {
        self.modal.cancel_label = Some(label.into());
        self
    }

    pub fn with_modal_icon(mut self, icon: impl Into<String>) -> Self {
        self.modal.icon = Some(icon.into());
        self
    }

    pub fn with_modal_icon_color(mut self, color: impl Into<String>) -> Self {
        self.modal.icon_color = Some(color.into());
        self
    }

    pub fn with_modal_width(mut self, width: impl Into<String>) -> Self {
        self.modal.width = Some(width.into());
        self
    }

    pub fn with_form_schema(mut self, schema: Vec<Field>) -> Self {
        self.modal.form_schema = schema;
        self
    }

    pub fn with_infolist_schema(mut self, schema: Vec<Field>) -> Self {
        self.modal.infolist_schema = schema;
        self
    }

    pub fn with_modal_content(mut self, content: impl Into<String>) -> Self {
        self.modal.content = Some(content.into());
        self
    }

    pub fn view_only(mut self, value: bool) -> Self {
        self.modal.view_only = value;
        self
    }

    pub fn slide_over(mut self, value: bool) -> Self {
        self.modal.set_slide_over(value);
        self
    }

    pub fn requires_password(mut self, value: bool) -> Self {
        self.modal.set_requires_password(value);
        self
    }

    /// Pre-fill the modal form from the record being rendered.
    pub fn fill_form<F>(mut self, f: F) -> Self
    where
        F: Fn(&Record) -> ActionResult<Map<String, Value>> + Send + Sync + 'static,
    {
        self.fill_form = Some(Arc::new(f));
        self
    }

    // =========================================================================
    // Navigation and behavior
    // =========================================================================

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.set_url(url);
        self
    }

    /// Resolve the URL from the record being rendered.
    pub fn with_url_using<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&Record) -> Option<String> + Send + Sync + 'static,
    {
        self.url.source = Some(UrlSource::Resolver(Arc::new(resolver)));
        self
    }

    pub fn open_url_in_new_tab(mut self, value: bool) -> Self {
        self.url.open_in_new_tab = value;
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.set_method(method);
        self
    }

    /// Submit the surrounding form instead of calling the backend.
    pub fn submit(mut self, value: bool) -> Self {
        self.is_submit = value;
        self
    }

    pub fn with_submit_form(mut self, form: impl Into<String>) -> Self {
        self.submit_form = Some(form.into());
        self.is_submit = true;
        self
    }

    pub fn preserve_state(mut self, value: bool) -> Self {
        self.preserve_state = value;
        self
    }

    pub fn preserve_scroll(mut self, value: bool) -> Self {
        self.preserve_scroll = value;
        self
    }

    /// Override the URL the UI submits the token to.
    pub fn with_action_url(mut self, url: impl Into<String>) -> Self {
        self.action_url = Some(url.into());
        self
    }

    // =========================================================================
    // Handler, identity and component
    // =========================================================================

    /// Set a `(record, data)` handler.
    pub fn action<F>(self, f: F) -> Self
    where
        F: Fn(&RequestContext, Option<&Record>, &Map<String, Value>) -> ActionResult<ActionOutcome>
            + Send
            + Sync
            + 'static,
    {
        self.with_handler(Handler::record_and_data(f))
    }

    pub fn with_handler(mut self, handler: Handler) -> Self {
        self.set_handler(handler);
        self
    }

    /// Give the action a request-independent identity.
    pub fn with_stable_id(mut self, id: impl Into<String>) -> Self {
        self.stable_id = Some(id.into());
        self
    }

    pub fn component(mut self, context: ComponentContext) -> Self {
        self.component = Some(context);
        self
    }

    pub fn with_extension(mut self, extension: Arc<dyn ActionExtension>) -> Self {
        self.extension = Some(extension);
        self
    }

    // =========================================================================
    // Authorization
    // =========================================================================

    pub fn authorize<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&Record>, Option<&User>) -> bool + Send + Sync + 'static,
    {
        self.authorize = Some(Arc::new(f));
        self
    }

    /// Require a named permission.
    pub fn can(mut self, permission: impl Into<String>) -> Self {
        self.required_permission = Some(permission.into());
        self
    }

    /// Require a gate ability, checked against the record when there is one.
    pub fn ability(mut self, ability: impl Into<String>) -> Self {
        self.required_ability = Some(ability.into());
        self
    }

    // =========================================================================
    // In-place setters
    // =========================================================================

    pub fn set_handler(&mut self, handler: Handler) {
        self.handler = Some(handler);
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url.source = Some(UrlSource::Static(url.into()));
    }

    pub fn set_open_url_in_new_tab(&mut self, value: bool) {
        self.url.open_in_new_tab = value;
    }

    pub fn set_method(&mut self, method: impl Into<String>) {
        self.method = method.into();
    }

    pub fn set_form_schema(&mut self, schema: Vec<Field>) {
        self.modal.form_schema = schema;
    }

    pub fn set_hidden(&mut self, condition: impl Into<Condition>) {
        self.visibility.set_hidden(condition);
    }

    /// Drop the component context, making the action standalone.
    pub fn clear_component(&mut self) {
        self.component = None;
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The explicit label, or the title-cased name.
    pub fn label(&self) -> Option<String> {
        self.presentation.label(self.name())
    }

    pub fn icon(&self) -> Option<&str> {
        self.presentation.icon.as_deref()
    }

    pub fn color(&self) -> Option<&str> {
        self.presentation.color.as_deref()
    }

    pub fn tooltip(&self) -> Option<&str> {
        self.tooltip.as_deref()
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    pub fn has_modal(&self) -> bool {
        self.modal.has_modal()
    }

    pub fn modal_heading(&self) -> Option<String> {
        self.modal.heading(self.label().as_deref())
    }

    pub fn modal_description(&self) -> Option<String> {
        self.modal.description(self.label().as_deref())
    }

    pub fn modal_icon(&self) -> Option<String> {
        self.modal.icon(self.icon())
    }

    pub fn modal_icon_color(&self) -> Option<String> {
        self.modal.icon_color(self.color())
    }

    pub fn url(&self, record: Option<&Record>) -> Option<String> {
        self.url.resolve(record)
    }

    pub fn handler(&self) -> Option<&Handler> {
        self.handler.as_ref()
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    pub fn stable_id(&self) -> Option<&str> {
        self.stable_id.as_deref()
    }

    pub fn component_context(&self) -> Option<&ComponentContext> {
        self.component.as_ref()
    }

    /// Whether serialization yields a token.
    pub fn has_token_target(&self) -> bool {
        self.handler.is_some() || self.component.is_some()
    }

    pub fn required_permission(&self) -> Option<&str> {
        self.required_permission.as_deref()
    }

    pub fn required_ability(&self) -> Option<&str> {
        self.required_ability.as_deref()
    }

    /// Submission URL: the explicit one, else the configured execute route.
    pub fn action_url(&self, ctx: &RequestContext) -> String {
        self.action_url
            .clone()
            .unwrap_or_else(|| ctx.config().routes.execute.clone())
    }

    /// Evaluate visibility against a record.
    pub fn is_hidden(&self, record: Option<&Record>, ctx: &RequestContext) -> bool {
        let scope = Scope::new(ctx, self.component.as_ref().map(|c| c.class.as_str()));
        self.visibility.is_hidden(record, &scope)
    }

    // =========================================================================
    // Authorization
    // =========================================================================

    /// Run the authorization chain.
    ///
    /// Order: super admin bypass, required permission (an undefined
    /// permission is allowed), required ability, custom predicate.
    pub fn can_authorize(&self, record: Option<&Record>, ctx: &RequestContext) -> bool {
        let user = ctx.user();
        let authorizer = ctx.authorizer();
        let super_admin = &ctx.config().super_admin;

        if let Some(user) = user {
            if super_admin.enabled && authorizer.has_role(user, &super_admin.role) {
                return true;
            }
        }

        if let Some(permission) = &self.required_permission {
            let Some(user) = user else {
                return false;
            };
            match authorizer.has_permission(user, permission) {
                PermissionCheck::Denied => return false,
                PermissionCheck::Undefined => {
                    tracing::debug!(permission = %permission, "Permission not defined, allowing")
                }
                PermissionCheck::Granted => {}
            }
        }

        if let Some(ability) = &self.required_ability {
            if !authorizer.allows(user, ability, record) {
                return false;
            }
        }

        match &self.authorize {
            Some(authorize) => authorize(record, user),
            None => true,
        }
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Invoke the handler with `(record, data)`. Without a handler, returns empty.
    pub fn execute(
        &self,
        record: Option<&Record>,
        data: &Map<String, Value>,
        ctx: &RequestContext,
    ) -> ActionResult<ActionOutcome> {
        if let Some(extension) = &self.extension {
            if let Some(result) = extension.execute(self, record, data, ctx) {
                return result;
            }
        }

        match &self.handler {
            Some(handler) => {
                let args = Arguments::new(vec![record.into(), Argument::Data(data.clone())]);
                handler.call(ctx, &args)
            }
            None => Ok(ActionOutcome::Empty),
        }
    }

    /// Configure the action from a concrete record id.
    pub fn resolve_record_context(&mut self, key: &RecordKey, ctx: &RequestContext) -> &mut Self {
        if let Some(extension) = self.extension.clone() {
            extension.resolve_record_context(self, key, ctx);
        }
        self
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    /// Get the invocation token.
    ///
    /// Actions with a handler get a standalone token; actions bound to a
    /// component get a component token; other actions have none.
    pub fn get_action_token(&mut self, ctx: &RequestContext) -> Option<String> {
        let panel = self
            .component
            .as_ref()
            .and_then(|c| c.panel.clone())
            .or_else(|| ctx.panel().map(str::to_string));

        if let Some(handler) = self.handler.clone() {
            return self.standalone_token(handler, panel, ctx);
        }

        let component = self.component.as_ref()?;
        let token = ActionToken::component(
            component.class.clone(),
            component.id.clone(),
            self.name.clone().unwrap_or_default(),
            panel,
        );
        seal(&token, ctx)
    }

    fn standalone_token(
        &mut self,
        handler: Handler,
        panel: Option<String>,
        ctx: &RequestContext,
    ) -> Option<String> {
        if let Some(stable_id) = &self.stable_id {
            let action_id = format!("action_{}", stable_id);
            ctx.session().put_handler(&handler_key(&action_id), handler, true);
            self.action_url
                .get_or_insert_with(|| ctx.config().routes.execute.clone());
            return seal(&ActionToken::standalone(action_id, panel), ctx);
        }

        if let Some(token) = &self.cached_token {
            return Some(token.clone());
        }

        let action_id = format!(
            "action_{}_{}",
            self.name.as_deref().unwrap_or_default(),
            Uuid::new_v4().simple()
        );
        ctx.session().put_handler(&handler_key(&action_id), handler, false);
        self.action_url
            .get_or_insert_with(|| ctx.config().routes.execute.clone());

        let token = seal(&ActionToken::standalone(action_id.clone(), panel), ctx)?;
        tracing::debug!(action_id = %action_id, "Stored standalone handler");
        self.cached_token = Some(token.clone());
        Some(token)
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Serialize without a record.
    pub fn to_array(&mut self, ctx: &RequestContext) -> Map<String, Value> {
        self.to_array_with_record(None, ctx)
    }

    /// Serialize for the UI, evaluating visibility and form data against a record.
    ///
    /// Keys whose value is `null` or `""` are dropped.
    pub fn to_array_with_record(
        &mut self,
        record: Option<&Record>,
        ctx: &RequestContext,
    ) -> Map<String, Value> {
        let extension = self.extension.clone();
        if let Some(extension) = &extension {
            extension.before_serialize(self, record, ctx);
        }

        let has_handler = self.handler.is_some();
        let action_url = has_handler.then(|| self.action_url(ctx));
        let action_token = if self.has_token_target() {
            self.get_action_token(ctx)
        } else {
            None
        };

        let mut out = Map::new();
        out.insert("name".into(), opt(self.name.clone()));
        out.insert("label".into(), opt(self.label()));
        out.insert("color".into(), opt(self.presentation.color.clone()));
        out.insert("icon".into(), opt(self.presentation.icon.clone()));
        out.insert(
            "iconPosition".into(),
            Value::String(self.presentation.icon_position.clone()),
        );
        out.insert("url".into(), opt(self.url(record)));
        out.insert("openUrlInNewTab".into(), Value::Bool(self.url.open_in_new_tab));
        out.insert(
            "requiresConfirmation".into(),
            Value::Bool(self.modal.requires_confirmation),
        );
        out.insert("hasModal".into(), Value::Bool(self.has_modal()));
        out.insert("modalHeading".into(), opt(self.modal_heading()));
        out.insert("modalDescription".into(), opt(self.modal_description()));
        out.insert(
            "modalSubmitActionLabel".into(),
            opt(self.modal.submit_label.clone()),
        );
        out.insert(
            "modalCancelActionLabel".into(),
            opt(self.modal.cancel_label.clone()),
        );
        out.insert("modalIcon".into(), opt(self.modal_icon()));
        out.insert("modalIconColor".into(), opt(self.modal_icon_color()));
        out.insert(
            "modalFormSchema".into(),
            schema_value(&self.modal.form_schema),
        );
        out.insert(
            "modalFormController".into(),
            opt(self.component.as_ref().map(|c| c.class.clone())),
        );
        out.insert(
            "modalFormData".into(),
            self.form_data(record).map(Value::Object).unwrap_or(Value::Null),
        );
        out.insert(
            "modalInfolistSchema".into(),
            schema_value(&self.modal.infolist_schema),
        );
        out.insert("modalWidth".into(), opt(self.modal.width.clone()));
        out.insert("isViewOnly".into(), Value::Bool(self.modal.view_only));
        out.insert(
            "requiresPassword".into(),
            Value::Bool(self.modal.requires_password),
        );
        out.insert("modalContent".into(), opt(self.modal.content.clone()));
        out.insert("slideOver".into(), Value::Bool(self.modal.slide_over));
        out.insert("isHidden".into(), Value::Bool(self.is_hidden(record, ctx)));
        out.insert("isDisabled".into(), Value::Bool(self.disabled));
        out.insert("isOutlined".into(), Value::Bool(self.outlined));
        out.insert("size".into(), opt(self.size.clone()));
        out.insert(
            "variant".into(),
            Value::String(self.variant.as_str().to_string()),
        );
        out.insert("tooltip".into(), opt(self.tooltip.clone()));
        out.insert(
            "extraAttributes".into(),
            Value::Object(self.extra_attributes.clone()),
        );
        out.insert("hasAction".into(), Value::Bool(has_handler));
        out.insert("actionUrl".into(), opt(action_url));
        out.insert("actionToken".into(), opt(action_token));
        out.insert("preserveState".into(), Value::Bool(self.preserve_state));
        out.insert("preserveScroll".into(), Value::Bool(self.preserve_scroll));
        out.insert("method".into(), Value::String(self.method.clone()));
        out.insert("isSubmit".into(), Value::Bool(self.is_submit));
        out.insert("submitForm".into(), opt(self.submit_form.clone()));

        if let Some(extension) = &extension {
            extension.after_serialize(self, record, ctx, &mut out);
        }

        filter_blank(out)
    }

    /// Modal form data: filled from the record when possible, else schema defaults.
    fn form_data(&self, record: Option<&Record>) -> Option<Map<String, Value>> {
        if let (Some(fill), Some(record)) = (&self.fill_form, record) {
            match fill(record) {
                Ok(data) => return Some(data),
                Err(e) => {
                    tracing::warn!(action = ?self.name, "Failed to fill modal form: {}", e);
                }
            }
        }

        if self.modal.form_schema.is_empty() {
            return None;
        }
        Some(schema::default_form_data(&self.modal.form_schema))
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("label", &self.presentation.label)
            .field("method", &self.method)
            .field("has_handler", &self.handler.is_some())
            .field("stable_id", &self.stable_id)
            .field("component", &self.component)
            .finish_non_exhaustive()
    }
}

fn seal(token: &ActionToken, ctx: &RequestContext) -> Option<String> {
    match ctx.tokens().encode(token) {
        Ok(sealed) => Some(sealed),
        Err(e) => {
            tracing::warn!("Failed to encode action token: {}", e);
            None
        }
    }
}

fn opt<T: Into<Value>>(value: Option<T>) -> Value {
    value.map(Into::into).unwrap_or(Value::Null)
}

fn schema_value(fields: &[Field]) -> Value {
    Value::Array(
        fields
            .iter()
            .filter_map(|field| serde_json::to_value(field).ok())
            .collect(),
    )
}

/// Drop `null` and `""` values. `false`, `0` and empty collections stay.
pub(crate) fn filter_blank(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .filter(|(_, value)| match value {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::GateAuthorizer;
    use crate::services::ActionServices;
    use crate::session::{MemorySession, SessionStore};
    use crate::token::StandalonePayload;
    use actionkit_core::{ActionError, ActionsConfig};
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_value(&value).unwrap()
    }

    fn services() -> Arc<ActionServices> {
        Arc::new(ActionServices::new(ActionsConfig::default()).unwrap())
    }

    fn context(services: &Arc<ActionServices>) -> RequestContext {
        RequestContext::new(services.clone(), Arc::new(MemorySession::new()))
    }

    fn noop(action: Action) -> Action {
        action.action(|_, _, _| Ok(ActionOutcome::Empty))
    }

    #[test]
    fn test_can_authorize_without_rules() {
        let ctx = RequestContext::testing();
        let action = Action::make("publish");

        assert!(action.can_authorize(None, &ctx));
        assert!(action.can_authorize(Some(&record(json!({"id": 1}))), &ctx));
    }

    #[test]
    fn test_can_authorize_custom_predicate_false() {
        let ctx = RequestContext::testing();
        let action = Action::make("publish").authorize(|_, _| false);

        assert!(!action.can_authorize(None, &ctx));
        assert!(!action.can_authorize(Some(&record(json!({"id": 1}))), &ctx));
    }

    #[test]
    fn test_can_authorize_permission_chain() {
        let authorizer = Arc::new(GateAuthorizer::new());
        authorizer.define_permissions(["publish_post"]);
        let services = Arc::new(
            ActionServices::new(ActionsConfig::default())
                .unwrap()
                .with_authorizer(authorizer),
        );

        let action = Action::make("publish").can("publish_post");

        let guest = context(&services);
        assert!(!action.can_authorize(None, &guest));

        let editor = context(&services).with_user(Some(User::new(1, "Editor")));
        assert!(!action.can_authorize(None, &editor));

        let publisher = context(&services)
            .with_user(Some(User::new(2, "Publisher").with_permission("publish_post")));
        assert!(action.can_authorize(None, &publisher));

        let admin = context(&services)
            .with_user(Some(User::new(3, "Admin").with_role("super_admin")));
        assert!(action.clone().authorize(|_, _| false).can_authorize(None, &admin));
    }

    #[test]
    fn test_can_authorize_undefined_permission_allows() {
        let ctx = RequestContext::testing().with_user(Some(User::new(1, "Editor")));
        let action = Action::make("publish").can("not_defined");
        assert!(action.can_authorize(None, &ctx));
    }

    #[test]
    fn test_can_authorize_ability_sees_record() {
        let authorizer = Arc::new(GateAuthorizer::new());
        authorizer.define("archive-post", |_, record| {
            record.map(|r| r.get("status") == Some(&json!("draft"))).unwrap_or(false)
        });
        let services = Arc::new(
            ActionServices::new(ActionsConfig::default())
                .unwrap()
                .with_authorizer(authorizer),
        );
        let ctx = context(&services);
        let action = Action::make("archive").ability("archive-post");

        assert!(action.can_authorize(Some(&record(json!({"id": 1, "status": "draft"}))), &ctx));
        assert!(!action.can_authorize(Some(&record(json!({"id": 1, "status": "live"}))), &ctx));
        assert!(!action.can_authorize(None, &ctx));
    }

    #[test]
    fn test_execute_without_handler_is_empty() {
        let ctx = RequestContext::testing();
        let action = Action::make("open").with_url("/docs");

        let outcome = action.execute(None, &Map::new(), &ctx).unwrap();
        assert!(outcome.is_empty());
    }

    #[test]
    fn test_execute_passes_record_and_data() {
        let ctx = RequestContext::testing();
        let action = Action::make("rename").action(|_, record, data| {
            let id = record.and_then(|r| r.key()).map(|k| k.to_string());
            Ok(json!({"id": id, "title": data.get("title")}).into())
        });

        let mut data = Map::new();
        data.insert("title".into(), json!("Hello"));
        let outcome = action
            .execute(Some(&record(json!({"id": 7}))), &data, &ctx)
            .unwrap();

        assert_eq!(outcome.into_value(), json!({"id": "7", "title": "Hello"}));
    }

    #[test]
    fn test_execute_propagates_validation() {
        let ctx = RequestContext::testing();
        let action = Action::make("save").action(|_, _, _| {
            Err(ActionError::Validation(actionkit_core::ValidationErrors::with_message(
                "title", "required",
            )))
        });

        let err = action.execute(None, &Map::new(), &ctx).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_token_is_cached_for_non_stable_action() {
        let ctx = RequestContext::testing();
        let mut action = noop(Action::make("publish"));

        let first = action.get_action_token(&ctx).unwrap();
        let second = action.get_action_token(&ctx).unwrap();
        assert_eq!(first, second);

        let payload: StandalonePayload = ctx.tokens().open(&first).unwrap();
        assert!(payload.action_id.starts_with("action_publish_"));
        assert!(ctx.session().handler(&handler_key(&payload.action_id)).is_some());
    }

    #[test]
    fn test_stable_id_survives_requests() {
        let services = services();

        let first_ctx = context(&services);
        let mut first = noop(Action::make("create")).with_stable_id("posts_create");
        let first_token = first.get_action_token(&first_ctx).unwrap();

        let second_ctx = context(&services);
        let mut second = noop(Action::make("create")).with_stable_id("posts_create");
        let second_token = second.get_action_token(&second_ctx).unwrap();

        let a: StandalonePayload = services.tokens().open(&first_token).unwrap();
        let b: StandalonePayload = services.tokens().open(&second_token).unwrap();
        assert_eq!(a.action_id, "action_posts_create");
        assert_eq!(a.action_id, b.action_id);

        let stored = second_ctx.session().handler("action.action_posts_create").unwrap();
        assert!(stored.stable);
    }

    #[test]
    fn test_handler_wins_over_component() {
        let ctx = RequestContext::testing();
        let mut action = noop(Action::make("publish"))
            .component(ComponentContext::new("posts.edit", None, None));

        let token = action.get_action_token(&ctx).unwrap();
        assert!(matches!(
            ctx.tokens().decode(&token).unwrap(),
            ActionToken::Standalone(_)
        ));
    }

    #[test]
    fn test_component_token_carries_panel() {
        let ctx = RequestContext::testing().with_panel(Some("admin".to_string()));
        let mut action = Action::make("publish").component(ComponentContext::new(
            "posts.edit",
            Some(RecordKey::from(3)),
            None,
        ));

        let token = action.get_action_token(&ctx).unwrap();
        assert_eq!(
            ctx.tokens().decode(&token).unwrap(),
            ActionToken::component("posts.edit", Some(RecordKey::from(3)), "publish", Some("admin".to_string()))
        );
    }

    #[test]
    fn test_action_without_target_has_no_token() {
        let ctx = RequestContext::testing();
        let mut action = Action::make("docs").with_url("/docs");
        assert!(action.get_action_token(&ctx).is_none());
        assert!(!action.to_array(&ctx).contains_key("actionToken"));
    }

    #[test]
    fn test_filter_blank_keeps_zero_and_false() {
        let filtered = filter_blank(
            json!({"a": 0, "b": null, "c": "", "d": false, "e": []})
                .as_object()
                .cloned()
                .unwrap(),
        );

        assert_eq!(filtered.get("a"), Some(&json!(0)));
        assert_eq!(filtered.get("d"), Some(&json!(false)));
        assert_eq!(filtered.get("e"), Some(&json!([])));
        assert!(!filtered.contains_key("b"));
        assert!(!filtered.contains_key("c"));
    }

    #[test]
    fn test_to_array_filters_null_and_empty() {
        let ctx = RequestContext::testing();
        let mut action = Action::make("export").with_tooltip("");

        let out = action.to_array(&ctx);

        assert!(out.values().all(|v| !v.is_null() && v != &json!("")));
        assert!(!out.contains_key("tooltip"));
        assert!(!out.contains_key("modalHeading"));
        assert_eq!(out.get("requiresConfirmation"), Some(&json!(false)));
        assert_eq!(out.get("modalFormSchema"), Some(&json!([])));
        assert_eq!(out.get("extraAttributes"), Some(&json!({})));
        assert_eq!(out.get("hasAction"), Some(&json!(false)));
    }

    #[test]
    fn test_export_without_confirmation_has_no_heading() {
        let action = Action::make("export");
        assert_eq!(action.modal_heading(), None);
    }

    #[test]
    fn test_confirmation_heading_uses_label() {
        let action = Action::make("remove")
            .with_label("Delete")
            .requires_confirmation(true);
        assert_eq!(action.modal_heading().as_deref(), Some("Confirm Delete"));
    }

    #[test]
    fn test_fill_form_failure_falls_back_to_defaults() {
        let ctx = RequestContext::testing();
        let mut action = Action::make("rename")
            .with_form_schema(vec![Field::text("title").with_default("Untitled")])
            .fill_form(|_| Err(ActionError::handler("boom")));

        let out = action.to_array_with_record(Some(&record(json!({"id": 1}))), &ctx);
        assert_eq!(out.get("modalFormData"), Some(&json!({"title": "Untitled"})));
    }

    #[test]
    fn test_fill_form_uses_record() {
        let ctx = RequestContext::testing();
        let mut action = Action::make("rename")
            .with_form_schema(vec![Field::text("title")])
            .fill_form(|record| {
                let mut data = Map::new();
                data.insert("title".into(), record.get("title").cloned().unwrap_or(Value::Null));
                Ok(data)
            });

        let out = action.to_array_with_record(Some(&record(json!({"id": 1, "title": "Hi"}))), &ctx);
        assert_eq!(out.get("modalFormData"), Some(&json!({"title": "Hi"})));
    }

    #[test]
    fn test_serialized_view() {
        let ctx = RequestContext::testing();
        let mut action = Action::make("archive")
            .with_icon("Archive")
            .with_color("warning")
            .requires_confirmation(true)
            .with_stable_id("posts_archive")
            .action(|_, _, _| Ok(ActionOutcome::Empty));

        let mut out = action.to_array(&ctx);
        let token = out.remove("actionToken");
        assert!(token.is_some());

        insta::assert_json_snapshot!(Value::Object(out), @r###"
        {
          "actionUrl": "/actions/execute",
          "color": "warning",
          "extraAttributes": {},
          "hasAction": true,
          "hasModal": true,
          "icon": "Archive",
          "iconPosition": "before",
          "isDisabled": false,
          "isHidden": false,
          "isOutlined": false,
          "isSubmit": false,
          "isViewOnly": false,
          "label": "Archive",
          "method": "POST",
          "modalDescription": "Are you sure you want to Archive?",
          "modalFormSchema": [],
          "modalHeading": "Confirm Archive",
          "modalIcon": "Archive",
          "modalIconColor": "warning",
          "modalInfolistSchema": [],
          "name": "archive",
          "openUrlInNewTab": false,
          "preserveScroll": true,
          "preserveState": true,
          "requiresConfirmation": true,
          "requiresPassword": false,
          "slideOver": false,
          "variant": "button"
        }
        "###);
    }
}
