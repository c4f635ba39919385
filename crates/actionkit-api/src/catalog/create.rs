//! Create: a navigation action or a modal form.

use std::sync::Arc;

use serde_json::{Map, Value};

use actionkit_core::{ActionOutcome, ActionResult, Notification, Record};

use crate::action::{Action, ActionExtension};
use crate::context::RequestContext;
use crate::handler::Handler;
use crate::lang;
use crate::mixins::Condition;
use crate::resource::Capability;
use crate::schema::Field;

use super::{bound_resource, catalog_action, rebuild};

/// Create a record of `model` from the form data and notify.
fn create_record(model: String) -> Handler {
    Handler::record_and_data(move |ctx, _, data| {
        let record = ctx.records().insert(&model, data.clone())?;
        ctx.notify(Notification::success(lang::SUCCESS).body(lang::CREATED));
        Ok(ActionOutcome::Value(record.to_value()))
    })
}

/// Configures the action from the bound resource on first serialization.
struct AutoConfigure;

impl ActionExtension for AutoConfigure {
    fn before_serialize(&self, action: &mut Action, _record: Option<&Record>, ctx: &RequestContext) {
        let Some(resource) = bound_resource(action, ctx) else {
            return;
        };
        let label = format!("{} {}", lang::CREATE, resource.label());

        if resource.manages_records_in_modals() {
            let slug = resource.slug().to_string();
            let handler = create_record(resource.model().to_string());
            let form = resource.form_schema();
            rebuild(action, |action| {
                modal_form(action, form)
                    .with_stable_id(format!("{}_create", slug))
                    .with_label(label.clone())
                    .with_modal_heading(label)
                    .with_handler(handler)
            });
        } else {
            let url = resource.url("create", None);
            rebuild(action, |action| {
                action.with_label(label).with_method("GET").with_url(url)
            });
        }
        tracing::debug!(resource = %resource.slug(), "Auto-configured create action");
    }
}

fn modal_form(action: Action, schema: Vec<Field>) -> Action {
    action
        .with_modal(true)
        .with_form_schema(schema)
        .with_modal_submit_label(lang::CREATE)
        .with_modal_cancel_label(lang::CANCEL)
        .with_modal_width("lg")
        .preserve_state(false)
        .with_method("POST")
}

/// Create a record.
///
/// Unless configured explicitly with [`CreateAction::form_schema`], the
/// action configures itself from the bound resource: modal-managed
/// resources get a modal form with a stable id, others navigate to the
/// `create` page.
pub struct CreateAction {
    action: Action,
    model: Option<String>,
    configured: bool,
}

impl CreateAction {
    pub fn make() -> Self {
        Self::named("create")
    }

    pub fn named(name: &str) -> Self {
        Self {
            action: Action::make(name)
                .with_icon("Plus")
                .with_color("primary")
                .hidden(Condition::simple(|scope| !scope.can(Capability::Create, None))),
            model: None,
            configured: false,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Turn the action into a modal form.
    pub fn form_schema(mut self, schema: Vec<Field>) -> Self {
        self.action = modal_form(self.action, schema);
        self.configured = true;
        self
    }

    /// Handle submissions with a `(record, data)` closure.
    pub fn using<F>(mut self, f: F) -> Self
    where
        F: Fn(&RequestContext, Option<&Record>, &Map<String, Value>) -> ActionResult<ActionOutcome>
            + Send
            + Sync
            + 'static,
    {
        self.action = self.action.action(f);
        self
    }

    /// Handle submissions by creating a record of the configured model.
    pub fn using_model(mut self) -> Self {
        if let Some(model) = self.model.clone() {
            self.action = self.action.with_handler(create_record(model));
        }
        self
    }

    pub fn into_action(self) -> Action {
        if self.configured {
            self.action
        } else {
            self.action.with_extension(Arc::new(AutoConfigure))
        }
    }
}

catalog_action!(CreateAction);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::{bind, context, context_with};
    use crate::records::RecordStore;
    use crate::resource::ResourceDefinition;
    use crate::session::SessionStore;
    use actionkit_core::RecordKey;
    use serde_json::json;

    #[test]
    fn test_navigates_to_create_page() {
        let ctx = context();
        let mut action = bind(CreateAction::make().into());

        let out = action.to_array(&ctx);

        assert_eq!(out["label"], json!("Create Post"));
        assert_eq!(out["url"], json!("/admin/posts/create"));
        assert_eq!(out["method"], json!("GET"));
        assert_eq!(out["isHidden"], json!(false));
    }

    #[test]
    fn test_modal_resource_gets_stable_form() {
        let ctx = context_with(
            ResourceDefinition::new("posts", "post")
                .with_modal_crud(vec![Field::text("title").with_default("Untitled")]),
        );
        let mut action = bind(CreateAction::make().into());

        let out = action.to_array(&ctx);

        assert_eq!(out["hasModal"], json!(true));
        assert_eq!(out["modalHeading"], json!("Create Post"));
        assert_eq!(out["modalWidth"], json!("lg"));
        assert_eq!(out["modalFormData"], json!({"title": "Untitled"}));
        assert_eq!(out["preserveState"], json!(false));
        assert_eq!(action.stable_id(), Some("posts_create"));
        assert!(ctx.session().handler("action.action_posts_create").is_some());
    }

    #[test]
    fn test_hidden_without_create_permission() {
        let ctx = context_with(
            ResourceDefinition::new("posts", "post").with_policy(Capability::Create, |_, _| false),
        );
        let action = bind(CreateAction::make().into());

        assert!(action.is_hidden(None, &ctx));
    }

    #[test]
    fn test_explicit_form_schema_skips_auto_configuration() {
        let ctx = context();
        let mut action = bind(
            CreateAction::make()
                .with_model("post")
                .form_schema(vec![Field::text("title")])
                .using_model()
                .into(),
        );

        let out = action.to_array(&ctx);
        assert!(!out.contains_key("url"));
        assert_eq!(out["modalSubmitActionLabel"], json!("Create"));
        assert_eq!(out["hasAction"], json!(true));

        let data = json!({"title": "New"}).as_object().cloned().unwrap();
        let outcome = action.execute(None, &data, &ctx).unwrap();
        assert_eq!(outcome.into_value()["title"], json!("New"));
        assert_eq!(ctx.records().find_many("post", &[RecordKey::from(1)]).len(), 1);
        assert_eq!(ctx.take_notifications()[0].body.as_deref(), Some(lang::CREATED));
    }
}
