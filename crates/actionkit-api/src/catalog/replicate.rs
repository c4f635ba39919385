//! Replicate: copy a record.

use std::sync::Arc;

use actionkit_core::{
    ActionError, ActionOutcome, ActionResult, Notification, Record, RecordKey, Redirect,
};
use serde_json::{Map, Value};

use crate::action::{Action, ActionExtension};
use crate::context::RequestContext;
use crate::handler::Handler;
use crate::lang;
use crate::records::find_or_fail;

use super::{bound_resource, catalog_action};

/// Called with `(replica, original)` around saving the replica.
pub type ReplicaHook = Arc<dyn Fn(&mut Record, &Record) + Send + Sync>;

#[derive(Clone, Default)]
struct Replicator {
    excluded: Vec<String>,
    before_saved: Option<ReplicaHook>,
    after_saved: Option<ReplicaHook>,
}

impl Replicator {
    /// Copy `original`, run the hooks and persist the replica under `model`.
    fn replicate(&self, ctx: &RequestContext, model: &str, original: &Record) -> ActionResult<Record> {
        let mut replica = original.replicate(&self.excluded);
        if let Some(hook) = &self.before_saved {
            hook(&mut replica, original);
        }

        let mut saved = ctx.records().insert(model, replica.attributes)?;
        if let Some(hook) = &self.after_saved {
            hook(&mut saved, original);
        }
        tracing::info!(model, key = ?saved.key(), "Replicated record");
        Ok(saved)
    }
}

impl ActionExtension for Replicator {
    fn resolve_record_context(&self, action: &mut Action, key: &RecordKey, ctx: &RequestContext) {
        if action.has_handler() {
            return;
        }
        let Some(resource) = bound_resource(action, ctx) else {
            return;
        };

        let replicator = self.clone();
        let key = key.clone();
        action.set_handler(Handler::no_args(move |ctx| {
            let original = find_or_fail(ctx.records(), resource.model(), &key)?;
            let replica = replicator.replicate(ctx, resource.model(), &original)?;
            let replica_key = replica
                .key()
                .ok_or_else(|| ActionError::Record("replica has no key".to_string()))?;

            ctx.notify(Notification::success(lang::SUCCESS).body(lang::REPLICATED));
            Ok(Redirect::to(resource.url("edit", Some(&replica_key))).into())
        }));
        action.clear_component();
    }

    fn execute(
        &self,
        action: &Action,
        record: Option<&Record>,
        _data: &Map<String, Value>,
        ctx: &RequestContext,
    ) -> Option<ActionResult<ActionOutcome>> {
        if action.has_handler() {
            return None;
        }
        let Some(record) = record else {
            return Some(Ok(ActionOutcome::Empty));
        };
        let Some(model) = record.model.as_deref() else {
            return Some(Err(ActionError::Record("record has no model".to_string())));
        };
        Some(
            self.replicate(ctx, model, record)
                .map(|replica| ActionOutcome::Value(replica.to_value())),
        )
    }
}

/// Copy a record, excluding its key and timestamps.
pub struct ReplicateAction {
    action: Action,
    replicator: Replicator,
}

impl ReplicateAction {
    pub fn make() -> Self {
        Self::named("replicate")
    }

    pub fn named(name: &str) -> Self {
        Self {
            action: Action::make(name)
                .with_label(lang::REPLICATE)
                .with_icon("Copy")
                .with_color("gray")
                .with_tooltip(lang::TOOLTIP_REPLICATE)
                .requires_confirmation(true)
                .with_modal_heading(lang::REPLICATE_TITLE)
                .with_modal_description(lang::REPLICATE_DESCRIPTION)
                .with_modal_submit_label(lang::REPLICATE),
            replicator: Replicator::default(),
        }
    }

    /// Attributes left out of the copy.
    pub fn exclude_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replicator.excluded = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn before_replica_saved<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Record, &Record) + Send + Sync + 'static,
    {
        self.replicator.before_saved = Some(Arc::new(f));
        self
    }

    pub fn after_replica_saved<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Record, &Record) + Send + Sync + 'static,
    {
        self.replicator.after_saved = Some(Arc::new(f));
        self
    }

    pub fn excluded_attributes(&self) -> &[String] {
        &self.replicator.excluded
    }

    pub fn into_action(self) -> Action {
        self.action.with_extension(Arc::new(self.replicator))
    }
}

catalog_action!(ReplicateAction);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::{bind, context, insert};
    use crate::handler::Arguments;
    use crate::records::RecordStore;
    use actionkit_core::RedirectTarget;
    use serde_json::json;

    fn replicate_action() -> ReplicateAction {
        ReplicateAction::make()
            .exclude_attributes(["slug"])
            .before_replica_saved(|replica, _| {
                let title = replica.get("title").and_then(Value::as_str).unwrap_or_default();
                let title = format!("{} (copy)", title);
                replica.set("title", json!(title));
            })
    }

    #[test]
    fn test_defaults() {
        let action: Action = ReplicateAction::make().into();
        assert_eq!(action.icon(), Some("Copy"));
        assert_eq!(action.modal_heading().as_deref(), Some(lang::REPLICATE_TITLE));
        assert!(action.modal().requires_confirmation);
    }

    #[test]
    fn test_record_context_replicates_and_redirects_to_edit() {
        let ctx = context();
        let original = insert(&ctx, json!({"title": "Hello", "slug": "hello"}));

        let mut action = bind(replicate_action().into());
        action.resolve_record_context(&original.key().unwrap(), &ctx);
        assert!(action.component_context().is_none());

        let outcome = action
            .handler()
            .unwrap()
            .call(&ctx, &Arguments::default())
            .unwrap();

        assert_eq!(
            outcome.as_redirect().unwrap().target,
            RedirectTarget::Url("/admin/posts/2/edit".to_string())
        );
        let replica = ctx.records().find("post", &RecordKey::from(2)).unwrap();
        assert_eq!(replica.get("title"), Some(&json!("Hello (copy)")));
        assert!(replica.get("slug").is_none());
        assert_eq!(ctx.take_notifications()[0].body.as_deref(), Some(lang::REPLICATED));
    }

    #[test]
    fn test_direct_execute() {
        let ctx = context();
        let original = insert(&ctx, json!({"title": "Hello"}));
        let action: Action = ReplicateAction::make()
            .after_replica_saved(|replica, original| {
                replica.set("copied_from", original.key().unwrap().as_value().clone());
            })
            .into();

        let outcome = action.execute(Some(&original), &Map::new(), &ctx).unwrap();

        let value = outcome.into_value();
        assert_eq!(value["title"], json!("Hello"));
        assert_eq!(value["copied_from"], json!(1));
        assert_eq!(value["id"], json!(2));
    }

    #[test]
    fn test_execute_without_record() {
        let ctx = context();
        let action: Action = ReplicateAction::make().into();
        let outcome = action.execute(None, &Map::new(), &ctx).unwrap();
        assert!(outcome.is_empty());
    }
}
