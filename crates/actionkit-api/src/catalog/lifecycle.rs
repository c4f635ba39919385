//! Delete, force delete and restore.

use std::sync::Arc;

use actionkit_core::{ActionError, ActionOutcome, ActionResult, Notification, RecordKey, Redirect};

use crate::action::{Action, ActionExtension};
use crate::context::RequestContext;
use crate::handler::Handler;
use crate::lang;
use crate::mixins::Condition;
use crate::resource::{Capability, Resource};

use super::{bound_resource, catalog_action};

/// A record lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Delete,
    ForceDelete,
    Restore,
}

impl Lifecycle {
    fn capability(self) -> Capability {
        match self {
            Lifecycle::Delete => Capability::Delete,
            Lifecycle::ForceDelete => Capability::ForceDelete,
            Lifecycle::Restore => Capability::Restore,
        }
    }

    fn message(self) -> &'static str {
        match self {
            Lifecycle::Delete => lang::DELETED,
            Lifecycle::ForceDelete => lang::FORCE_DELETED,
            Lifecycle::Restore => lang::RESTORED,
        }
    }

    /// Hidden unless the record's trashed state fits and the resource allows it.
    fn hidden(self) -> Condition {
        Condition::record(move |record, scope| {
            let applicable = match self {
                Lifecycle::Delete => !record.is_trashed(),
                Lifecycle::ForceDelete | Lifecycle::Restore => record.is_trashed(),
            };
            !applicable || !scope.can(self.capability(), Some(record))
        })
    }

    /// Load the record, re-check the capability, apply, and redirect to the list page.
    fn run(
        self,
        ctx: &RequestContext,
        resource: &dyn Resource,
        key: &RecordKey,
    ) -> ActionResult<ActionOutcome> {
        let store = ctx.records();
        let model = resource.model();

        let record = match self {
            Lifecycle::Delete => store.find(model, key),
            Lifecycle::ForceDelete | Lifecycle::Restore => store.find_with_trashed(model, key),
        }
        .ok_or_else(|| ActionError::NotFound(format!("{} {}", model, key)))?;

        if !resource.can(self.capability(), ctx.user(), Some(&record)) {
            return Err(ActionError::Unauthorized);
        }

        match self {
            Lifecycle::Delete => store.delete(model, key)?,
            Lifecycle::ForceDelete => store.force_delete(model, key)?,
            Lifecycle::Restore => store.restore(model, key)?,
        };
        tracing::info!(model, key = %key, operation = ?self, "Applied record operation");

        ctx.notify(Notification::success(lang::SUCCESS).body(self.message()));
        Ok(Redirect::to(resource.url(resource.list_page(), None)).into())
    }
}

struct LifecycleExtension(Lifecycle);

impl ActionExtension for LifecycleExtension {
    fn resolve_record_context(&self, action: &mut Action, key: &RecordKey, ctx: &RequestContext) {
        if action.has_handler() {
            return;
        }
        let Some(resource) = bound_resource(action, ctx) else {
            return;
        };

        let operation = self.0;
        let key = key.clone();
        action.set_handler(Handler::no_args(move |ctx| {
            operation.run(ctx, resource.as_ref(), &key)
        }));
        action.clear_component();
    }
}

fn lifecycle_action(operation: Lifecycle, name: &str) -> Action {
    Action::make(name)
        .requires_confirmation(true)
        .preserve_state(false)
        .hidden(operation.hidden())
        .with_extension(Arc::new(LifecycleExtension(operation)))
}

// =============================================================================
// Actions
// =============================================================================

/// Soft delete a record, then return to the list page.
pub struct DeleteAction {
    action: Action,
}

impl DeleteAction {
    pub fn make() -> Self {
        Self::named("delete")
    }

    pub fn named(name: &str) -> Self {
        Self {
            action: lifecycle_action(Lifecycle::Delete, name)
                .with_label(lang::DELETE)
                .with_icon("Trash2")
                .with_color("destructive")
                .with_tooltip(lang::TOOLTIP_DELETE),
        }
    }

    pub fn into_action(self) -> Action {
        self.action
    }
}

catalog_action!(DeleteAction);

/// Permanently delete a trashed record.
pub struct ForceDeleteAction {
    action: Action,
}

impl ForceDeleteAction {
    pub fn make() -> Self {
        Self::named("force-delete")
    }

    pub fn named(name: &str) -> Self {
        Self {
            action: lifecycle_action(Lifecycle::ForceDelete, name)
                .with_label(lang::FORCE_DELETE)
                .with_icon("Trash2")
                .with_color("destructive")
                .with_tooltip(lang::TOOLTIP_FORCE_DELETE)
                .with_modal_heading(lang::FORCE_DELETE_TITLE)
                .with_modal_description(lang::FORCE_DELETE_DESCRIPTION),
        }
    }

    pub fn into_action(self) -> Action {
        self.action
    }
}

catalog_action!(ForceDeleteAction);

/// Restore a trashed record.
pub struct RestoreAction {
    action: Action,
}

impl RestoreAction {
    pub fn make() -> Self {
        Self::named("restore")
    }

    pub fn named(name: &str) -> Self {
        Self {
            action: lifecycle_action(Lifecycle::Restore, name)
                .with_label(lang::RESTORE)
                .with_icon("RotateCcw")
                .with_color("success")
                .with_tooltip(lang::TOOLTIP_RESTORE)
                .with_modal_heading(lang::RESTORE_TITLE)
                .with_modal_description(lang::RESTORE_DESCRIPTION),
        }
    }

    pub fn into_action(self) -> Action {
        self.action
    }
}

catalog_action!(RestoreAction);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::{bind, context, context_with, insert, trashed};
    use crate::handler::Arguments;
    use crate::resource::ResourceDefinition;
    use actionkit_core::RedirectTarget;
    use serde_json::json;

    fn run_handler(action: &Action, ctx: &RequestContext) -> ActionResult<ActionOutcome> {
        action.handler().unwrap().call(ctx, &Arguments::default())
    }

    #[test]
    fn test_delete_defaults() {
        let action: Action = DeleteAction::make().into();

        assert_eq!(action.name(), Some("delete"));
        assert_eq!(action.icon(), Some("Trash2"));
        assert_eq!(action.color(), Some("destructive"));
        assert!(action.modal().requires_confirmation);
        assert_eq!(action.modal_heading().as_deref(), Some("Confirm Delete"));
    }

    #[test]
    fn test_delete_hidden_for_trashed_records() {
        let ctx = context();
        let action = bind(DeleteAction::make().into());
        let live = insert(&ctx, json!({"title": "Live"}));
        let gone = trashed(&ctx);

        assert!(!action.is_hidden(Some(&live), &ctx));
        assert!(action.is_hidden(Some(&gone), &ctx));
        assert!(!action.is_hidden(None, &ctx));
    }

    #[test]
    fn test_restore_and_force_delete_only_for_trashed() {
        let ctx = context();
        let live = insert(&ctx, json!({"title": "Live"}));
        let gone = trashed(&ctx);

        for action in [
            bind(RestoreAction::make().into()),
            bind(ForceDeleteAction::make().into()),
        ] {
            assert!(action.is_hidden(Some(&live), &ctx));
            assert!(!action.is_hidden(Some(&gone), &ctx));
        }
    }

    #[test]
    fn test_hidden_when_resource_denies() {
        let ctx = context_with(
            ResourceDefinition::new("posts", "post").with_policy(Capability::Delete, |_, _| false),
        );
        let action = bind(DeleteAction::make().into());
        let live = insert(&ctx, json!({"title": "Live"}));

        assert!(action.is_hidden(Some(&live), &ctx));
    }

    #[test]
    fn test_record_context_installs_delete_handler() {
        let ctx = context();
        let record = insert(&ctx, json!({"title": "Live"}));
        let key = record.key().unwrap();

        let mut action = bind(DeleteAction::make().into());
        action.resolve_record_context(&key, &ctx);

        assert!(action.has_handler());
        assert!(action.component_context().is_none());

        let outcome = run_handler(&action, &ctx).unwrap();
        let redirect = outcome.as_redirect().unwrap();
        assert_eq!(redirect.target, RedirectTarget::Url("/admin/posts".to_string()));
        assert!(ctx.records().find("post", &key).is_none());

        let notifications = ctx.take_notifications();
        assert_eq!(notifications[0].title, lang::SUCCESS);
        assert_eq!(notifications[0].body.as_deref(), Some(lang::DELETED));
    }

    #[test]
    fn test_record_context_keeps_existing_handler() {
        let ctx = context();
        let record = insert(&ctx, json!({"title": "Live"}));

        let mut action = bind(
            DeleteAction::make()
                .configure(|a| a.action(|_, _, _| Ok(ActionOutcome::Empty)))
                .into(),
        );
        action.resolve_record_context(&record.key().unwrap(), &ctx);

        run_handler(&action, &ctx).unwrap();
        assert!(ctx.records().find("post", &record.key().unwrap()).is_some());
    }

    #[test]
    fn test_restore_handler() {
        let ctx = context();
        let gone = trashed(&ctx);
        let key = gone.key().unwrap();

        let mut action = bind(RestoreAction::make().into());
        action.resolve_record_context(&key, &ctx);
        run_handler(&action, &ctx).unwrap();

        assert!(ctx.records().find("post", &key).is_some());
    }

    #[test]
    fn test_force_delete_handler_denied() {
        let ctx = context_with(
            ResourceDefinition::new("posts", "post")
                .with_policy(Capability::ForceDelete, |_, _| false),
        );
        let gone = trashed(&ctx);
        let key = gone.key().unwrap();

        let mut action = bind(ForceDeleteAction::make().into());
        action.resolve_record_context(&key, &ctx);

        let err = run_handler(&action, &ctx).unwrap_err();
        assert!(matches!(err, ActionError::Unauthorized));
        assert!(ctx.records().find_with_trashed("post", &key).is_some());
    }

    #[test]
    fn test_missing_record_is_not_found() {
        let ctx = context();
        let mut action = bind(DeleteAction::make().into());
        action.resolve_record_context(&RecordKey::from(404), &ctx);

        let err = run_handler(&action, &ctx).unwrap_err();
        assert!(matches!(err, ActionError::NotFound(_)));
    }
}
