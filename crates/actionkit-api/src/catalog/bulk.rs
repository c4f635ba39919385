//! Bulk delete, restore and force delete.

use std::sync::Arc;

use actionkit_core::{ActionOutcome, ActionResult, Notification, RecordKey};

use crate::auth::PermissionCheck;
use crate::bulk::BulkAction;
use crate::handler::Handler;
use crate::lang;
use crate::mixins::{Condition, Scope};
use crate::records::RecordStore;
use crate::resource::{Capability, Resource};

use heck::ToSnakeCase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BulkOperation {
    Delete,
    Restore,
    ForceDelete,
}

impl BulkOperation {
    fn capability(self) -> Capability {
        match self {
            BulkOperation::Delete => Capability::Delete,
            BulkOperation::Restore => Capability::Restore,
            BulkOperation::ForceDelete => Capability::ForceDelete,
        }
    }

    fn apply(self, store: &dyn RecordStore, model: &str, keys: &[RecordKey]) -> ActionResult<usize> {
        match self {
            BulkOperation::Delete => store.delete_many(model, keys),
            BulkOperation::Restore => store.restore_many(model, keys),
            BulkOperation::ForceDelete => store.force_delete_many(model, keys),
        }
    }

    fn message(self, count: usize) -> String {
        match self {
            BulkOperation::Delete => lang::bulk_deleted(count),
            BulkOperation::Restore => lang::bulk_restored(count),
            BulkOperation::ForceDelete => lang::bulk_force_deleted(count),
        }
    }

    /// Handler over the submitted ids. An empty selection only warns.
    fn handler(self, model: String) -> Handler {
        Handler::bulk(move |ctx, selection, _| {
            if selection.is_empty() {
                ctx.notify(
                    Notification::warning(lang::NO_SELECTION_TITLE).body(lang::NO_SELECTION_BODY),
                );
                return Ok(ActionOutcome::Empty);
            }

            let count = self.apply(ctx.records(), &model, &selection.keys())?;
            tracing::info!(model = %model, count, operation = ?self, "Applied bulk operation");
            ctx.notify(Notification::success(lang::SUCCESS).body(self.message(count)));
            Ok(ActionOutcome::Empty)
        })
    }

    /// Visible when the resource allows the operation. Without a resource,
    /// the `{capability}_{model}` permission is checked for signed-in users.
    fn visible(self, model: Option<String>, resource: Option<Arc<dyn Resource>>) -> Condition {
        Condition::simple(move |scope: &Scope<'_>| {
            if let Some(resource) = &resource {
                return resource.can(self.capability(), scope.user(), None);
            }
            let (Some(model), Some(user)) = (&model, scope.user()) else {
                return true;
            };
            let permission = format!("{}_{}", self.capability().as_str(), model.to_snake_case());
            !matches!(
                scope.ctx.authorizer().has_permission(user, &permission),
                PermissionCheck::Denied
            )
        })
    }
}

/// Shared state of the bulk lifecycle actions.
struct Builder {
    bulk: BulkAction,
    operation: BulkOperation,
    model: Option<String>,
    resource: Option<Arc<dyn Resource>>,
}

impl Builder {
    fn new(operation: BulkOperation, bulk: BulkAction) -> Self {
        Self {
            bulk,
            operation,
            model: None,
            resource: None,
        }
    }

    fn build(self) -> BulkAction {
        let visible = self.operation.visible(self.model.clone(), self.resource);
        let mut bulk = self.bulk;
        bulk.action_mut().set_hidden(visible.negate());
        if let Some(model) = self.model {
            if !bulk.has_handler() {
                bulk.action_mut().set_handler(self.operation.handler(model));
            }
        }
        bulk
    }
}

macro_rules! bulk_catalog_action {
    ($ty:ident) => {
        impl $ty {
            /// Operate on records of this model.
            pub fn model(mut self, model: impl Into<String>) -> Self {
                self.inner.model = Some(model.into());
                self
            }

            /// Check visibility against this resource.
            pub fn with_resource(mut self, resource: Arc<dyn Resource>) -> Self {
                self.inner.resource = Some(resource);
                self
            }

            pub fn get_model(&self) -> Option<&str> {
                self.inner.model.as_deref()
            }

            /// Apply builder methods to the wrapped bulk action.
            pub fn configure(mut self, f: impl FnOnce(BulkAction) -> BulkAction) -> Self {
                self.inner.bulk = f(self.inner.bulk);
                self
            }

            pub fn into_bulk_action(self) -> BulkAction {
                self.inner.build()
            }
        }

        impl From<$ty> for BulkAction {
            fn from(value: $ty) -> Self {
                value.into_bulk_action()
            }
        }
    };
}

/// Soft delete the selected records.
pub struct DeleteBulkAction {
    inner: Builder,
}

impl DeleteBulkAction {
    pub fn make() -> Self {
        let bulk = BulkAction::make("delete").configure(|action| {
            action
                .with_label(lang::DELETE_SELECTED)
                .with_icon("Trash2")
                .with_color("destructive")
                .with_modal_description(lang::BULK_DELETE_DESCRIPTION)
                .preserve_state(false)
        });
        Self {
            inner: Builder::new(BulkOperation::Delete, bulk.deselect_records_after_completion(true)),
        }
    }
}

bulk_catalog_action!(DeleteBulkAction);

/// Restore the selected trashed records.
pub struct RestoreBulkAction {
    inner: Builder,
}

impl RestoreBulkAction {
    pub fn make() -> Self {
        let bulk = BulkAction::make("restore")
            .configure(|action| {
                action
                    .with_label(lang::RESTORE)
                    .with_icon("RotateCcw")
                    .with_color("success")
                    .with_modal_heading(lang::BULK_RESTORE_TITLE)
                    .with_modal_description(lang::BULK_RESTORE_DESCRIPTION)
                    .preserve_state(false)
            })
            .deselect_records_after_completion(true)
            .with_view_flag("visibleWhenTrashed", true)
            .with_view_flag("hiddenWhenNotTrashed", true);
        Self {
            inner: Builder::new(BulkOperation::Restore, bulk),
        }
    }
}

bulk_catalog_action!(RestoreBulkAction);

/// Permanently delete the selected records.
pub struct ForceDeleteBulkAction {
    inner: Builder,
}

impl ForceDeleteBulkAction {
    pub fn make() -> Self {
        let bulk = BulkAction::make("force-delete")
            .configure(|action| {
                action
                    .with_label(lang::FORCE_DELETE)
                    .with_icon("Trash2")
                    .with_color("destructive")
                    .with_modal_heading(lang::BULK_FORCE_DELETE_TITLE)
                    .with_modal_description(lang::BULK_FORCE_DELETE_DESCRIPTION)
                    .preserve_state(false)
            })
            .deselect_records_after_completion(true)
            .with_view_flag("visibleWhenTrashed", true)
            .with_view_flag("hiddenWhenNotTrashed", true);
        Self {
            inner: Builder::new(BulkOperation::ForceDelete, bulk),
        }
    }
}

bulk_catalog_action!(ForceDeleteBulkAction);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{GateAuthorizer, User};
    use crate::catalog::testing::{context, insert, trashed};
    use crate::context::RequestContext;
    use crate::resource::ResourceDefinition;
    use crate::services::ActionServices;
    use crate::session::MemorySession;
    use actionkit_core::{ActionsConfig, NotificationLevel, Selection};
    use serde_json::{json, Map};

    fn keys(ids: &[i64]) -> Vec<RecordKey> {
        ids.iter().copied().map(RecordKey::from).collect()
    }

    #[test]
    fn test_delete_bulk_defaults() {
        let ctx = context();
        let mut bulk: BulkAction = DeleteBulkAction::make().into();

        let out = bulk.to_array(&ctx);
        assert_eq!(out["name"], json!("delete"));
        assert_eq!(out["label"], json!("Delete Selected"));
        assert_eq!(out["requiresConfirmation"], json!(true));
        assert_eq!(out["isBulkAction"], json!(true));
        assert!(!out.contains_key("actionToken"));
    }

    #[test]
    fn test_restore_bulk_view_flags() {
        let ctx = context();
        let mut bulk: BulkAction = RestoreBulkAction::make().model("post").into();

        let out = bulk.to_array(&ctx);
        assert_eq!(out["visibleWhenTrashed"], json!(true));
        assert_eq!(out["hiddenWhenNotTrashed"], json!(true));
        assert_eq!(out["deselectRecordsAfterCompletion"], json!(true));
        assert_eq!(out["hasAction"], json!(true));
    }

    #[test]
    fn test_model_handler_deletes_selection() {
        let ctx = context();
        insert(&ctx, json!({"title": "A"}));
        insert(&ctx, json!({"title": "B"}));
        insert(&ctx, json!({"title": "C"}));

        let mut bulk: BulkAction = DeleteBulkAction::make().model("post").into();
        bulk.execute_for_records(keys(&[1, 2]), &Map::new(), &ctx).unwrap();

        assert!(ctx.records().find("post", &RecordKey::from(1)).is_none());
        assert!(ctx.records().find("post", &RecordKey::from(3)).is_some());
        let notifications = ctx.take_notifications();
        assert_eq!(notifications[0].body.as_deref(), Some("2 records deleted"));
    }

    #[test]
    fn test_restore_handler_counts_restored() {
        let ctx = context();
        let gone = trashed(&ctx);
        insert(&ctx, json!({"title": "Live"}));

        let mut bulk: BulkAction = RestoreBulkAction::make().model("post").into();
        let selection = vec![gone.key().unwrap(), RecordKey::from(2)];
        bulk.execute_for_records(selection, &Map::new(), &ctx).unwrap();

        assert_eq!(
            ctx.take_notifications()[0].body.as_deref(),
            Some("1 records restored")
        );
    }

    #[test]
    fn test_empty_selection_warns() {
        let ctx = context();
        let mut bulk: BulkAction = ForceDeleteBulkAction::make().model("post").into();

        bulk.execute_for_records(Selection::default(), &Map::new(), &ctx).unwrap();

        let notifications = ctx.take_notifications();
        assert_eq!(notifications[0].level, NotificationLevel::Warning);
        assert_eq!(notifications[0].title, lang::NO_SELECTION_TITLE);
    }

    #[test]
    fn test_visibility_from_resource() {
        let ctx = context();
        let resource: Arc<dyn Resource> = Arc::new(
            ResourceDefinition::new("posts", "post")
                .with_policy(Capability::Restore, |_, _| false),
        );

        let bulk: BulkAction = RestoreBulkAction::make().with_resource(resource).into();
        assert!(bulk.is_hidden(None, &ctx));

        let bulk: BulkAction = RestoreBulkAction::make().into();
        assert!(!bulk.is_hidden(None, &ctx));
    }

    #[test]
    fn test_visibility_from_model_permission() {
        let authorizer = Arc::new(GateAuthorizer::new());
        authorizer.define_permissions(["restore_blog_post"]);
        let services = ActionServices::new(ActionsConfig::default())
            .unwrap()
            .with_authorizer(authorizer);
        let services = Arc::new(services);

        let bulk: BulkAction = RestoreBulkAction::make().model("BlogPost").into();

        let editor = User::new(1, "Editor").with_permission("restore_blog_post");
        let ctx = RequestContext::new(services.clone(), Arc::new(MemorySession::new()))
            .with_user(Some(editor));
        assert!(!bulk.is_hidden(None, &ctx));

        let viewer = User::new(2, "Viewer");
        let ctx = RequestContext::new(services, Arc::new(MemorySession::new()))
            .with_user(Some(viewer));
        assert!(bulk.is_hidden(None, &ctx));
    }
}
