//! Edit and view: navigation to a record page.

use std::sync::Arc;

use actionkit_core::{Record, RecordKey};

use crate::action::{Action, ActionExtension};
use crate::context::RequestContext;
use crate::lang;
use crate::mixins::Condition;
use crate::resource::Capability;

use super::{bound_resource, catalog_action};

/// Points the action at a resource page for the record.
struct PageLink {
    page: &'static str,
}

impl PageLink {
    fn link(&self, action: &mut Action, key: &RecordKey, ctx: &RequestContext) {
        if let Some(resource) = bound_resource(action, ctx) {
            action.set_url(resource.url(self.page, Some(key)));
        }
    }
}

impl ActionExtension for PageLink {
    fn resolve_record_context(&self, action: &mut Action, key: &RecordKey, ctx: &RequestContext) {
        self.link(action, key, ctx);
    }

    // Table rows are serialized with a record but without record context.
    fn before_serialize(&self, action: &mut Action, record: Option<&Record>, ctx: &RequestContext) {
        if action.url(record).is_some() {
            return;
        }
        if let Some(key) = record.and_then(Record::key) {
            self.link(action, &key, ctx);
        }
    }
}

/// Navigate to the record's edit page.
pub struct EditAction {
    action: Action,
}

impl EditAction {
    pub fn make() -> Self {
        Self::named("edit")
    }

    pub fn named(name: &str) -> Self {
        Self {
            action: Action::make(name)
                .with_label(lang::EDIT)
                .with_icon("Pencil")
                .with_color("warning")
                .with_tooltip(lang::TOOLTIP_EDIT)
                .with_method("GET")
                .hidden(Condition::record(|record, scope| {
                    record.is_trashed() || !scope.can(Capability::Update, Some(record))
                }))
                .with_extension(Arc::new(PageLink { page: "edit" })),
        }
    }

    pub fn into_action(self) -> Action {
        self.action
    }
}

catalog_action!(EditAction);

/// Navigate to the record's view page.
pub struct ViewAction {
    action: Action,
}

impl ViewAction {
    pub fn make() -> Self {
        Self::named("view")
    }

    pub fn named(name: &str) -> Self {
        Self {
            action: Action::make(name)
                .with_label(lang::VIEW)
                .with_icon("Eye")
                .with_color("secondary")
                .with_tooltip(lang::TOOLTIP_VIEW)
                .with_method("GET")
                .hidden(Condition::record(|record, scope| {
                    !scope.can(Capability::View, Some(record))
                }))
                .with_extension(Arc::new(PageLink { page: "view" })),
        }
    }

    pub fn into_action(self) -> Action {
        self.action
    }
}

catalog_action!(ViewAction);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::{bind, context, context_with, insert, trashed};
    use crate::resource::ResourceDefinition;
    use serde_json::json;

    #[test]
    fn test_edit_url_from_record_context() {
        let ctx = context();
        let mut action = bind(EditAction::make().into());

        action.resolve_record_context(&RecordKey::from(5), &ctx);

        assert_eq!(action.url(None).as_deref(), Some("/admin/posts/5/edit"));
        assert_eq!(action.method(), "GET");
    }

    #[test]
    fn test_view_url_from_serialized_record() {
        let ctx = context();
        let record = insert(&ctx, json!({"title": "Hello"}));
        let mut action = bind(ViewAction::make().into());

        let out = action.to_array_with_record(Some(&record), &ctx);

        assert_eq!(out["url"], json!("/admin/posts/1"));
        assert_eq!(out["isHidden"], json!(false));
        assert_eq!(out["method"], json!("GET"));
    }

    #[test]
    fn test_edit_hidden_for_trashed_or_denied() {
        let ctx = context();
        let gone = trashed(&ctx);
        let action = bind(EditAction::make().into());
        assert!(action.is_hidden(Some(&gone), &ctx));

        let ctx = context_with(
            ResourceDefinition::new("posts", "post").with_policy(Capability::Update, |_, _| false),
        );
        let live = insert(&ctx, json!({"title": "Live"}));
        assert!(action.is_hidden(Some(&live), &ctx));
    }

    #[test]
    fn test_unbound_action_has_no_url() {
        let ctx = context();
        let mut action: Action = EditAction::make().into();

        action.resolve_record_context(&RecordKey::from(5), &ctx);
        assert!(action.url(None).is_none());
    }
}
