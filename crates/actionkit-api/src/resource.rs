//! Resources: the capability and URL surface of a model.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use heck::ToSnakeCase;

use actionkit_core::{Record, RecordKey};

use crate::auth::User;
use crate::lang;
use crate::schema::Field;

/// Operations a resource can allow or deny.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ViewAny,
    Create,
    View,
    Update,
    Delete,
    Restore,
    ForceDelete,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ViewAny => "view_any",
            Capability::Create => "create",
            Capability::View => "view",
            Capability::Update => "update",
            Capability::Delete => "delete",
            Capability::Restore => "restore",
            Capability::ForceDelete => "force_delete",
        }
    }
}

/// A model exposed through the admin panel.
pub trait Resource: Send + Sync {
    /// URL segment, e.g. `posts`.
    fn slug(&self) -> &str;

    /// Singular label, e.g. `Post`.
    fn label(&self) -> &str;

    /// Model name used by the record store.
    fn model(&self) -> &str;

    fn has_page(&self, page: &str) -> bool;

    /// URL of a page, optionally for a record.
    fn url(&self, page: &str, record: Option<&RecordKey>) -> String;

    fn can(&self, capability: Capability, user: Option<&User>, record: Option<&Record>) -> bool;

    /// Whether create/edit happen in modals on the list page.
    fn manages_records_in_modals(&self) -> bool {
        false
    }

    /// Form used by modal create/edit.
    fn form_schema(&self) -> Vec<Field> {
        Vec::new()
    }

    /// Name of the list page: `list` when registered, otherwise `index`.
    fn list_page(&self) -> &'static str {
        if self.has_page("list") {
            "list"
        } else {
            "index"
        }
    }
}

// =============================================================================
// Resource Definition
// =============================================================================

/// A capability check for one operation.
pub type Policy = Arc<dyn Fn(Option<&User>, Option<&Record>) -> bool + Send + Sync>;

/// How a [`ResourceDefinition`] answers capability checks.
#[derive(Clone, Default)]
enum PolicyMode {
    /// Everything is allowed unless a policy says otherwise.
    #[default]
    Open,
    /// Each capability needs the `{capability}_{model}` permission.
    Permissions,
}

/// Declarative [`Resource`] implementation.
#[derive(Clone)]
pub struct ResourceDefinition {
    slug: String,
    label: String,
    model: String,
    base_path: String,
    pages: Vec<String>,
    modal_form: Option<Vec<Field>>,
    policies: HashMap<Capability, Policy>,
    mode: PolicyMode,
}

impl ResourceDefinition {
    /// Create a resource for a model with `list`, `create`, `edit` and `view` pages.
    pub fn new(slug: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            slug: slug.into(),
            label: lang::headline(&model),
            model,
            base_path: "/admin".to_string(),
            pages: ["list", "create", "edit", "view"]
                .iter()
                .map(|p| p.to_string())
                .collect(),
            modal_form: None,
            policies: HashMap::new(),
            mode: PolicyMode::Open,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_base_path(mut self, path: impl Into<String>) -> Self {
        self.base_path = path.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_pages<I, S>(mut self, pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pages = pages.into_iter().map(Into::into).collect();
        self
    }

    /// Manage records in modals on a single `index` page.
    pub fn with_modal_crud(mut self, form: Vec<Field>) -> Self {
        self.modal_form = Some(form);
        self.pages = vec!["index".to_string()];
        self
    }

    /// Override the check for one capability.
    pub fn with_policy<F>(mut self, capability: Capability, policy: F) -> Self
    where
        F: Fn(Option<&User>, Option<&Record>) -> bool + Send + Sync + 'static,
    {
        self.policies.insert(capability, Arc::new(policy));
        self
    }

    /// Require `{capability}_{model}` permissions (e.g. `delete_blog_post`).
    pub fn with_permission_checks(mut self) -> Self {
        self.mode = PolicyMode::Permissions;
        self
    }

    /// Permission name for a capability.
    pub fn permission_for(&self, capability: Capability) -> String {
        format!("{}_{}", capability.as_str(), self.model.to_snake_case())
    }
}

impl Resource for ResourceDefinition {
    fn slug(&self) -> &str {
        &self.slug
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn has_page(&self, page: &str) -> bool {
        self.pages.iter().any(|p| p == page)
    }

    fn url(&self, page: &str, record: Option<&RecordKey>) -> String {
        let base = format!("{}/{}", self.base_path, self.slug);
        match (page, record) {
            ("list" | "index", _) => base,
            ("view", Some(key)) => format!("{}/{}", base, key),
            (page, Some(key)) => format!("{}/{}/{}", base, key, page),
            (page, None) => format!("{}/{}", base, page),
        }
    }

    fn can(&self, capability: Capability, user: Option<&User>, record: Option<&Record>) -> bool {
        if let Some(policy) = self.policies.get(&capability) {
            return policy(user, record);
        }
        match self.mode {
            PolicyMode::Open => true,
            PolicyMode::Permissions => {
                let permission = self.permission_for(capability);
                user.map(|u| u.permissions.contains(&permission))
                    .unwrap_or(false)
            }
        }
    }

    fn manages_records_in_modals(&self) -> bool {
        self.modal_form.is_some()
    }

    fn form_schema(&self) -> Vec<Field> {
        self.modal_form.clone().unwrap_or_default()
    }
}

impl fmt::Debug for ResourceDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDefinition")
            .field("slug", &self.slug)
            .field("model", &self.model)
            .field("pages", &self.pages)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_urls() {
        let posts = ResourceDefinition::new("posts", "Post");
        let key = RecordKey::from(3);

        assert_eq!(posts.url("list", None), "/admin/posts");
        assert_eq!(posts.url("create", None), "/admin/posts/create");
        assert_eq!(posts.url("edit", Some(&key)), "/admin/posts/3/edit");
        assert_eq!(posts.url("view", Some(&key)), "/admin/posts/3");
        assert_eq!(posts.list_page(), "list");
    }

    #[test]
    fn test_modal_crud_uses_index() {
        let tags = ResourceDefinition::new("tags", "Tag").with_modal_crud(vec![Field::text("name")]);
        assert!(tags.manages_records_in_modals());
        assert_eq!(tags.list_page(), "index");
        assert_eq!(tags.form_schema().len(), 1);
    }

    #[test]
    fn test_permission_checks() {
        let posts = ResourceDefinition::new("posts", "BlogPost").with_permission_checks();
        assert_eq!(posts.permission_for(Capability::ForceDelete), "force_delete_blog_post");

        let editor = User::new(1, "Editor").with_permission("delete_blog_post");
        assert!(posts.can(Capability::Delete, Some(&editor), None));
        assert!(!posts.can(Capability::Restore, Some(&editor), None));
        assert!(!posts.can(Capability::Delete, None, None));
    }

    #[test]
    fn test_policy_overrides() {
        let posts = ResourceDefinition::new("posts", "Post").with_policy(
            Capability::Update,
            |_, record| record.and_then(|r| r.get("locked")) != Some(&json!(true)),
        );
        let locked = Record::from_value(&json!({"id": 1, "locked": true})).unwrap();

        assert!(!posts.can(Capability::Update, None, Some(&locked)));
        assert!(posts.can(Capability::Delete, None, Some(&locked)));
    }
}
