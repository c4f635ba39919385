//! Users and authorization.
//!
//! Actions never decide who may do what; they ask an [`Authorizer`].
//! The default [`GateAuthorizer`] checks role and permission names on the
//! user and evaluates named gates registered by the host.

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use actionkit_core::{Record, RecordKey};

/// The authenticated user of a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordKey,
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl User {
    pub fn new(id: impl Into<RecordKey>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            roles: Vec::new(),
            permissions: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Result of a permission lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionCheck {
    Granted,
    Denied,
    /// The permission is not defined at all.
    Undefined,
}

/// Authorization service consumed by actions.
pub trait Authorizer: Send + Sync {
    fn has_role(&self, user: &User, role: &str) -> bool;

    fn has_permission(&self, user: &User, permission: &str) -> PermissionCheck;

    /// Evaluate a named ability, optionally against a record.
    fn allows(&self, user: Option<&User>, ability: &str, record: Option<&Record>) -> bool;
}

/// A gate callback: `(user, record) -> allowed`.
pub type Gate = Arc<dyn Fn(Option<&User>, Option<&Record>) -> bool + Send + Sync>;

/// Role/permission authorizer with host-defined gates.
///
/// Permissions that were never defined report [`PermissionCheck::Undefined`]
/// so freshly added actions stay usable until permissions are generated.
/// Undefined gates deny.
#[derive(Default)]
pub struct GateAuthorizer {
    permissions: RwLock<HashSet<String>>,
    gates: RwLock<HashMap<String, Gate>>,
}

impl GateAuthorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare permissions that exist in the system.
    pub fn define_permissions<I, S>(&self, permissions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions
            .write()
            .extend(permissions.into_iter().map(Into::into));
    }

    /// Define a gate.
    pub fn define<F>(&self, ability: impl Into<String>, gate: F)
    where
        F: Fn(Option<&User>, Option<&Record>) -> bool + Send + Sync + 'static,
    {
        let ability = ability.into();
        tracing::debug!("Defined gate: {}", ability);
        self.gates.write().insert(ability, Arc::new(gate));
    }
}

impl Authorizer for GateAuthorizer {
    fn has_role(&self, user: &User, role: &str) -> bool {
        user.has_role(role)
    }

    fn has_permission(&self, user: &User, permission: &str) -> PermissionCheck {
        if !self.permissions.read().contains(permission) {
            return PermissionCheck::Undefined;
        }
        if user.permissions.iter().any(|p| p == permission) {
            PermissionCheck::Granted
        } else {
            PermissionCheck::Denied
        }
    }

    fn allows(&self, user: Option<&User>, ability: &str, record: Option<&Record>) -> bool {
        let gate = self.gates.read().get(ability).cloned();
        match gate {
            Some(gate) => gate(user, record),
            None => {
                tracing::debug!("No gate defined for ability: {}", ability);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_permission_checks() {
        let authorizer = GateAuthorizer::new();
        authorizer.define_permissions(["delete_post"]);

        let editor = User::new(1, "Editor").with_permission("delete_post");
        let viewer = User::new(2, "Viewer");

        assert_eq!(
            authorizer.has_permission(&editor, "delete_post"),
            PermissionCheck::Granted
        );
        assert_eq!(
            authorizer.has_permission(&viewer, "delete_post"),
            PermissionCheck::Denied
        );
        assert_eq!(
            authorizer.has_permission(&viewer, "publish_post"),
            PermissionCheck::Undefined
        );
    }

    #[test]
    fn test_gates() {
        let authorizer = GateAuthorizer::new();
        authorizer.define("update-post", |user, record| {
            match (user, record.and_then(|r| r.get("author_id"))) {
                (Some(user), Some(author)) => user.id.as_value() == author,
                _ => false,
            }
        });

        let author = User::new(1, "Author");
        let post = Record::from_value(&json!({"id": 10, "author_id": 1})).unwrap();

        assert!(authorizer.allows(Some(&author), "update-post", Some(&post)));
        assert!(!authorizer.allows(None, "update-post", Some(&post)));
        assert!(!authorizer.allows(Some(&author), "undefined-ability", None));
    }
}
