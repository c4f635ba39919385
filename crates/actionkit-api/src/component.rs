//! Component registry.
//!
//! This module provides:
//! - `Component` - A long-lived page or resource view owning a list of actions
//! - `ComponentRegistry` - Storage for registered components
//! - `configure_actions` - Binds component context onto header actions

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use actionkit_core::{Record, RecordKey};

use crate::action::{Action, ComponentContext};
use crate::bulk::BulkActionGroup;
use crate::context::RequestContext;
use crate::resource::Resource;

/// A page or resource view that actions can be resolved against.
///
/// Components are looked up by name when a component-bound action token
/// is dispatched, and asked for their actions again.
pub trait Component: Send + Sync {
    /// Unique component name (the `component` field of a token).
    fn name(&self) -> &str;

    fn panel(&self) -> Option<&str> {
        None
    }

    /// Resource this component displays.
    fn resource(&self) -> Option<Arc<dyn Resource>> {
        None
    }

    /// Actions shown on this component.
    fn actions(&self, ctx: &RequestContext) -> Vec<Action>;

    /// Bulk action groups shown on this component.
    fn bulk_actions(&self, _ctx: &RequestContext) -> Vec<BulkActionGroup> {
        Vec::new()
    }

    /// Load the record a token refers to. Defaults to the resource model.
    fn resolve_record(&self, key: &RecordKey, ctx: &RequestContext) -> Option<Record> {
        let resource = self.resource()?;
        ctx.records().find(resource.model(), key)
    }

    /// Find an action by name, bound to this component.
    fn find_action(&self, name: &str, ctx: &RequestContext) -> Option<Action> {
        configure_actions(self.name(), self.panel(), self.actions(ctx))
            .into_iter()
            .find(|action| action.name() == Some(name))
    }
}

/// Registry for storing components.
pub struct ComponentRegistry {
    /// Registered components by name.
    components: RwLock<HashMap<String, Arc<dyn Component>>>,
}

impl ComponentRegistry {
    /// Create a new empty component registry.
    pub fn new() -> Self {
        Self {
            components: RwLock::new(HashMap::new()),
        }
    }

    /// Register a component.
    ///
    /// Returns an error if a component with the same name already exists.
    pub fn add(&self, component: Arc<dyn Component>) -> Result<(), ComponentRegistryError> {
        let mut components = self.components.write();
        let name = component.name().to_string();
        if components.contains_key(&name) {
            return Err(ComponentRegistryError::AlreadyExists(name));
        }
        components.insert(name.clone(), component);
        tracing::info!("Registered component: {}", name);
        Ok(())
    }

    /// Get a component by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Component>> {
        self.components.read().get(name).cloned()
    }

    /// Get a component by name, or fail.
    pub fn require(&self, name: &str) -> Result<Arc<dyn Component>, ComponentRegistryError> {
        self.get(name)
            .ok_or_else(|| ComponentRegistryError::NotFound(name.to_string()))
    }

    /// List all registered component names.
    pub fn list(&self) -> Vec<String> {
        self.components.read().keys().cloned().collect()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.components.read().contains_key(name)
    }

    pub fn count(&self) -> usize {
        self.components.read().len()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur during component registry operations.
#[derive(Debug, thiserror::Error)]
pub enum ComponentRegistryError {
    #[error("Component '{0}' already exists")]
    AlreadyExists(String),

    #[error("Component '{0}' not found")]
    NotFound(String),
}

/// Bind component context onto actions that would otherwise produce no token.
///
/// Actions that already carry a handler or a component keep their own
/// token strategy.
pub fn configure_actions(
    component: &str,
    panel: Option<&str>,
    actions: Vec<Action>,
) -> Vec<Action> {
    configure_record_actions(component, panel, None, actions)
}

/// Like [`configure_actions`], for a page showing one record. The record
/// key travels in the component token.
pub fn configure_record_actions(
    component: &str,
    panel: Option<&str>,
    record: Option<&RecordKey>,
    actions: Vec<Action>,
) -> Vec<Action> {
    actions
        .into_iter()
        .map(|action| {
            if action.has_token_target() {
                action
            } else {
                action.component(ComponentContext::new(
                    component,
                    record.cloned(),
                    panel.map(str::to_string),
                ))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actionkit_core::ActionOutcome;

    struct Page {
        name: String,
    }

    impl Component for Page {
        fn name(&self) -> &str {
            &self.name
        }

        fn actions(&self, _ctx: &RequestContext) -> Vec<Action> {
            vec![Action::make("publish"), Action::make("archive")]
        }
    }

    fn page(name: &str) -> Arc<dyn Component> {
        Arc::new(Page {
            name: name.to_string(),
        })
    }

    #[test]
    fn test_component_registry_add_and_get() {
        let registry = ComponentRegistry::new();
        registry.add(page("posts.edit")).unwrap();

        assert!(registry.exists("posts.edit"));
        assert_eq!(registry.count(), 1);
        assert_eq!(registry.get("posts.edit").unwrap().name(), "posts.edit");
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_component_registry_duplicate() {
        let registry = ComponentRegistry::new();
        registry.add(page("posts.edit")).unwrap();

        let err = registry.add(page("posts.edit")).unwrap_err();
        assert!(matches!(err, ComponentRegistryError::AlreadyExists(_)));
        assert_eq!(err.to_string(), "Component 'posts.edit' already exists");
    }

    #[test]
    fn test_component_registry_require() {
        let registry = ComponentRegistry::new();
        let err = registry.require("missing").err().unwrap();
        assert!(matches!(err, ComponentRegistryError::NotFound(_)));
    }

    #[test]
    fn test_find_action_by_name() {
        let ctx = RequestContext::testing();
        let component = page("posts.edit");

        assert!(component.find_action("archive", &ctx).is_some());
        assert!(component.find_action("delete", &ctx).is_none());
    }

    #[test]
    fn test_configure_actions_binds_only_unbound() {
        let actions = vec![
            Action::make("publish"),
            Action::make("notify").action(|_, _, _| Ok(ActionOutcome::Empty)),
        ];

        let configured = configure_actions("posts.edit", Some("admin"), actions);

        let bound = configured[0].component_context().unwrap();
        assert_eq!(bound.class, "posts.edit");
        assert_eq!(bound.panel.as_deref(), Some("admin"));
        assert!(configured[1].component_context().is_none());
    }

    #[test]
    fn test_configure_record_actions_carries_key() {
        let key = RecordKey::from(7);
        let configured =
            configure_record_actions("posts.edit", None, Some(&key), vec![Action::make("publish")]);

        let bound = configured[0].component_context().unwrap();
        assert_eq!(bound.id, Some(key));
        assert!(bound.panel.is_none());
    }
}
