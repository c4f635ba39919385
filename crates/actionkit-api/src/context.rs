//! Per-request context.

use std::sync::Arc;

use parking_lot::Mutex;

use actionkit_core::{ActionsConfig, Notification};

use crate::auth::{Authorizer, User};
use crate::component::ComponentRegistry;
use crate::records::RecordStore;
use crate::resource::Resource;
use crate::services::ActionServices;
use crate::session::SessionStore;
use crate::token::TokenCodec;

/// The services, session and user of one request.
///
/// Notifications sent while handling the request are collected here and
/// drained by the dispatcher into the response.
pub struct RequestContext {
    services: Arc<ActionServices>,
    session: Arc<dyn SessionStore>,
    user: Option<User>,
    panel: Option<String>,
    notifications: Mutex<Vec<Notification>>,
}

impl RequestContext {
    pub fn new(services: Arc<ActionServices>, session: Arc<dyn SessionStore>) -> Self {
        Self {
            services,
            session,
            user: None,
            panel: None,
            notifications: Mutex::new(Vec::new()),
        }
    }

    pub fn with_user(mut self, user: Option<User>) -> Self {
        self.user = user;
        self
    }

    pub fn with_panel(mut self, panel: Option<String>) -> Self {
        self.panel = panel;
        self
    }

    pub fn services(&self) -> &Arc<ActionServices> {
        &self.services
    }

    pub fn session(&self) -> &dyn SessionStore {
        self.session.as_ref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Current admin panel identifier.
    pub fn panel(&self) -> Option<&str> {
        self.panel.as_deref()
    }

    pub fn config(&self) -> &ActionsConfig {
        self.services.config()
    }

    pub fn tokens(&self) -> &TokenCodec {
        self.services.tokens()
    }

    pub fn authorizer(&self) -> &dyn Authorizer {
        self.services.authorizer()
    }

    pub fn records(&self) -> &dyn RecordStore {
        self.services.records()
    }

    pub fn components(&self) -> &ComponentRegistry {
        self.services.components()
    }

    /// Queue a notification for the response.
    pub fn notify(&self, notification: Notification) {
        self.notifications.lock().push(notification);
    }

    pub fn take_notifications(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.notifications.lock())
    }

    /// Resource of a registered component.
    pub fn resource_for(&self, component: Option<&str>) -> Option<Arc<dyn Resource>> {
        let component = self.components().get(component?)?;
        component.resource()
    }

    /// Context over fresh default services and an in-memory session.
    #[cfg(test)]
    pub(crate) fn testing() -> Self {
        let services = ActionServices::new(ActionsConfig::default())
            .unwrap_or_else(|e| panic!("default config: {}", e));
        Self::new(
            Arc::new(services),
            Arc::new(crate::session::MemorySession::new()),
        )
    }
}
