//! Visibility conditions.

use std::fmt;
use std::sync::Arc;

use actionkit_core::Record;

use crate::auth::User;
use crate::context::RequestContext;
use crate::resource::{Capability, Resource};

/// What a visibility predicate can see besides the record.
pub struct Scope<'a> {
    pub ctx: &'a RequestContext,

    /// Component the action is bound to, if any.
    pub component: Option<&'a str>,
}

impl<'a> Scope<'a> {
    pub fn new(ctx: &'a RequestContext, component: Option<&'a str>) -> Self {
        Self { ctx, component }
    }

    pub fn user(&self) -> Option<&User> {
        self.ctx.user()
    }

    /// Resource of the bound component.
    pub fn resource(&self) -> Option<Arc<dyn Resource>> {
        self.ctx.resource_for(self.component)
    }

    /// Ask the bound resource for a capability. Without a resource, allow.
    pub fn can(&self, capability: Capability, record: Option<&Record>) -> bool {
        match self.resource() {
            Some(resource) => resource.can(capability, self.user(), record),
            None => true,
        }
    }
}

/// Predicate that does not look at a record.
pub type SimplePredicate = Arc<dyn Fn(&Scope<'_>) -> bool + Send + Sync>;

/// Predicate that needs a record.
pub type RecordPredicate = Arc<dyn Fn(&Record, &Scope<'_>) -> bool + Send + Sync>;

/// A boolean or a predicate, chosen at construction.
#[derive(Clone)]
pub enum Condition {
    Static(bool),
    Simple(SimplePredicate),
    Record(RecordPredicate),
}

impl Condition {
    pub fn simple<F>(f: F) -> Self
    where
        F: Fn(&Scope<'_>) -> bool + Send + Sync + 'static,
    {
        Condition::Simple(Arc::new(f))
    }

    pub fn record<F>(f: F) -> Self
    where
        F: Fn(&Record, &Scope<'_>) -> bool + Send + Sync + 'static,
    {
        Condition::Record(Arc::new(f))
    }

    /// Whether evaluation needs a record.
    pub fn requires_record(&self) -> bool {
        matches!(self, Condition::Record(_))
    }

    /// Evaluate. Returns `None` when a record is required but missing.
    pub fn evaluate(&self, record: Option<&Record>, scope: &Scope<'_>) -> Option<bool> {
        match self {
            Condition::Static(value) => Some(*value),
            Condition::Simple(f) => Some(f(scope)),
            Condition::Record(f) => record.map(|record| f(record, scope)),
        }
    }

    /// Logical negation, keeping the record requirement.
    pub fn negate(self) -> Self {
        match self {
            Condition::Static(value) => Condition::Static(!value),
            Condition::Simple(f) => Condition::Simple(Arc::new(move |scope| !f(scope))),
            Condition::Record(f) => {
                Condition::Record(Arc::new(move |record, scope| !f(record, scope)))
            }
        }
    }
}

impl From<bool> for Condition {
    fn from(value: bool) -> Self {
        Condition::Static(value)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Static(value) => write!(f, "Static({})", value),
            Condition::Simple(_) => f.write_str("Simple(..)"),
            Condition::Record(_) => f.write_str("Record(..)"),
        }
    }
}

/// Hidden/visible state of an action.
#[derive(Debug, Clone)]
pub struct Visibility {
    hidden: Condition,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            hidden: Condition::Static(false),
        }
    }
}

impl Visibility {
    pub fn set_hidden(&mut self, condition: impl Into<Condition>) {
        self.hidden = condition.into();
    }

    /// Stores the negation of the condition.
    pub fn set_visible(&mut self, condition: impl Into<Condition>) {
        self.hidden = condition.into().negate();
    }

    /// A record predicate evaluated without a record leaves the action visible.
    pub fn is_hidden(&self, record: Option<&Record>, scope: &Scope<'_>) -> bool {
        self.hidden.evaluate(record, scope).unwrap_or(false)
    }

    pub fn requires_record(&self) -> bool {
        self.hidden.requires_record()
    }
}
