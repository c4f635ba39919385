//! Built-in actions.
//!
//! Each catalog action is an ordinary [`Action`] preconfigured with labels,
//! icons and confirmation, plus an [`ActionExtension`] that derives URLs,
//! handlers or visibility from the bound component's resource.
//!
//! Catalog wrappers convert into [`Action`] (or [`BulkAction`]) with
//! `.into()`; `configure` applies ordinary action builders on the way.
//!
//! [`ActionExtension`]: crate::action::ActionExtension
//! [`BulkAction`]: crate::bulk::BulkAction

mod bulk;
mod create;
mod export;
mod import;
mod lifecycle;
mod navigate;
mod replicate;

pub use bulk::{DeleteBulkAction, ForceDeleteBulkAction, RestoreBulkAction};
pub use create::CreateAction;
pub use export::ExportAction;
pub use import::ImportAction;
pub use lifecycle::{DeleteAction, ForceDeleteAction, RestoreAction};
pub use navigate::{EditAction, ViewAction};
pub use replicate::{ReplicaHook, ReplicateAction};

use std::sync::Arc;

use crate::action::Action;
use crate::context::RequestContext;
use crate::resource::Resource;

/// Resource of the component an action is bound to.
fn bound_resource(action: &Action, ctx: &RequestContext) -> Option<Arc<dyn Resource>> {
    ctx.resource_for(action.component_context().map(|c| c.class.as_str()))
}

/// Apply a consuming builder to an action held by mutable reference.
fn rebuild(action: &mut Action, f: impl FnOnce(Action) -> Action) {
    *action = f(std::mem::take(action));
}

/// `configure`, `From` and `Deref` for wrappers holding an `action` field
/// and converting through `into_action`.
macro_rules! catalog_action {
    ($ty:ident) => {
        impl $ty {
            /// Apply builder methods to the wrapped action.
            pub fn configure(mut self, f: impl FnOnce(Action) -> Action) -> Self {
                self.action = f(self.action);
                self
            }
        }

        impl From<$ty> for Action {
            fn from(value: $ty) -> Self {
                value.into_action()
            }
        }

        impl std::ops::Deref for $ty {
            type Target = Action;

            fn deref(&self) -> &Action {
                &self.action
            }
        }
    };
}

pub(crate) use catalog_action;
