//! Independent capability bundles composed into [`crate::Action`].
//!
//! Each mixin is a small value object with no knowledge of the others;
//! the action passes in whatever cross-cutting values a default needs
//! (its label for the modal heading, its icon for the modal icon).

mod modal;
mod presentation;
mod url;
mod visibility;

pub use modal::Modal;
pub use presentation::{Presentation, DEFAULT_ICON_POSITION};
pub use url::{ActionUrl, UrlResolver, UrlSource};
pub use visibility::{Condition, RecordPredicate, Scope, SimplePredicate, Visibility};
