//! Core types for actionkit.
//!
//! This crate contains shared data structures used across all actionkit crates:
//! - Record and RecordKey types
//! - Bulk selections
//! - Handler outcomes, redirects and notifications
//! - Configuration types
//! - Error types

mod config;
mod error;
mod outcome;
mod record;
mod selection;

pub use config::{
    config_dir, config_path, ensure_config_dir, ActionsConfig, RoutesConfig, ServerConfig,
    SessionConfig, SuperAdminConfig, APP_KEY_ENV, CONFIG_PATH_ENV,
};
pub use error::{ActionError, ActionResult, ConfigError, ValidationErrors};
pub use outcome::{ActionOutcome, Notification, NotificationLevel, Redirect, RedirectTarget};
pub use record::{Record, RecordKey};
pub use selection::Selection;
