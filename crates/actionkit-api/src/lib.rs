//! Server-driven admin actions.
//!
//! This crate provides:
//! - `Action` and `BulkAction` definitions with their serialized view
//! - Action tokens and the session-backed handler store
//! - The dispatcher that resolves a submitted token back to a handler
//! - Service traits for authorization, resources, records and file transfer
//! - A catalog of ready-made record actions

pub mod action;
pub mod auth;
pub mod bulk;
pub mod catalog;
pub mod component;
pub mod context;
pub mod dispatch;
pub mod handler;
pub mod lang;
pub mod mixins;
pub mod notifications;
pub mod records;
pub mod resource;
pub mod schema;
pub mod services;
pub mod session;
pub mod token;
pub mod transfer;

// Re-export commonly used types
pub use action::{Action, ActionExtension, ComponentContext, Variant};
pub use auth::{Authorizer, GateAuthorizer, PermissionCheck, User};
pub use bulk::{BulkAction, BulkActionGroup};
pub use component::{
    configure_actions, configure_record_actions, Component, ComponentRegistry,
    ComponentRegistryError,
};
pub use context::RequestContext;
pub use dispatch::{execute, DispatchError, DispatchResponse, ExecuteRequest};
pub use handler::{Arguments, Get, Handler, Param, Set};
pub use mixins::Condition;
pub use records::{MemoryRecordStore, RecordStore};
pub use resource::{Capability, Resource, ResourceDefinition};
pub use schema::Field;
pub use services::ActionServices;
pub use session::{MemorySession, SessionRegistry, SessionStore};
pub use token::{ActionToken, Encrypter, HmacEncrypter, TokenCodec, TokenError};
pub use transfer::{
    ExportFile, ExportRequest, Exporter, Importer, TransferError, UploadedFile, WriterType,
};

// Re-export actionkit_core types for convenience
pub use actionkit_core::{
    ActionError, ActionOutcome, ActionResult, ActionsConfig, Notification, Record, RecordKey,
    Redirect, Selection, ValidationErrors,
};
