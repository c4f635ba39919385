//! Server startup errors.

use thiserror::Error;

use actionkit_api::ComponentRegistryError;
use actionkit_core::{ActionError, ConfigError};

/// Failures while building or starting the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A component could not be registered.
    #[error("Component error: {0}")]
    Component(#[from] ComponentRegistryError),

    /// Seeding records failed.
    #[error("Record error: {0}")]
    Record(#[from] ActionError),

    /// The bind address is not a socket address.
    #[error("Invalid bind address '{0}'")]
    InvalidAddress(String),

    /// Binding or serving failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for server setup.
pub type ServerResult<T> = Result<T, ServerError>;
