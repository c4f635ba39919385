//! Configuration types.
//!
//! Configuration lives in `<config dir>/actionkit/config.toml`. Every
//! section is optional; missing values fall back to the defaults below.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::ConfigError;

/// Environment variable overriding the config file path.
pub const CONFIG_PATH_ENV: &str = "ACTIONKIT_CONFIG";

/// Environment variable overriding the token signing key.
pub const APP_KEY_ENV: &str = "ACTIONKIT_APP_KEY";

/// Runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionsConfig {
    /// Secret used to sign action tokens. Unset, a random key is generated
    /// once per process, so tokens do not survive a restart.
    #[serde(default = "default_app_key")]
    pub app_key: String,

    /// Super admin bypass for authorization.
    #[serde(default)]
    pub super_admin: SuperAdminConfig,

    /// Route paths for the action endpoints.
    #[serde(default)]
    pub routes: RoutesConfig,

    /// Session-related settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            app_key: default_app_key(),
            super_admin: SuperAdminConfig::default(),
            routes: RoutesConfig::default(),
            session: SessionConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

static GENERATED_APP_KEY: OnceLock<String> = OnceLock::new();

fn default_app_key() -> String {
    GENERATED_APP_KEY
        .get_or_init(|| {
            format!(
                "{}{}",
                uuid::Uuid::new_v4().simple(),
                uuid::Uuid::new_v4().simple()
            )
        })
        .clone()
}

/// Super admin configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuperAdminConfig {
    pub enabled: bool,
    pub role: String,
}

impl Default for SuperAdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            role: "super_admin".to_string(),
        }
    }
}

/// Route paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutesConfig {
    pub execute: String,
    pub export: String,
    pub import: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            execute: "/actions/execute".to_string(),
            export: "/actions/export".to_string(),
            import: "/actions/import".to_string(),
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Cookie name the client script reads notifications from.
    pub notification_cookie: String,

    /// Lifetime of the notification cookie.
    pub notification_cookie_max_age_secs: u64,

    /// How long a stored handler stays resolvable.
    pub handler_ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            notification_cookie: "actionkit_notifications".to_string(),
            notification_cookie_max_age_secs: 60,
            handler_ttl_secs: 2 * 60 * 60,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

impl ActionsConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Load configuration from the environment-selected or default path.
    ///
    /// A missing file yields the defaults. `ACTIONKIT_APP_KEY` always wins
    /// over the file's key.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match config_path() {
            Some(path) if path.exists() => {
                tracing::info!("Loading config from: {}", path.display());
                Self::load_from(&path)?
            }
            _ => {
                tracing::warn!("No config file found - using default configuration");
                Self::default()
            }
        };

        if let Ok(key) = std::env::var(APP_KEY_ENV) {
            config.app_key = key;
            config.validate()?;
        }

        if config.has_generated_key() {
            tracing::warn!(
                "No app_key configured - using a random per-process key, set {} to keep tokens valid across restarts",
                APP_KEY_ENV
            );
        }

        Ok(config)
    }

    /// Whether the signing key is the per-process random key.
    pub fn has_generated_key(&self) -> bool {
        GENERATED_APP_KEY.get() == Some(&self.app_key)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.app_key.trim().is_empty() {
            return Err(ConfigError::InvalidKey("app_key must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Get the config directory path.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("actionkit"))
}

/// Get the path to the config file.
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    config_dir().map(|p| p.join("config.toml"))
}

/// Ensure the config directory exists.
pub fn ensure_config_dir() -> Result<PathBuf, ConfigError> {
    let dir = config_dir().ok_or(ConfigError::NoConfigDir)?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
