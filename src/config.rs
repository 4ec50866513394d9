//! Configuration loading and management.

use classgate_authz::PermissionSet;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Service identity.
    pub server: ServerConfig,
    /// Network listen configuration.
    pub listen: ListenConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Defaults applied when creating secondary admins.
    #[serde(default)]
    pub admin_defaults: AdminDefaults,
    /// Optional notification relay.
    pub notifications: Option<NotificationConfig>,
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Instance name (e.g., "authz.classgate.example").
    pub name: String,
}

/// Network listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    /// Address to bind to (e.g., "0.0.0.0:8085").
    pub address: SocketAddr,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file, or ":memory:".
    pub path: String,
}

/// Defaults for newly created secondary admins.
///
/// Carried as configuration data rather than a module constant so tests and
/// deployments substitute alternate default sets. Whatever these say, the
/// secondary clamp still forces `canManageContent` and `canManageAdmins`
/// off at every write.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdminDefaults {
    /// Permission flags a secondary admin starts from before the request's
    /// own flags are merged in. Keys use the wire names
    /// (`canEnrollStudents`, ...).
    pub secondary_permissions: PermissionSet,
}

/// Notification relay configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Webhook endpoint notifications are posted to.
    pub webhook_url: String,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }
}
