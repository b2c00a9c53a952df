//! Configuration loading for Vahana

use crate::error::{Result, VahanaError};
use crate::protocol::Role;
use crate::session::{ConnectOptions, DEFAULT_READ_BUFFER_SIZE};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network connection settings
#[derive(Clone, Debug, Deserialize)]
pub struct ConnectionConfig {
    /// Simulation server host (default: localhost)
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port number (default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,

    /// TCP connect timeout in milliseconds. Unset means the OS default.
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,

    /// Bytes requested per socket read (default: 1024)
    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,
}

/// Login identity. The password is never stored in the config file.
#[derive(Clone, Debug, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub username: Option<String>,

    /// Requested role (default: OBSERVER)
    #[serde(default = "default_role")]
    pub role: Role,
}

/// Logging configuration
#[derive(Clone, Debug, Deserialize)]
pub struct LoggingConfig {
    /// Default level when RUST_LOG is unset (default: info)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_host() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_read_buffer_size() -> usize {
    DEFAULT_READ_BUFFER_SIZE
}
fn default_role() -> Role {
    Role::Observer
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            connect_timeout_ms: None,
            read_buffer_size: default_read_buffer_size(),
        }
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            username: None,
            role: default_role(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VahanaError::Config(format!("Failed to read config file: {}", e)))?;
        let config: ClientConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Get the full address string for connection
    pub fn address(&self) -> String {
        format!("{}:{}", self.connection.host, self.connection.port)
    }

    /// Transport options derived from the connection section
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            connect_timeout: self.connection.connect_timeout_ms.map(Duration::from_millis),
            read_buffer_size: self.connection.read_buffer_size,
        }
    }
}
