//! Error types for Vahana

use thiserror::Error;

use crate::protocol::ProtocolError;

/// Vahana error type
#[derive(Error, Debug)]
pub enum VahanaError {
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for VahanaError {
    fn from(e: toml::de::Error) -> Self {
        VahanaError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VahanaError>;
