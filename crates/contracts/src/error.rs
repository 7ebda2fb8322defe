//! Layered error definitions
//!
//! Categorized by source: config / transport. Payload errors belong to
//! ingestion and storage errors to the hub, where each is produced.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Settings file does not exist
    #[error("config file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Transport Errors =====
    /// Broker could not be reached or refused the session
    #[error("connection error to {endpoint}: {message}")]
    Connection { endpoint: String, message: String },

    /// Subscription to a topic failed
    #[error("subscribe error for topic '{topic}': {message}")]
    Subscribe { topic: String, message: String },

    /// Gateway was asked to deliver before `connect()`
    #[error("gateway '{gateway}' is not connected")]
    NotConnected { gateway: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create connection error
    pub fn connection(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create subscribe error
    pub fn subscribe(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Subscribe {
            topic: topic.into(),
            message: message.into(),
        }
    }

    /// Whether this error belongs to the transport category
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Subscribe { .. } | Self::NotConnected { .. }
        )
    }
}

impl From<validator::ValidationErrors> for ContractError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::config_validation("settings", errors.to_string())
    }
}
