//! Error types for CLI operations.

use std::path::PathBuf;

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration could not be loaded or is invalid
    #[error("Invalid configuration: {0}")]
    Settings(#[from] contracts::ContractError),

    /// Message gateway could not be built
    #[error("Failed to set up message gateway: {0}")]
    Gateway(#[from] agent_gateway::AgentGatewayError),

    /// Record store could not be opened or read
    #[error("Record store error: {0}")]
    Hub(#[from] hub_gateway::HubError),

    /// Pipeline failed to start
    #[error("Ingestion failed: {0}")]
    Ingestion(#[from] ingestion::IngestionError),

    /// Gateway connection was lost while running
    #[error("Message gateway failed while running: {code}")]
    GatewayFailed { code: String },

    /// Database file to read does not exist
    #[error("Database not found: {}", path.display())]
    DatabaseNotFound { path: PathBuf },
}

impl CliError {
    pub fn gateway_failed(code: impl Into<String>) -> Self {
        Self::GatewayFailed { code: code.into() }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
