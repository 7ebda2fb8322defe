//! Agent gateway error types

use std::path::PathBuf;

use contracts::ContractError;
use thiserror::Error;

/// Errors raised while building a gateway
///
/// Runtime transport failures go through `ContractError`, which is what the
/// `MessageGateway` trait speaks.
#[derive(Debug, Error)]
pub enum AgentGatewayError {
    /// Replay file could not be read
    #[error("failed to read replay file '{path}': {source}")]
    ReplayRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Replay file holds no payloads
    #[error("replay file '{path}' contains no messages")]
    EmptyReplay { path: PathBuf },

    /// Topic cannot be subscribed to
    #[error("invalid topic '{topic}': {reason}")]
    InvalidTopic { topic: String, reason: &'static str },

    /// Failed to spawn a delivery thread
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

impl AgentGatewayError {
    pub fn replay_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReplayRead {
            path: path.into(),
            source,
        }
    }
}

impl From<AgentGatewayError> for ContractError {
    fn from(e: AgentGatewayError) -> Self {
        match e {
            AgentGatewayError::Spawn(source) => ContractError::Io(source),
            other => ContractError::Other(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AgentGatewayError>;
