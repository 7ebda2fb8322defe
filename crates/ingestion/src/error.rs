//! Ingestion error types

use contracts::ContractError;
use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Payload bytes are not valid UTF-8
    #[error("failed to decode payload on topic '{topic}': {message}")]
    DecodeFailed {
        /// Topic the message arrived on
        topic: String,
        /// Error message
        message: String,
    },

    /// Payload text does not match the sample schema
    #[error("failed to parse sensor sample on topic '{topic}': {message}")]
    ParseFailed {
        /// Topic the message arrived on
        topic: String,
        /// Error message
        message: String,
    },

    /// Message gateway could not connect or subscribe
    #[error("transport error: {0}")]
    Transport(#[from] ContractError),

    /// A pipeline component did not come back from a previous shutdown
    #[error("pipeline component '{component}' was lost during a previous shutdown")]
    ComponentLost {
        /// Component name
        component: &'static str,
    },
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
