//! Hub gateway error types

use thiserror::Error;

/// Persistence errors
///
/// These never cross `PersistenceGateway::save`, which reports failure as
/// `false`; they surface from construction and the read helpers.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored row cannot be turned back into a record
    #[error("corrupt row {id}: {message}")]
    Corrupt { id: i64, message: String },

    /// Store was closed
    #[error("store '{0}' is closed")]
    Closed(String),
}

impl HubError {
    pub fn corrupt(id: i64, message: impl Into<String>) -> Self {
        Self::Corrupt {
            id,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HubError>;
