//! Store implementations
//!
//! Contains SqliteHubGateway and LogHubGateway.

mod log;
mod sqlite;

pub use self::log::LogHubGateway;
pub use self::sqlite::SqliteHubGateway;
