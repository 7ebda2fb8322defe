//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Data flow
//! `RawMessage` (MessageGateway) -> `SensorSample` -> `ClassifiedRecord` (PersistenceGateway)
//!
//! ## Time model
//! Sample timestamps are wall-clock instants reported by the sensing agent,
//! normalized to UTC on ingestion.

mod error;
mod message_gateway;
mod persistence_gateway;
mod record;
mod sample;
mod settings;
pub mod timestamp;

pub use error::*;
pub use message_gateway::{ConnectionState, MessageCallback, MessageGateway, RawMessage};
pub use persistence_gateway::{LocalPersistenceGateway, PersistenceGateway};
pub use record::*;
pub use sample::*;
pub use settings::*;
