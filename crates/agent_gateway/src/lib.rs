//! # Agent Gateway
//!
//! Message gateways that bring agent samples into the hub.
//!
//! - `MqttAgentGateway`: live broker subscription (rumqttc)
//! - `ReplayAgentGateway`: recorded JSONL payloads, for offline runs
//!
//! Both deliver on their own worker thread and expose connection state
//! through `MessageGateway::state()`.

mod error;
mod mqtt;
mod replay;
mod state;

pub use error::{AgentGatewayError, Result};
pub use mqtt::MqttAgentGateway;
pub use replay::{ReplayAgentGateway, ReplayConfig};
