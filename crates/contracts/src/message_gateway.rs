//! MessageGateway trait - inbound transport abstraction
//!
//! Decouples the ingestion pipeline from any concrete publish/subscribe
//! technology. Real brokers, recorded replays and in-memory mocks all
//! implement the same lifecycle.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::ContractError;

/// Raw inbound message, exactly as delivered by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// Topic / channel the message arrived on
    pub topic: String,

    /// Undecoded payload
    pub payload: Bytes,
}

impl RawMessage {
    /// Create a new raw message
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Message delivery callback
///
/// Invoked from the gateway's own worker, never from the caller of `start()`.
pub type MessageCallback = Arc<dyn Fn(RawMessage) + Send + Sync>;

/// Observable connection state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No session (initial state, or after `stop()`)
    #[default]
    Disconnected,

    /// Session established, subscription possible
    Connected,

    /// Transport reported a failure
    Failed { code: String },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("disconnected"),
            Self::Connected => f.write_str("connected"),
            Self::Failed { code } => write!(f, "failed ({code})"),
        }
    }
}

/// Inbound message gateway
///
/// # Lifecycle
///
/// 1. `connect()` establishes the underlying channel
/// 2. `start()` begins invoking the callback for every inbound message,
///    asynchronously, until `stop()`
/// 3. `stop()` ceases delivery and releases transport resources; idempotent
///
/// `connect()` and `stop()` may block the calling thread on network or
/// worker-thread handshakes. Async callers run them off the executor.
///
/// # Example
///
/// ```ignore
/// let mut gateway: Box<dyn MessageGateway> = build_gateway();
/// gateway.connect()?;
/// gateway.start(Arc::new(|msg| {
///     println!("{} bytes on {}", msg.payload.len(), msg.topic);
/// }))?;
/// // ...
/// gateway.stop();
/// ```
pub trait MessageGateway: Send {
    /// Gateway name (used for logging)
    fn name(&self) -> &str;

    /// Establish the underlying channel
    ///
    /// # Errors
    /// `ContractError::Connection` / `ContractError::Subscribe` when the
    /// transport cannot be reached or the subscription is refused.
    fn connect(&mut self) -> Result<(), ContractError>;

    /// Begin delivering messages to `callback`
    ///
    /// Calling `start()` while already delivering is a no-op.
    fn start(&mut self, callback: MessageCallback) -> Result<(), ContractError>;

    /// Stop delivery and release transport resources
    fn stop(&mut self);

    /// Current connection state
    fn state(&self) -> ConnectionState;

    /// Whether the callback may block until the consumer has room
    ///
    /// Live transports cannot be paused, so a full queue drops messages.
    /// Finite sources such as recordings opt in and are paced by the
    /// consumer instead.
    fn backpressure(&self) -> bool {
        false
    }

    /// Check if the gateway holds a live session
    fn is_connected(&self) -> bool {
        self.state().is_connected()
    }
}

impl<G: MessageGateway + ?Sized> MessageGateway for Box<G> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn connect(&mut self) -> Result<(), ContractError> {
        (**self).connect()
    }

    fn start(&mut self, callback: MessageCallback) -> Result<(), ContractError> {
        (**self).start(callback)
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn state(&self) -> ConnectionState {
        (**self).state()
    }

    fn backpressure(&self) -> bool {
        (**self).backpressure()
    }
}
