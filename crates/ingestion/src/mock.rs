//! Mock message gateway
//!
//! Lets tests push payloads into a pipeline without a broker.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use contracts::{ConnectionState, ContractError, MessageCallback, MessageGateway, RawMessage};
use tracing::debug;

#[derive(Default)]
struct MockShared {
    state: ConnectionState,
    callback: Option<MessageCallback>,
    delivered: u64,
}

/// In-memory `MessageGateway`
///
/// Messages are delivered synchronously through a [`MockInjector`].
pub struct MockMessageGateway {
    name: String,
    topic: String,
    refuse_connect: bool,
    refuse_start: bool,
    shared: Arc<Mutex<MockShared>>,
}

impl MockMessageGateway {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            name: "mock".to_string(),
            topic: topic.into(),
            refuse_connect: false,
            refuse_start: false,
            shared: Arc::default(),
        }
    }

    /// A gateway whose `connect()` always fails
    pub fn refusing(topic: impl Into<String>) -> Self {
        Self {
            refuse_connect: true,
            ..Self::new(topic)
        }
    }

    /// A gateway that connects but whose `start()` always fails
    pub fn failing_start(topic: impl Into<String>) -> Self {
        Self {
            refuse_start: true,
            ..Self::new(topic)
        }
    }

    /// Handle for delivering messages from test code
    pub fn injector(&self) -> MockInjector {
        MockInjector {
            topic: self.topic.clone(),
            shared: self.shared.clone(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockShared> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl MessageGateway for MockMessageGateway {
    fn name(&self) -> &str {
        &self.name
    }

    fn connect(&mut self) -> Result<(), ContractError> {
        if self.refuse_connect {
            self.lock().state = ConnectionState::Failed {
                code: "refused".to_string(),
            };
            return Err(ContractError::connection("mock://", "connection refused"));
        }
        self.lock().state = ConnectionState::Connected;
        Ok(())
    }

    fn start(&mut self, callback: MessageCallback) -> Result<(), ContractError> {
        let mut shared = self.lock();
        if !shared.state.is_connected() {
            return Err(ContractError::NotConnected {
                gateway: self.name.clone(),
            });
        }
        if self.refuse_start {
            return Err(ContractError::subscribe(&self.topic, "subscription rejected"));
        }
        shared.callback = Some(callback);
        debug!(topic = %self.topic, "mock gateway started");
        Ok(())
    }

    fn stop(&mut self) {
        let mut shared = self.lock();
        shared.callback = None;
        shared.state = ConnectionState::Disconnected;
    }

    fn state(&self) -> ConnectionState {
        self.lock().state.clone()
    }
}

/// Test-side handle that plays the role of the broker
#[derive(Clone)]
pub struct MockInjector {
    topic: String,
    shared: Arc<Mutex<MockShared>>,
}

impl MockInjector {
    /// Deliver a payload; `false` when no callback is registered
    pub fn deliver(&self, payload: impl Into<Bytes>) -> bool {
        // Invoke outside the lock so the callback may re-enter the gateway
        let callback = {
            let mut shared = self.shared.lock().unwrap_or_else(|e| e.into_inner());
            let Some(callback) = shared.callback.clone() else {
                return false;
            };
            shared.delivered += 1;
            callback
        };
        callback(RawMessage::new(self.topic.clone(), payload));
        true
    }

    /// Messages delivered so far
    pub fn delivered(&self) -> u64 {
        self.shared
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .delivered
    }
}

/// Serialized sample with the given vertical acceleration
///
/// `seq` offsets the timestamp by 100 ms steps and nudges the longitude.
pub fn sample_payload(z: f64, seq: u64) -> String {
    let millis = seq * 100;
    serde_json::json!({
        "accelerometer": { "x": 12.0, "y": -40.0, "z": z },
        "gps": { "latitude": 50.4501, "longitude": 30.5234 + seq as f64 * 1e-5 },
        "timestamp": format!(
            "2024-02-27T10:{:02}:{:02}.{:03}Z",
            (millis / 60_000) % 60,
            (millis / 1000) % 60,
            millis % 1000
        ),
    })
    .to_string()
}
