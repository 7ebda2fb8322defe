//! MqttAgentGateway - subscribes to the agent topic on an MQTT broker

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use contracts::{
    BrokerConfig, ConnectionState, ContractError, MessageCallback, MessageGateway, RawMessage,
};
use rumqttc::{Client, ConnectReturnCode, Connection, Event, MqttOptions, Packet, QoS};
use tracing::{debug, info, instrument, warn};

use crate::error::{AgentGatewayError, Result};
use crate::state::SharedState;

/// Requests buffered between the client handle and the event loop
const REQUEST_CAPACITY: usize = 64;

type CallbackSlot = Arc<Mutex<Option<MessageCallback>>>;

/// MQTT-backed `MessageGateway`
///
/// The rumqttc event loop runs on its own named thread for the whole
/// connection: it owns a private runtime, so it must never be polled (or
/// dropped) from async code. `connect()` blocks until that thread reports
/// CONNACK, then queues the subscription. `start()` installs the callback
/// the thread invokes for every publish. Transport errors end delivery and
/// leave the gateway in `Failed`.
///
/// `connect()` and `stop()` block the calling thread for the handshake and
/// the thread join; async callers must not run them directly on a runtime
/// worker.
pub struct MqttAgentGateway {
    name: String,
    config: BrokerConfig,
    client: Option<Client>,
    callback: CallbackSlot,
    state: SharedState,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl MqttAgentGateway {
    pub fn new(config: BrokerConfig) -> Result<Self> {
        validate_topic(&config.topic)?;
        Ok(Self {
            name: "mqtt".to_string(),
            config,
            client: None,
            callback: Arc::default(),
            state: SharedState::new("mqtt"),
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        })
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(
            self.config.client_id.clone(),
            self.config.host.clone(),
            self.config.port,
        );
        options.set_keep_alive(Duration::from_secs(self.config.keep_alive_secs));
        options
    }

    fn set_callback(&self, callback: Option<MessageCallback>) {
        *self.callback.lock().unwrap_or_else(|e| e.into_inner()) = callback;
    }

    fn join_worker(&mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("MQTT event loop thread panicked");
            }
        }
    }
}

impl MessageGateway for MqttAgentGateway {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "mqtt_gateway_connect", skip(self), fields(endpoint = %self.config.endpoint()))]
    fn connect(&mut self) -> std::result::Result<(), ContractError> {
        if self.state.get().is_connected() {
            return Ok(());
        }
        // A previous loop may still be winding down after a failure
        self.join_worker();

        info!(topic = %self.config.topic, "connecting to MQTT broker");
        let (ready_tx, ready_rx) = sync_channel(1);
        let event_loop = EventLoop {
            endpoint: self.config.endpoint(),
            topic: self.config.topic.clone(),
            state: self.state.clone(),
            running: self.running.clone(),
            callback: self.callback.clone(),
        };
        let options = self.options();

        self.running.store(true, Ordering::SeqCst);
        let handle = thread::Builder::new()
            .name("mqtt-agent-gateway".to_string())
            .spawn(move || event_loop.run(options, ready_tx))
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                ContractError::from(AgentGatewayError::Spawn(e))
            })?;
        self.worker = Some(handle);

        let client = match ready_rx.recv() {
            Ok(Ok(client)) => client,
            Ok(Err(e)) => {
                self.running.store(false, Ordering::SeqCst);
                self.join_worker();
                return Err(e);
            }
            Err(_) => {
                self.running.store(false, Ordering::SeqCst);
                self.join_worker();
                self.state.fail("event loop exited");
                return Err(ContractError::connection(
                    self.config.endpoint(),
                    "event loop exited before CONNACK",
                ));
            }
        };

        if let Err(e) = client.subscribe(self.config.topic.clone(), QoS::AtLeastOnce) {
            self.client = Some(client);
            self.stop();
            return Err(ContractError::subscribe(&self.config.topic, e.to_string()));
        }

        self.client = Some(client);
        self.state.set(ConnectionState::Connected);
        Ok(())
    }

    #[instrument(name = "mqtt_gateway_start", skip(self, callback))]
    fn start(&mut self, callback: MessageCallback) -> std::result::Result<(), ContractError> {
        if !self.state.get().is_connected() || self.client.is_none() {
            return Err(ContractError::NotConnected {
                gateway: self.name.clone(),
            });
        }
        self.set_callback(Some(callback));
        debug!(topic = %self.config.topic, "MQTT delivery started");
        Ok(())
    }

    #[instrument(name = "mqtt_gateway_stop", skip(self))]
    fn stop(&mut self) {
        self.set_callback(None);
        self.running.store(false, Ordering::SeqCst);

        if let Some(client) = self.client.take() {
            if let Err(e) = client.disconnect() {
                debug!(error = %e, "disconnect request not delivered");
            }
        }
        self.join_worker();

        if !matches!(self.state.get(), ConnectionState::Failed { .. }) {
            self.state.set(ConnectionState::Disconnected);
        }
    }

    fn state(&self) -> ConnectionState {
        self.state.get()
    }
}

impl Drop for MqttAgentGateway {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Everything the event loop thread shares with the gateway
struct EventLoop {
    endpoint: String,
    topic: String,
    state: SharedState,
    running: Arc<AtomicBool>,
    callback: CallbackSlot,
}

impl EventLoop {
    fn run(self, options: MqttOptions, ready: SyncSender<std::result::Result<Client, ContractError>>) {
        let (client, mut connection) = Client::new(options, REQUEST_CAPACITY);
        if let Err(e) = self.await_connack(&mut connection) {
            let _ = ready.send(Err(e));
            return;
        }
        if ready.send(Ok(client)).is_err() {
            return;
        }

        debug!(topic = %self.topic, "MQTT event loop started");
        for notification in connection.iter() {
            match notification {
                Ok(Event::Incoming(Packet::Publish(publish))) => self.deliver(publish),
                Ok(Event::Incoming(Packet::SubAck(_))) => {
                    info!(topic = %self.topic, "subscribed");
                }
                Ok(_) => {}
                Err(e) => {
                    if self.running.load(Ordering::SeqCst) {
                        self.state.fail(e.to_string());
                    } else {
                        debug!(error = %e, "event loop ended after stop");
                    }
                    break;
                }
            }
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
        }

        self.running.store(false, Ordering::SeqCst);
        debug!(topic = %self.topic, "MQTT event loop stopped");
    }

    /// Drive the event loop until the broker accepts or refuses us
    fn await_connack(&self, connection: &mut Connection) -> std::result::Result<(), ContractError> {
        for notification in connection.iter() {
            match notification {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    if ack.code == ConnectReturnCode::Success {
                        return Ok(());
                    }
                    let code = format!("{:?}", ack.code);
                    self.state.fail(code.clone());
                    return Err(ContractError::connection(
                        &self.endpoint,
                        format!("broker refused connection: {code}"),
                    ));
                }
                Ok(event) => debug!(?event, "waiting for CONNACK"),
                Err(e) => {
                    self.state.fail(e.to_string());
                    return Err(ContractError::connection(&self.endpoint, e.to_string()));
                }
            }
        }
        self.state.fail("event loop closed");
        Err(ContractError::connection(&self.endpoint, "event loop closed"))
    }

    fn deliver(&self, publish: rumqttc::Publish) {
        let callback = self
            .callback
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        match callback {
            Some(callback) => callback(RawMessage::new(publish.topic, publish.payload)),
            None => debug!(topic = %publish.topic, "publish before start, discarded"),
        }
    }
}

fn validate_topic(topic: &str) -> Result<()> {
    let reason = if topic.trim().is_empty() {
        "topic is empty"
    } else if topic.contains('\0') {
        "topic contains a NUL character"
    } else if topic.len() > 65_535 {
        "topic is longer than 65535 bytes"
    } else {
        return Ok(());
    };
    Err(AgentGatewayError::InvalidTopic {
        topic: topic.to_string(),
        reason,
    })
}
