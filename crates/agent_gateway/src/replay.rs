//! ReplayAgentGateway - replays recorded agent payloads from a JSONL file
//!
//! One payload per line; blank lines are skipped. Lines are delivered as raw
//! bytes, so malformed recordings (including non-UTF-8 ones) exercise the same
//! discard path as live traffic.
//!
//! A recording can be paced by its consumer, so this gateway opts into
//! backpressure: its thread waits for queue space rather than dropping.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bytes::Bytes;
use contracts::{ConnectionState, ContractError, MessageCallback, MessageGateway, RawMessage};
use tracing::{debug, info, instrument, warn};

use crate::error::{AgentGatewayError, Result};
use crate::state::SharedState;

/// Replay configuration
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Topic reported on every replayed message
    pub topic: String,

    /// Pause between messages
    pub interval: Duration,

    /// Start over at end of file
    pub loop_playback: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            topic: "agent_data_topic".to_string(),
            interval: Duration::from_millis(100),
            loop_playback: false,
        }
    }
}

/// File-backed `MessageGateway`
pub struct ReplayAgentGateway {
    name: String,
    path: PathBuf,
    payloads: Arc<Vec<Bytes>>,
    config: ReplayConfig,
    state: SharedState,
    running: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl ReplayAgentGateway {
    /// Load every payload line from `path`
    pub fn load(path: impl AsRef<Path>, config: ReplayConfig) -> Result<Self> {
        let path = path.as_ref();
        let content =
            Bytes::from(fs::read(path).map_err(|e| AgentGatewayError::replay_read(path, e))?);
        let payloads = split_lines(&content);

        if payloads.is_empty() {
            return Err(AgentGatewayError::EmptyReplay {
                path: path.to_path_buf(),
            });
        }

        info!(path = %path.display(), messages = payloads.len(), "loaded replay file");

        Ok(Self {
            name: "replay".to_string(),
            path: path.to_path_buf(),
            payloads: Arc::new(payloads),
            config,
            state: SharedState::new("replay"),
            running: Arc::new(AtomicBool::new(false)),
            finished: Arc::new(AtomicBool::new(false)),
            worker: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of payloads in one pass over the file
    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    /// Whether a non-looping replay has delivered every message
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

impl MessageGateway for ReplayAgentGateway {
    fn name(&self) -> &str {
        &self.name
    }

    fn connect(&mut self) -> std::result::Result<(), ContractError> {
        self.state.set(ConnectionState::Connected);
        Ok(())
    }

    #[instrument(name = "replay_gateway_start", skip(self, callback), fields(path = %self.path.display()))]
    fn start(&mut self, callback: MessageCallback) -> std::result::Result<(), ContractError> {
        if !self.state.get().is_connected() {
            return Err(ContractError::NotConnected {
                gateway: self.name.clone(),
            });
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.finished.store(false, Ordering::SeqCst);

        let running = self.running.clone();
        let finished = self.finished.clone();
        let payloads = self.payloads.clone();
        let config = self.config.clone();

        let handle = thread::Builder::new()
            .name("replay-agent-gateway".to_string())
            .spawn(move || {
                debug!("replay thread started");

                'playback: loop {
                    for payload in payloads.iter() {
                        if !running.load(Ordering::SeqCst) {
                            debug!("replay stopped");
                            break 'playback;
                        }
                        callback(RawMessage::new(config.topic.clone(), payload.clone()));
                        if !config.interval.is_zero() {
                            thread::sleep(config.interval);
                        }
                    }

                    if !config.loop_playback {
                        info!(messages = payloads.len(), "replay completed");
                        finished.store(true, Ordering::SeqCst);
                        break;
                    }
                    debug!("looping replay");
                }

                running.store(false, Ordering::SeqCst);
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                ContractError::from(AgentGatewayError::Spawn(e))
            })?;

        self.worker = Some(handle);
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("replay thread panicked");
            }
        }
        self.state.set(ConnectionState::Disconnected);
    }

    fn state(&self) -> ConnectionState {
        self.state.get()
    }

    fn backpressure(&self) -> bool {
        true
    }
}

/// Non-blank lines of `content`, trimmed, sharing its buffer
fn split_lines(content: &Bytes) -> Vec<Bytes> {
    content
        .split(|&b| b == b'\n')
        .map(<[u8]>::trim_ascii)
        .filter(|line| !line.is_empty())
        .map(|line| content.slice_ref(line))
        .collect()
}

impl Drop for ReplayAgentGateway {
    fn drop(&mut self) {
        self.stop();
    }
}
