//! PipelineSettings - Config Loader output
//!
//! Describes the complete service configuration: broker, classifier,
//! storage and ingestion queues. Every section is optional on disk.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Classification window capacity (prev, curr, next)
pub const WINDOW_CAPACITY: usize = 3;

/// Default bump/pothole threshold magnitude
pub const DEFAULT_THRESHOLD_HEIGHT: f64 = 1000.0;

/// Complete service settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PipelineSettings {
    /// Broker connection
    #[serde(default)]
    #[validate(nested)]
    pub broker: BrokerConfig,

    /// Classifier tuning
    #[serde(default)]
    #[validate(nested)]
    pub classifier: ClassifierConfig,

    /// Record storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Internal queues
    #[serde(default)]
    #[validate(nested)]
    pub ingestion: IngestionConfig,
}

/// Broker connection settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BrokerConfig {
    /// Broker host
    #[serde(default = "default_broker_host")]
    #[validate(length(min = 1))]
    pub host: String,

    /// Broker port
    #[serde(default = "default_broker_port")]
    #[validate(range(min = 1))]
    pub port: u16,

    /// Topic carrying agent samples
    #[serde(default = "default_topic")]
    #[validate(length(min = 1))]
    pub topic: String,

    /// MQTT client identifier
    #[serde(default = "default_client_id")]
    #[validate(length(min = 1))]
    pub client_id: String,

    /// Keep-alive interval (seconds)
    #[serde(default = "default_keep_alive")]
    #[validate(range(min = 5))]
    pub keep_alive_secs: u64,
}

impl BrokerConfig {
    /// `host:port`, for logging and errors
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: default_broker_host(),
            port: default_broker_port(),
            topic: default_topic(),
            client_id: default_client_id(),
            keep_alive_secs: default_keep_alive(),
        }
    }
}

fn default_broker_host() -> String {
    "localhost".to_string()
}

fn default_broker_port() -> u16 {
    1883
}

fn default_topic() -> String {
    "agent_data_topic".to_string()
}

fn default_client_id() -> String {
    "road-sense-hub".to_string()
}

fn default_keep_alive() -> u64 {
    60
}

/// Classifier tuning
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ClassifierConfig {
    /// Minimum z-delta on both sides of a local extremum
    #[serde(default = "default_threshold")]
    pub threshold_height: f64,

    /// Window capacity; fixed, accepted only for explicitness
    #[serde(default = "default_window_capacity")]
    #[validate(range(min = 3, max = 3))]
    pub window_capacity: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            threshold_height: default_threshold(),
            window_capacity: default_window_capacity(),
        }
    }
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD_HEIGHT
}

fn default_window_capacity() -> usize {
    WINDOW_CAPACITY
}

/// Storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// SQLite file
    #[default]
    Sqlite,
    /// Log only (dry runs)
    Log,
}

/// Storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend kind
    #[serde(default)]
    pub backend: StorageBackend,

    /// Database location (sqlite backend)
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("agent_data.db")
}

/// Drop policy when the ingestion queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPolicy {
    /// Discard the incoming message
    #[default]
    DropNewest,
    /// Evict the oldest queued message to make room
    DropOldest,
}

/// Ingestion queue settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IngestionConfig {
    /// Raw message queue capacity (gateway -> classifier)
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1))]
    pub queue_capacity: usize,

    /// Record queue capacity (classifier -> storage)
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1))]
    pub record_queue_capacity: usize,

    /// Behaviour when the raw message queue is full
    #[serde(default)]
    pub drop_policy: DropPolicy,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            record_queue_capacity: default_queue_capacity(),
            drop_policy: DropPolicy::default(),
        }
    }
}

fn default_queue_capacity() -> usize {
    100
}
