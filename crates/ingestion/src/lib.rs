//! # Ingestion
//!
//! Turns raw gateway messages into persisted road-surface records.
//!
//! - Strict payload parsing into `SensorSample` (malformed messages are logged and skipped)
//! - Bounded raw queue between the gateway worker and the classifier: live
//!   gateways drop per policy when it is full, finite ones (replay) wait for room
//! - Classifier and store each owned by a single worker task
//! - In-process metrics with snapshots
//!
//! ## Usage
//!
//! ```ignore
//! use ingestion::IngestionOrchestrator;
//!
//! let mut orchestrator = IngestionOrchestrator::new(
//!     gateway,
//!     store,
//!     RoadClassifier::from_config(&settings.classifier),
//!     settings.ingestion.clone(),
//! );
//! orchestrator.start().await?;
//! shutdown_signal().await;
//! orchestrator.shutdown().await;
//! ```
//!
//! ## Mock Testing
//!
//! ```ignore
//! use ingestion::{sample_payload, MockMessageGateway};
//!
//! let gateway = MockMessageGateway::new("agent_data_topic");
//! let injector = gateway.injector();
//! // ... start an orchestrator with `gateway`
//! injector.deliver(sample_payload(16400.0, 0));
//! ```

mod config;
mod error;
mod handler;
mod mock;
mod orchestrator;
mod payload;
mod queue;

// Re-exports
pub use config::{DropPolicy, IngestionConfig, IngestionMetrics, MetricsSnapshot};
pub use contracts::{ClassifiedRecord, RawMessage, SensorSample};
pub use error::{IngestionError, Result};
pub use handler::{MessageHandler, MessageOutcome};
pub use mock::{sample_payload, MockInjector, MockMessageGateway};
pub use orchestrator::IngestionOrchestrator;
pub use payload::{decode_payload, parse_sample};
pub use queue::{enqueue_blocking, enqueue_message};
