//! Per-message processing: parse, classify, account

use std::sync::Arc;

use classifier::RoadClassifier;
use contracts::{ClassifiedRecord, RawMessage};
use observability::{MetricsSummary, RoadMetricsAggregator};
use tracing::{debug, warn};

use crate::config::IngestionMetrics;
use crate::payload::parse_sample;

/// What happened to one inbound message
#[derive(Debug, Clone, PartialEq)]
pub enum MessageOutcome {
    /// Malformed payload, logged and skipped
    Discarded,
    /// Parsed, but the window is not yet full
    WarmingUp,
    /// Classified record ready for persistence
    Classified(ClassifiedRecord),
}

impl MessageOutcome {
    pub fn into_record(self) -> Option<ClassifiedRecord> {
        match self {
            Self::Classified(record) => Some(record),
            _ => None,
        }
    }
}

/// Owns the classifier and turns raw messages into records
///
/// Exactly one handler consumes a stream, so classifier state is never shared.
#[derive(Debug)]
pub struct MessageHandler {
    classifier: RoadClassifier,
    metrics: Arc<IngestionMetrics>,
    aggregator: RoadMetricsAggregator,
}

impl MessageHandler {
    pub fn new(classifier: RoadClassifier, metrics: Arc<IngestionMetrics>) -> Self {
        Self {
            classifier,
            metrics,
            aggregator: RoadMetricsAggregator::new(),
        }
    }

    pub fn classifier(&self) -> &RoadClassifier {
        &self.classifier
    }

    /// Road-state summary of everything classified by this handler
    pub fn summary(&self) -> MetricsSummary {
        self.aggregator.summary()
    }

    /// Process one message
    ///
    /// Never fails: a bad payload only affects its own message.
    pub fn handle(&mut self, message: &RawMessage) -> MessageOutcome {
        let sample = match parse_sample(message) {
            Ok(sample) => sample,
            Err(e) => {
                self.metrics.record_parse_error();
                observability::record_parse_failure(&message.topic);
                warn!(
                    topic = %message.topic,
                    payload_len = message.payload.len(),
                    error = %e,
                    "discarding malformed message"
                );
                return MessageOutcome::Discarded;
            }
        };

        match self.classifier.process(sample) {
            Some(record) => {
                self.metrics.record_classified(record.road_state);
                self.aggregator.update(&record);
                observability::record_classification(&record);
                MessageOutcome::Classified(record)
            }
            None => {
                self.metrics.record_warming_up();
                debug!(topic = %message.topic, "not enough data to classify yet");
                MessageOutcome::WarmingUp
            }
        }
    }
}
