//! Queue configuration and ingestion metrics

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use contracts::RoadState;
pub use contracts::{DropPolicy, IngestionConfig};

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Messages handed over by the gateway
    pub messages_received: AtomicU64,

    /// Messages dropped because the queue was full
    pub messages_dropped: AtomicU64,

    /// Messages discarded as malformed
    pub parse_errors: AtomicU64,

    /// Samples consumed while the window was warming up
    pub warming_up: AtomicU64,

    /// Records classified as smooth
    pub smooth: AtomicU64,

    /// Records classified as bump
    pub bumps: AtomicU64,

    /// Records classified as pothole
    pub potholes: AtomicU64,

    /// Records stored
    pub records_saved: AtomicU64,

    /// Records lost to storage failures
    pub save_failures: AtomicU64,

    /// Current raw queue length
    pub queue_len: AtomicUsize,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record message received
    pub fn record_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record message dropped, returning the running total
    pub fn record_dropped(&self) -> u64 {
        self.messages_dropped.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Record parse error
    pub fn record_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record warm-up sample
    pub fn record_warming_up(&self) {
        self.warming_up.fetch_add(1, Ordering::Relaxed);
    }

    /// Record classification outcome
    pub fn record_classified(&self, road_state: RoadState) {
        let counter = match road_state {
            RoadState::Smooth => &self.smooth,
            RoadState::Bump => &self.bumps,
            RoadState::Pothole => &self.potholes,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record storage outcome
    pub fn record_saved(&self, success: bool) {
        if success {
            self.records_saved.fetch_add(1, Ordering::Relaxed);
        } else {
            self.save_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Update queue length
    pub fn update_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            warming_up: self.warming_up.load(Ordering::Relaxed),
            smooth: self.smooth.load(Ordering::Relaxed),
            bumps: self.bumps.load(Ordering::Relaxed),
            potholes: self.potholes.load(Ordering::Relaxed),
            records_saved: self.records_saved.load(Ordering::Relaxed),
            save_failures: self.save_failures.load(Ordering::Relaxed),
            queue_len: self.queue_len.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub messages_received: u64,
    pub messages_dropped: u64,
    pub parse_errors: u64,
    pub warming_up: u64,
    pub smooth: u64,
    pub bumps: u64,
    pub potholes: u64,
    pub records_saved: u64,
    pub save_failures: u64,
    pub queue_len: usize,
}

impl MetricsSnapshot {
    /// Total records produced by the classifier
    pub fn classified(&self) -> u64 {
        self.smooth + self.bumps + self.potholes
    }

    /// Count for one road state
    pub fn count(&self, road_state: RoadState) -> u64 {
        match road_state {
            RoadState::Smooth => self.smooth,
            RoadState::Bump => self.bumps,
            RoadState::Pothole => self.potholes,
        }
    }
}
