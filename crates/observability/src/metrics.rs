//! Road-sense pipeline metrics
//!
//! Thin wrappers over the `metrics` facade plus an in-memory aggregator
//! for end-of-run summaries.

use std::collections::BTreeMap;

use contracts::{ClassifiedRecord, RoadState};
use metrics::{counter, gauge, histogram};

/// Record a message handed over by the gateway
pub fn record_message_received(topic: &str) {
    counter!(
        "road_sense_messages_received_total",
        "topic" => topic.to_string()
    )
    .increment(1);
}

/// Record a message dropped by queue backpressure
pub fn record_message_dropped() {
    counter!("road_sense_messages_dropped_total").increment(1);
}

/// Record a payload that failed to decode or parse
pub fn record_parse_failure(topic: &str) {
    counter!(
        "road_sense_parse_failures_total",
        "topic" => topic.to_string()
    )
    .increment(1);
}

/// Record one classifier output
pub fn record_classification(record: &ClassifiedRecord) {
    counter!(
        "road_sense_classifications_total",
        "road_state" => record.road_state.as_str()
    )
    .increment(1);
    histogram!("road_sense_vertical_acceleration").record(record.sample.vertical());
}

/// Record a persistence attempt
pub fn record_record_saved(store: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "road_sense_records_saved_total",
        "store" => store.to_string(),
        "status" => status
    )
    .increment(1);
}

/// Record raw queue depth
pub fn record_queue_len(len: usize) {
    gauge!("road_sense_queue_len").set(len as f64);
}

/// Road-state aggregator
///
/// Keeps in-memory counts so a run (or a stored history) can be summarized.
#[derive(Debug, Default)]
pub struct RoadMetricsAggregator {
    pub total_records: u64,
    pub state_counts: BTreeMap<RoadState, u64>,
    pub vertical: RunningStats,
    pub anomaly_vertical: RunningStats,
}

impl RoadMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one classified record
    pub fn update(&mut self, record: &ClassifiedRecord) {
        self.total_records += 1;
        *self.state_counts.entry(record.road_state).or_insert(0) += 1;

        let z = record.sample.vertical();
        self.vertical.push(z);
        if record.road_state.is_anomaly() {
            self.anomaly_vertical.push(z);
        }
    }

    pub fn count(&self, road_state: RoadState) -> u64 {
        self.state_counts.get(&road_state).copied().unwrap_or(0)
    }

    pub fn summary(&self) -> MetricsSummary {
        let anomalies = self.count(RoadState::Bump) + self.count(RoadState::Pothole);
        let anomaly_rate = if self.total_records > 0 {
            anomalies as f64 / self.total_records as f64 * 100.0
        } else {
            0.0
        };

        MetricsSummary {
            total_records: self.total_records,
            smooth: self.count(RoadState::Smooth),
            bumps: self.count(RoadState::Bump),
            potholes: self.count(RoadState::Pothole),
            anomaly_rate,
            vertical: StatsSummary::from(&self.vertical),
            anomaly_vertical: StatsSummary::from(&self.anomaly_vertical),
        }
    }
}

/// Aggregated road-state summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_records: u64,
    pub smooth: u64,
    pub bumps: u64,
    pub potholes: u64,
    /// Percentage of records that are bumps or potholes
    pub anomaly_rate: f64,
    pub vertical: StatsSummary,
    pub anomaly_vertical: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Road Surface Summary ===")?;
        writeln!(f, "Classified records: {}", self.total_records)?;
        writeln!(f, "  smooth:  {}", self.smooth)?;
        writeln!(f, "  bump:    {}", self.bumps)?;
        writeln!(f, "  pothole: {}", self.potholes)?;
        writeln!(f, "Anomaly rate: {:.2}%", self.anomaly_rate)?;
        writeln!(f, "Vertical acceleration: {}", self.vertical)?;
        writeln!(f, "Anomaly vertical acceleration: {}", self.anomaly_vertical)?;
        Ok(())
    }
}

/// Summary statistics
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Accelerometer, Gps, SensorSample};

    fn record(road_state: RoadState, z: f64) -> ClassifiedRecord {
        let sample = SensorSample::new(
            Accelerometer { x: 0.0, y: 0.0, z },
            Gps {
                latitude: 50.45,
                longitude: 30.52,
            },
            contracts::timestamp::parse("2024-02-27T10:00:00Z").unwrap(),
        );
        ClassifiedRecord::new(road_state, sample)
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_counts_states() {
        let mut aggregator = RoadMetricsAggregator::new();
        aggregator.update(&record(RoadState::Smooth, 16000.0));
        aggregator.update(&record(RoadState::Smooth, 16100.0));
        aggregator.update(&record(RoadState::Bump, 19000.0));
        aggregator.update(&record(RoadState::Pothole, 12000.0));

        let summary = aggregator.summary();
        assert_eq!(summary.total_records, 4);
        assert_eq!(summary.smooth, 2);
        assert_eq!(summary.bumps, 1);
        assert_eq!(summary.potholes, 1);
        assert!((summary.anomaly_rate - 50.0).abs() < 1e-10);
        assert_eq!(summary.anomaly_vertical.count, 2);
        assert_eq!(summary.vertical.max, 19000.0);
    }

    #[test]
    fn test_empty_summary_display() {
        let summary = RoadMetricsAggregator::new().summary();
        let output = summary.to_string();
        assert!(output.contains("Classified records: 0"));
        assert!(output.contains("N/A"));
    }
}
