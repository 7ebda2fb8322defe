//! Pipeline statistics.

use std::time::Duration;

use ingestion::MetricsSnapshot;
use observability::MetricsSummary;

use super::StopReason;

/// Statistics from a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineStats {
    /// Store the records went to
    pub store: String,

    /// Wall-clock run time
    pub duration: Duration,

    /// Ingestion counters at shutdown
    pub snapshot: MetricsSnapshot,

    /// Road-state summary, when the classifier came back from its worker
    pub summary: Option<MetricsSummary>,

    /// Why the run ended
    pub stop_reason: StopReason,
}

impl PipelineStats {
    /// Messages handled per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.snapshot.messages_received as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Share of classified records that were lost to storage failures
    pub fn loss_rate(&self) -> f64 {
        let classified = self.snapshot.classified();
        if classified > 0 {
            (self.snapshot.save_failures as f64 / classified as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        let s = &self.snapshot;

        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Pipeline Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Stopped by: {}", self.stop_reason);
        println!("   ├─ Messages received: {}", s.messages_received);
        println!("   ├─ Throughput: {:.2} msg/s", self.throughput());
        println!("   ├─ Dropped (queue full): {}", s.messages_dropped);
        println!("   ├─ Malformed: {}", s.parse_errors);
        println!("   └─ Warm-up samples: {}", s.warming_up);

        println!("\n🛣️  Road Surface");
        println!("   ├─ Smooth: {}", s.smooth);
        println!("   ├─ Bumps: {}", s.bumps);
        println!("   └─ Potholes: {}", s.potholes);

        println!("\n💾 Storage ({})", self.store);
        println!("   ├─ Saved: {}", s.records_saved);
        println!(
            "   └─ Lost: {} ({:.2}%)",
            s.save_failures,
            self.loss_rate()
        );

        if let Some(ref summary) = self.summary {
            println!("\n📈 Vertical Acceleration");
            println!("   ├─ All records: {}", summary.vertical);
            println!("   └─ Anomalies: {}", summary.anomaly_vertical);
        }

        println!();
    }
}
