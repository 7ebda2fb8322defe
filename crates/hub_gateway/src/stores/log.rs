//! LogHubGateway - logs records via tracing instead of storing them

use contracts::{ClassifiedRecord, PersistenceGateway};
use tracing::{debug, info, instrument};

/// Store that only logs (dry runs, demos)
pub struct LogHubGateway {
    name: String,
    logged: u64,
}

impl LogHubGateway {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            logged: 0,
        }
    }

    /// Records seen so far
    pub fn logged(&self) -> u64 {
        self.logged
    }
}

impl Default for LogHubGateway {
    fn default() -> Self {
        Self::new("log")
    }
}

impl PersistenceGateway for LogHubGateway {
    fn name(&self) -> &str {
        &self.name
    }

    async fn save(&mut self, record: &ClassifiedRecord) -> bool {
        self.logged += 1;
        let sample = &record.sample;
        if record.road_state.is_anomaly() {
            info!(
                store = %self.name,
                road_state = %record.road_state,
                z = sample.vertical(),
                latitude = sample.gps.latitude,
                longitude = sample.gps.longitude,
                timestamp = %contracts::timestamp::format(&sample.timestamp),
                "road anomaly"
            );
        } else {
            debug!(store = %self.name, z = sample.vertical(), "smooth road");
        }
        true
    }

    #[instrument(name = "log_hub_close", skip(self))]
    async fn close(&mut self) {
        info!(store = %self.name, logged = self.logged, "LogHubGateway closed");
    }
}
