//! Per-run settings overrides (command line or environment)

use std::path::PathBuf;

use contracts::PipelineSettings;

/// Values that replace what the settings file says
///
/// `None` leaves the loaded value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub topic: Option<String>,
    pub threshold_height: Option<f64>,
    pub storage_path: Option<PathBuf>,
}

impl SettingsOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply to `settings`, returning the names of the fields replaced
    pub fn apply(&self, settings: &mut PipelineSettings) -> Vec<&'static str> {
        let mut applied = Vec::new();

        if let Some(host) = &self.host {
            settings.broker.host = host.clone();
            applied.push("broker.host");
        }
        if let Some(port) = self.port {
            settings.broker.port = port;
            applied.push("broker.port");
        }
        if let Some(topic) = &self.topic {
            settings.broker.topic = topic.clone();
            applied.push("broker.topic");
        }
        if let Some(threshold) = self.threshold_height {
            settings.classifier.threshold_height = threshold;
            applied.push("classifier.threshold_height");
        }
        if let Some(path) = &self.storage_path {
            settings.storage.path = path.clone();
            applied.push("storage.path");
        }

        applied
    }
}
