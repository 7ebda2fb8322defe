//! On-disk settings formats, chosen by file extension

use std::path::Path;

use contracts::{ContractError, PipelineSettings};

/// Settings file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Format of `path`, from its extension (case-insensitive)
    pub fn from_path(path: &Path) -> Result<Self, ContractError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                ContractError::config_parse(format!(
                    "{} has no extension, expected .toml or .json",
                    path.display()
                ))
            })?;

        if ext.eq_ignore_ascii_case("toml") {
            Ok(Self::Toml)
        } else if ext.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else {
            Err(ContractError::config_parse(format!(
                "unsupported settings format .{ext}, expected .toml or .json"
            )))
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
        }
    }

    /// Deserialize settings; absent sections take their defaults
    pub fn parse(self, content: &str) -> Result<PipelineSettings, ContractError> {
        let parsed = match self {
            Self::Toml => toml::from_str(content).map_err(boxed),
            Self::Json => serde_json::from_str(content).map_err(boxed),
        };
        parsed.map_err(|e| ContractError::ConfigParse {
            message: format!("{} parse error: {e}", self.name()),
            source: Some(e),
        })
    }

    /// Serialize settings in this format
    pub fn render(self, settings: &PipelineSettings) -> Result<String, ContractError> {
        let rendered = match self {
            Self::Toml => toml::to_string_pretty(settings).map_err(boxed),
            Self::Json => serde_json::to_string_pretty(settings).map_err(boxed),
        };
        rendered.map_err(|e| ContractError::ConfigParse {
            message: format!("{} serialize error: {e}", self.name()),
            source: Some(e),
        })
    }
}

fn boxed<E>(e: E) -> Box<dyn std::error::Error + Send + Sync>
where
    E: std::error::Error + Send + Sync + 'static,
{
    Box::new(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DropPolicy, StorageBackend};

    #[test]
    fn test_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("road-sense.toml")).unwrap(),
            ConfigFormat::Toml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("/etc/road-sense/HUB.JSON")).unwrap(),
            ConfigFormat::Json
        );
        assert!(ConfigFormat::from_path(Path::new("settings.yaml")).is_err());
        assert!(ConfigFormat::from_path(Path::new("settings")).is_err());
    }

    #[test]
    fn test_parse_every_section() {
        let content = r#"
[broker]
host = "broker.example"
port = 8883
client_id = "hub-1"
keep_alive_secs = 30

[storage]
backend = "log"

[ingestion]
queue_capacity = 16
record_queue_capacity = 8
drop_policy = "drop_oldest"
"#;
        let settings = ConfigFormat::Toml.parse(content).unwrap();
        assert_eq!(settings.broker.client_id, "hub-1");
        assert_eq!(settings.broker.topic, "agent_data_topic");
        assert_eq!(settings.storage.backend, StorageBackend::Log);
        assert_eq!(settings.ingestion.drop_policy, DropPolicy::DropOldest);
        assert_eq!(settings.classifier.threshold_height, 1000.0);
    }

    #[test]
    fn test_json_integer_threshold() {
        let content = r#"{ "classifier": { "threshold_height": 500 } }"#;
        let settings = ConfigFormat::Json.parse(content).unwrap();
        assert_eq!(settings.classifier.threshold_height, 500.0);
        assert_eq!(settings.broker.port, 1883);
    }

    #[test]
    fn test_parse_errors_name_the_format() {
        let err = ConfigFormat::Toml.parse("[storage]\nbackend = \"postgres\"").unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
        assert!(err.to_string().contains("TOML"));

        let err = ConfigFormat::Json.parse("{").unwrap_err();
        assert!(err.to_string().contains("JSON"));
    }

    #[test]
    fn test_render_then_parse_keeps_storage() {
        let mut settings = PipelineSettings::default();
        settings.storage.path = "/var/lib/road-sense/agent_data.db".into();

        for format in [ConfigFormat::Toml, ConfigFormat::Json] {
            let text = format.render(&settings).unwrap();
            let again = format.parse(&text).unwrap();
            assert_eq!(again.storage.path, settings.storage.path);
        }
    }
}
