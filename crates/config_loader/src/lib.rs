//! # Config Loader
//!
//! Builds the effective `PipelineSettings` for a run:
//! settings file (or built-in defaults), then per-run overrides, then
//! validation of the combined result.
//!
//! ```no_run
//! use config_loader::{ConfigLoader, SettingsOverrides};
//! use std::path::Path;
//!
//! let overrides = SettingsOverrides {
//!     threshold_height: Some(850.0),
//!     ..Default::default()
//! };
//! let settings =
//!     ConfigLoader::load_with_overrides(Some(Path::new("road-sense.toml")), &overrides)?;
//! println!("Broker: {}", settings.broker.endpoint());
//! # Ok::<(), contracts::ContractError>(())
//! ```

mod format;
mod overrides;
mod validator;

pub use contracts::PipelineSettings;
pub use format::ConfigFormat;
pub use overrides::SettingsOverrides;

use std::path::Path;

use contracts::ContractError;
use tracing::{debug, info};

/// Settings loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Settings from `path`, or the defaults when `None`, validated
    pub fn load(path: Option<&Path>) -> Result<PipelineSettings, ContractError> {
        Self::load_with_overrides(path, &SettingsOverrides::default())
    }

    /// Settings from `path` (or defaults) with `overrides` applied
    ///
    /// Validation runs once, on the combined result: an override may repair
    /// a value the file got wrong, and an override is held to the same rules
    /// as the file.
    ///
    /// # Errors
    /// - `ConfigNotFound` when `path` does not exist
    /// - `ConfigParse` for an unknown extension or malformed content
    /// - `ConfigValidation` when the combined settings break a rule
    pub fn load_with_overrides(
        path: Option<&Path>,
        overrides: &SettingsOverrides,
    ) -> Result<PipelineSettings, ContractError> {
        let mut settings = match path {
            Some(path) => Self::read(path)?,
            None => {
                debug!("no settings file, using defaults");
                PipelineSettings::default()
            }
        };

        let applied = overrides.apply(&mut settings);
        if !applied.is_empty() {
            info!(fields = ?applied, "settings overridden");
        }

        validator::validate(&settings)?;
        Ok(settings)
    }

    /// Parse and validate settings text
    pub fn parse_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<PipelineSettings, ContractError> {
        let settings = format.parse(content)?;
        validator::validate(&settings)?;
        Ok(settings)
    }

    /// Check settings assembled in code
    pub fn validate(settings: &PipelineSettings) -> Result<(), ContractError> {
        validator::validate(settings)
    }

    /// Serialize settings, e.g. to show the effective configuration
    pub fn render(
        settings: &PipelineSettings,
        format: ConfigFormat,
    ) -> Result<String, ContractError> {
        format.render(settings)
    }

    fn read(path: &Path) -> Result<PipelineSettings, ContractError> {
        if !path.exists() {
            return Err(ContractError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        info!(path = %path.display(), format = format.name(), "loading settings");
        format.parse(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn settings_file(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(suffix).unwrap();
        write!(file, "{content}").unwrap();
        file
    }

    #[test]
    fn test_defaults_without_file() {
        let settings = ConfigLoader::load(None).unwrap();
        assert_eq!(settings.broker.port, 1883);
        assert_eq!(settings.broker.topic, "agent_data_topic");
        assert_eq!(settings.storage.path, Path::new("agent_data.db"));
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::load(Some(Path::new("/nonexistent/road-sense.toml"))).unwrap_err();
        assert!(matches!(err, ContractError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_overrides_win_over_file() {
        let file = settings_file(
            ".toml",
            "[broker]\nhost = \"file-host\"\nport = 1999\n\n[classifier]\nthreshold_height = 500.0\n",
        );
        let overrides = SettingsOverrides {
            host: Some("cli-host".to_string()),
            threshold_height: Some(250.0),
            ..Default::default()
        };

        let settings = ConfigLoader::load_with_overrides(Some(file.path()), &overrides).unwrap();
        assert_eq!(settings.broker.host, "cli-host");
        assert_eq!(settings.broker.port, 1999);
        assert_eq!(settings.classifier.threshold_height, 250.0);
    }

    #[test]
    fn test_override_can_repair_file() {
        let file = settings_file(".json", r#"{ "broker": { "topic": "  " } }"#);
        assert!(ConfigLoader::load(Some(file.path())).is_err());

        let overrides = SettingsOverrides {
            topic: Some("agent/data".to_string()),
            ..Default::default()
        };
        let settings = ConfigLoader::load_with_overrides(Some(file.path()), &overrides).unwrap();
        assert_eq!(settings.broker.topic, "agent/data");
    }

    #[test]
    fn test_override_is_validated() {
        let overrides = SettingsOverrides {
            port: Some(0),
            ..Default::default()
        };
        let err = ConfigLoader::load_with_overrides(None, &overrides).unwrap_err();
        assert!(matches!(err, ContractError::ConfigValidation { .. }));
    }

    #[test]
    fn test_parse_str_validates() {
        let err = ConfigLoader::parse_str("[classifier]\nwindow_capacity = 4", ConfigFormat::Toml)
            .unwrap_err();
        assert!(matches!(err, ContractError::ConfigValidation { .. }));
    }

    #[test]
    fn test_render_json_is_loadable() {
        let settings = ConfigLoader::load(None).unwrap();
        let json = ConfigLoader::render(&settings, ConfigFormat::Json).unwrap();
        let file = settings_file(".json", &json);
        let again = ConfigLoader::load(Some(file.path())).unwrap();
        assert_eq!(again.broker.client_id, settings.broker.client_id);
    }
}
