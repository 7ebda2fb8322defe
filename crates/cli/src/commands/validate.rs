//! `validate` command implementation.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{PipelineSettings, StorageBackend, DEFAULT_THRESHOLD_HEIGHT};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    broker: String,
    topic: String,
    threshold_height: f64,
    storage: String,
    queue_capacity: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    match ConfigLoader::load(Some(&args.config)) {
        Ok(settings) => {
            let warnings = collect_warnings(&settings);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    broker: settings.broker.endpoint(),
                    topic: settings.broker.topic.clone(),
                    threshold_height: settings.classifier.threshold_height,
                    storage: storage_label(&settings),
                    queue_capacity: settings.ingestion.queue_capacity,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

fn storage_label(settings: &PipelineSettings) -> String {
    match settings.storage.backend {
        StorageBackend::Sqlite => format!("sqlite ({})", settings.storage.path.display()),
        StorageBackend::Log => "log".to_string(),
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(settings: &PipelineSettings) -> Vec<String> {
    let mut warnings = Vec::new();

    let threshold = settings.classifier.threshold_height;
    if threshold == DEFAULT_THRESHOLD_HEIGHT {
        warnings.push(format!(
            "classifier.threshold_height is the uncalibrated default ({threshold})"
        ));
    } else if threshold == 0.0 {
        warnings.push(
            "classifier.threshold_height is 0 - every local extremum will be reported".to_string(),
        );
    } else if threshold < 0.0 {
        warnings.push(format!(
            "classifier.threshold_height is negative - its magnitude ({}) is used",
            threshold.abs()
        ));
    }

    if settings.storage.backend == StorageBackend::Log {
        warnings.push("storage.backend is 'log' - records will not be persisted".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Broker: {}", summary.broker);
            println!("  Topic: {}", summary.topic);
            println!("  Threshold: {}", summary.threshold_height);
            println!("  Storage: {}", summary.storage);
            println!("  Queue capacity: {}", summary.queue_capacity);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
