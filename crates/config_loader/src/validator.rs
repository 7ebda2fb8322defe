//! Configuration validation
//!
//! Rules:
//! - field-level ranges declared on the settings types (`validator` derive)
//! - window capacity fixed at 3
//! - threshold height finite
//! - topic not blank
//! - sqlite backend requires a storage path

use ::validator::Validate;
use contracts::{ContractError, PipelineSettings, StorageBackend, WINDOW_CAPACITY};

/// Validate PipelineSettings
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(settings: &PipelineSettings) -> Result<(), ContractError> {
    settings.validate()?;
    validate_broker(settings)?;
    validate_classifier(settings)?;
    validate_storage(settings)?;
    Ok(())
}

/// Validate broker topic
fn validate_broker(settings: &PipelineSettings) -> Result<(), ContractError> {
    if settings.broker.topic.trim().is_empty() {
        return Err(ContractError::config_validation(
            "broker.topic",
            "topic cannot be blank",
        ));
    }
    Ok(())
}

/// Validate classifier tuning
fn validate_classifier(settings: &PipelineSettings) -> Result<(), ContractError> {
    let classifier = &settings.classifier;

    if classifier.window_capacity != WINDOW_CAPACITY {
        return Err(ContractError::config_validation(
            "classifier.window_capacity",
            format!(
                "window capacity is fixed at {WINDOW_CAPACITY}, got {}",
                classifier.window_capacity
            ),
        ));
    }

    if !classifier.threshold_height.is_finite() {
        return Err(ContractError::config_validation(
            "classifier.threshold_height",
            format!(
                "threshold_height must be finite, got {}",
                classifier.threshold_height
            ),
        ));
    }

    Ok(())
}

/// Validate storage settings
fn validate_storage(settings: &PipelineSettings) -> Result<(), ContractError> {
    let storage = &settings.storage;
    if storage.backend == StorageBackend::Sqlite && storage.path.as_os_str().is_empty() {
        return Err(ContractError::config_validation(
            "storage.path",
            "sqlite backend requires a database path",
        ));
    }
    Ok(())
}
