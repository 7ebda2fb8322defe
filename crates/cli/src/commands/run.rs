//! `run` command implementation.

use std::time::Duration;

use agent_gateway::MqttAgentGateway;
use anyhow::{Context, Result};
use classifier::RoadClassifier;
use config_loader::{ConfigLoader, SettingsOverrides};
use hub_gateway::HubStore;
use ingestion::IngestionOrchestrator;
use tracing::info;

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{drive, StopReason};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    let overrides = SettingsOverrides::from(&args.overrides);
    let settings = ConfigLoader::load_with_overrides(args.config.as_deref(), &overrides)
        .map_err(CliError::from)?;

    info!(
        broker = %settings.broker.endpoint(),
        topic = %settings.broker.topic,
        threshold = settings.classifier.threshold_height,
        storage = ?settings.storage.backend,
        "Configuration loaded"
    );

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let gateway = MqttAgentGateway::new(settings.broker.clone()).map_err(CliError::from)?;
    let store = HubStore::from_config(&settings.storage).map_err(CliError::from)?;
    let orchestrator = IngestionOrchestrator::new(
        gateway,
        store,
        RoadClassifier::from_config(&settings.classifier),
        settings.ingestion.clone(),
    );

    let timeout = (args.timeout > 0).then(|| Duration::from_secs(args.timeout));
    let stats = drive(orchestrator, timeout, |_| false)
        .await
        .with_context(|| format!("Failed to run against {}", settings.broker.endpoint()))?;

    info!(
        received = stats.snapshot.messages_received,
        classified = stats.snapshot.classified(),
        saved = stats.snapshot.records_saved,
        duration_secs = stats.duration.as_secs_f64(),
        "Pipeline finished"
    );
    stats.print_summary();

    if let StopReason::GatewayFailed(code) = stats.stop_reason {
        return Err(CliError::gateway_failed(code).into());
    }
    Ok(())
}
