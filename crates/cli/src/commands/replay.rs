//! `replay` command implementation.

use std::time::Duration;

use agent_gateway::{ReplayAgentGateway, ReplayConfig};
use anyhow::{Context, Result};
use classifier::RoadClassifier;
use config_loader::{ConfigLoader, SettingsOverrides};
use hub_gateway::HubStore;
use ingestion::IngestionOrchestrator;
use tracing::info;

use crate::cli::ReplayArgs;
use crate::error::CliError;
use crate::pipeline::drive;

/// Execute the `replay` command
pub async fn run_replay(args: &ReplayArgs) -> Result<()> {
    let overrides = SettingsOverrides::from(&args.overrides);
    let settings = ConfigLoader::load_with_overrides(args.config.as_deref(), &overrides)
        .map_err(CliError::from)?;

    let gateway = ReplayAgentGateway::load(
        &args.input,
        ReplayConfig {
            topic: settings.broker.topic.clone(),
            interval: Duration::from_millis(args.interval_ms),
            loop_playback: args.loop_playback,
        },
    )
    .map_err(CliError::from)?;

    info!(
        input = %args.input.display(),
        messages = gateway.len(),
        interval_ms = args.interval_ms,
        looping = args.loop_playback,
        "Replaying recorded payloads"
    );

    let store = HubStore::from_config(&settings.storage).map_err(CliError::from)?;
    let orchestrator = IngestionOrchestrator::new(
        gateway,
        store,
        RoadClassifier::from_config(&settings.classifier),
        settings.ingestion.clone(),
    );

    let timeout = (args.timeout > 0).then(|| Duration::from_secs(args.timeout));
    let stats = drive(orchestrator, timeout, ReplayAgentGateway::is_finished)
        .await
        .with_context(|| format!("Failed to replay {}", args.input.display()))?;

    stats.print_summary();
    Ok(())
}
