//! `info` command implementation.

use anyhow::{Context, Result};
use config_loader::{ConfigFormat, ConfigLoader};
use contracts::{DropPolicy, PipelineSettings, StorageBackend};
use tracing::info;

use crate::cli::InfoArgs;

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = ?args.config, "Loading configuration info");

    let settings = ConfigLoader::load(args.config.as_deref()).with_context(|| match &args.config {
        Some(path) => format!("Failed to load config from {}", path.display()),
        None => "Failed to build default configuration".to_string(),
    })?;

    if args.json {
        let json = ConfigLoader::render(&settings, ConfigFormat::Json)
            .context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&settings, args);
    }

    Ok(())
}

fn print_config_info(settings: &PipelineSettings, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                 Road Sense Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    match &args.config {
        Some(path) => println!("📄 Source: {}\n", path.display()),
        None => println!("📄 Source: built-in defaults\n"),
    }

    let broker = &settings.broker;
    println!("📡 Broker");
    println!("   ├─ Endpoint: {}", broker.endpoint());
    println!("   ├─ Topic: {}", broker.topic);
    println!("   ├─ Client ID: {}", broker.client_id);
    println!("   └─ Keep-alive: {}s", broker.keep_alive_secs);

    let classifier = &settings.classifier;
    println!("\n📈 Classifier");
    println!("   ├─ Threshold height: {}", classifier.threshold_height);
    println!("   └─ Window: {} samples", classifier.window_capacity);

    println!("\n💾 Storage");
    match settings.storage.backend {
        StorageBackend::Sqlite => {
            println!("   ├─ Backend: sqlite");
            println!("   └─ Path: {}", settings.storage.path.display());
        }
        StorageBackend::Log => println!("   └─ Backend: log (records are not persisted)"),
    }

    let ingestion = &settings.ingestion;
    println!("\n⚙️  Ingestion");
    println!("   ├─ Message queue: {}", ingestion.queue_capacity);
    println!("   ├─ Record queue: {}", ingestion.record_queue_capacity);
    let policy = match ingestion.drop_policy {
        DropPolicy::DropNewest => "drop newest",
        DropPolicy::DropOldest => "drop oldest",
    };
    println!("   └─ Drop policy: {}", policy);

    println!();
}
