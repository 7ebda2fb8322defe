//! `history` command implementation.

use anyhow::{Context, Result};
use contracts::{timestamp, ClassifiedRecord};
use hub_gateway::SqliteHubGateway;
use observability::RoadMetricsAggregator;
use tracing::info;

use crate::cli::HistoryArgs;
use crate::error::CliError;

/// Execute the `history` command
pub fn run_history(args: &HistoryArgs) -> Result<()> {
    if !args.db.exists() {
        return Err(CliError::DatabaseNotFound {
            path: args.db.clone(),
        }
        .into());
    }

    info!(db = %args.db.display(), limit = args.limit, "Reading stored records");
    let store = SqliteHubGateway::open(&args.db).map_err(CliError::from)?;
    let total = store.count().map_err(CliError::from)?;
    let records = select_records(
        store.recent(args.limit).map_err(CliError::from)?,
        args.anomalies,
    );

    if args.json {
        let json =
            serde_json::to_string_pretty(&records).context("Failed to serialize records")?;
        println!("{}", json);
    } else {
        print_history(&records, total);
    }

    Ok(())
}

fn select_records(records: Vec<ClassifiedRecord>, anomalies_only: bool) -> Vec<ClassifiedRecord> {
    if anomalies_only {
        records
            .into_iter()
            .filter(|r| r.road_state.is_anomaly())
            .collect()
    } else {
        records
    }
}

fn print_history(records: &[ClassifiedRecord], total: u64) {
    println!(
        "{:>8}  {:<26}  {:<8}  {:>12}  {:>12}  {:>10}",
        "ID", "TIMESTAMP", "STATE", "LATITUDE", "LONGITUDE", "Z"
    );
    for record in records {
        let sample = &record.sample;
        println!(
            "{:>8}  {:<26}  {:<8}  {:>12.6}  {:>12.6}  {:>10.2}",
            record.id.map(|id| id.to_string()).unwrap_or_default(),
            timestamp::format(&sample.timestamp),
            record.road_state,
            sample.gps.latitude,
            sample.gps.longitude,
            sample.vertical(),
        );
    }

    let mut aggregator = RoadMetricsAggregator::new();
    for record in records {
        aggregator.update(record);
    }
    println!("\nShowing {} of {} stored records", records.len(), total);
    println!("{}", aggregator.summary());
}
