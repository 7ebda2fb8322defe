//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// road-sense - road-surface anomaly detection hub
#[derive(Parser, Debug)]
#[command(
    name = "road-sense",
    author,
    version,
    about = "Road-surface anomaly detection hub",
    long_about = "Subscribes to agent telemetry, classifies every sample as smooth road,\n\
                  bump or pothole with a three-sample sliding window, and stores the\n\
                  classified records."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "ROAD_SENSE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "ROAD_SENSE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the hub against the MQTT broker
    Run(RunArgs),

    /// Run the hub from a recorded JSONL file
    Replay(ReplayArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display effective configuration
    Info(InfoArgs),

    /// Show the most recent stored records
    History(HistoryArgs),
}

/// Settings overrides shared by `run` and `replay`
#[derive(Args, Debug, Clone, Default)]
pub struct OverrideArgs {
    /// Override broker host
    #[arg(long, env = "ROAD_SENSE_BROKER_HOST")]
    pub host: Option<String>,

    /// Override broker port
    #[arg(long, env = "ROAD_SENSE_BROKER_PORT")]
    pub port: Option<u16>,

    /// Override the subscribed topic
    #[arg(long, env = "ROAD_SENSE_TOPIC")]
    pub topic: Option<String>,

    /// Override the bump/pothole threshold height
    #[arg(long, env = "ROAD_SENSE_THRESHOLD", allow_negative_numbers = true)]
    pub threshold: Option<f64>,

    /// Override the SQLite database path
    #[arg(long, env = "ROAD_SENSE_DB")]
    pub db: Option<PathBuf>,
}

impl From<&OverrideArgs> for config_loader::SettingsOverrides {
    fn from(args: &OverrideArgs) -> Self {
        Self {
            host: args.host.clone(),
            port: args.port,
            topic: args.topic.clone(),
            threshold_height: args.threshold,
            storage_path: args.db.clone(),
        }
    }
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when omitted
    #[arg(short, long, env = "ROAD_SENSE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: OverrideArgs,

    /// Run timeout in seconds (0 = until Ctrl+C)
    #[arg(long, default_value = "0", env = "ROAD_SENSE_TIMEOUT")]
    pub timeout: u64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "ROAD_SENSE_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `replay` command
#[derive(Parser, Debug, Clone)]
pub struct ReplayArgs {
    /// Recorded payloads, one JSON sample per line
    #[arg(short, long)]
    pub input: PathBuf,

    /// Path to configuration file (TOML or JSON); defaults apply when omitted
    #[arg(short, long, env = "ROAD_SENSE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: OverrideArgs,

    /// Pause between replayed messages in milliseconds
    #[arg(long, default_value = "100")]
    pub interval_ms: u64,

    /// Start over at end of file
    #[arg(long = "loop")]
    pub loop_playback: bool,

    /// Run timeout in seconds (0 = until the file ends or Ctrl+C)
    #[arg(long, default_value = "0")]
    pub timeout: u64,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "road-sense.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file; defaults apply when omitted
    #[arg(short, long, env = "ROAD_SENSE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `history` command
#[derive(Parser, Debug)]
pub struct HistoryArgs {
    /// SQLite database written by `run`
    #[arg(long, default_value = "agent_data.db", env = "ROAD_SENSE_DB")]
    pub db: PathBuf,

    /// Number of records to show
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,

    /// Only show bumps and potholes
    #[arg(long)]
    pub anomalies: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
