//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Mine Monitor - live telemetry dashboard backend for mine sensors
#[derive(Parser, Debug)]
#[command(
    name = "mine-monitor",
    author,
    version,
    about = "Real-time telemetry monitor for mine sensors",
    long_about = "Subscribes to sensor telemetry on an MQTT broker, keeps a bounded \n\
                  per-sensor history, and raises a device alarm when any \n\
                  acceleration axis exceeds the configured threshold."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "MINE_MONITOR_VERBOSE")]
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
        env = "MINE_MONITOR_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the monitor
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when absent
    #[arg(short, long, env = "MINE_MONITOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override broker URI, e.g. mqtt://broker.local:1883
    #[arg(long, env = "MINE_MONITOR_BROKER")]
    pub broker: Option<String>,

    /// Feed the monitor from the built-in generator instead of a broker
    #[arg(long, env = "MINE_MONITOR_SIMULATE")]
    pub simulate: bool,

    /// Dashboard refresh interval in milliseconds
    #[arg(long, default_value = "1000", env = "MINE_MONITOR_REFRESH_MS")]
    pub refresh_ms: u64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "MINE_MONITOR_METRICS_PORT")]
    pub metrics_port: u16,

    /// Stop after this many seconds (0 = run until interrupted)
    #[arg(long, default_value = "0", env = "MINE_MONITOR_TIMEOUT")]
    pub timeout: u64,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "monitor.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "monitor.toml")]
    pub config: PathBuf,

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
