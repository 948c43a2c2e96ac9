//! CLI argument definitions using clap.

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// promfed - federated queries over redundant Prometheus-style backends
#[derive(Parser, Debug)]
#[command(
    name = "promfed",
    author,
    version,
    about = "Federated queries over redundant time-series backends",
    long_about = "Runs one logical read (label values, instant query, range query, series)\n\
                  against every configured backend concurrently, tolerates partial failure\n\
                  and merges the answers, deduplicating samples of redundant replicas."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "PROMFED_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "PROMFED_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Values of one label across all backends
    LabelValues(LabelValuesArgs),

    /// Instant query
    Query(QueryArgs),

    /// Range query
    QueryRange(QueryRangeArgs),

    /// Series matching metric names
    Series(SeriesArgs),

    /// Validate configuration file without querying
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Options shared by every query command
#[derive(Args, Debug, Clone)]
pub struct FederationArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "promfed.toml",
        env = "PROMFED_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the anti-affinity window from configuration
    #[arg(long, env = "PROMFED_ANTI_AFFINITY_MS")]
    pub anti_affinity_ms: Option<u64>,

    /// Override the call deadline from configuration (0 = none)
    #[arg(long, env = "PROMFED_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Print per-backend call statistics to stderr
    #[arg(long)]
    pub stats: bool,

    /// Serve Prometheus metrics on this port while the command runs
    #[arg(long, env = "PROMFED_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

/// Arguments for the `label-values` command
#[derive(Parser, Debug, Clone)]
pub struct LabelValuesArgs {
    #[command(flatten)]
    pub federation: FederationArgs,

    /// Label name
    pub label: String,
}

/// Arguments for the `query` command
#[derive(Parser, Debug, Clone)]
pub struct QueryArgs {
    #[command(flatten)]
    pub federation: FederationArgs,

    /// Query expression
    pub query: String,

    /// Evaluation time (RFC 3339 or Unix seconds, default now)
    #[arg(long, value_parser = parse_time)]
    pub time: Option<DateTime<Utc>>,
}

/// Arguments for the `query-range` command
#[derive(Parser, Debug, Clone)]
pub struct QueryRangeArgs {
    #[command(flatten)]
    pub federation: FederationArgs,

    /// Query expression
    pub query: String,

    /// Range start (RFC 3339 or Unix seconds)
    #[arg(long, value_parser = parse_time)]
    pub start: DateTime<Utc>,

    /// Range end (RFC 3339 or Unix seconds)
    #[arg(long, value_parser = parse_time)]
    pub end: DateTime<Utc>,

    /// Resolution step in seconds
    #[arg(long, default_value = "15")]
    pub step: u64,
}

/// Arguments for the `series` command
#[derive(Parser, Debug, Clone)]
pub struct SeriesArgs {
    #[command(flatten)]
    pub federation: FederationArgs,

    /// Metric name matcher (repeatable; none = all series)
    #[arg(long = "match", value_name = "NAME")]
    pub matchers: Vec<String>,

    /// Range start (RFC 3339 or Unix seconds)
    #[arg(long, value_parser = parse_time)]
    pub start: Option<DateTime<Utc>>,

    /// Range end (RFC 3339 or Unix seconds)
    #[arg(long, value_parser = parse_time)]
    pub end: Option<DateTime<Utc>>,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "promfed.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "promfed.toml")]
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
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

/// Parse a timestamp given as RFC 3339 or (fractional) Unix seconds
pub fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(secs) = s.parse::<f64>() {
        return DateTime::from_timestamp_millis((secs * 1000.0).round() as i64)
            .ok_or_else(|| format!("timestamp out of range: {s}"));
    }
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp '{s}': {e}"))
}
