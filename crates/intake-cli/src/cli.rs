//! CLI argument definitions for freight-intake.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use intake_model::DateOrder;

#[derive(Parser)]
#[command(
    name = "freight-intake",
    version,
    about = "Map, normalize and validate shipment extracts",
    long_about = "Map arbitrary shipment extract headers onto the canonical schema,\n\
                  normalize dates and statuses, and validate every row.\n\n\
                  Input is a JSON intake request or a CSV extract."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Configuration file (default: platform config directory).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Process an intake request or CSV extract.
    Process(ProcessArgs),

    /// Print the stock header synonym table.
    Synonyms,

    /// Sign a request body with the secret in FREIGHT_INTAKE_SECRET.
    Sign(SignArgs),
}

#[derive(Parser)]
pub struct ProcessArgs {
    /// JSON intake request, or a .csv extract with a header row.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Zone assumed for dates without an offset (UTC, -05:00, America/Chicago).
    #[arg(long = "timezone", value_name = "ZONE")]
    pub timezone: Option<String>,

    /// Order tried first for bare numeric dates such as 03/04/2025.
    #[arg(long = "date-order", value_enum)]
    pub date_order: Option<DateOrderArg>,

    /// Analyze at most this many rows.
    #[arg(long = "row-limit", value_name = "N")]
    pub row_limit: Option<usize>,

    /// Canned mapping suggestions (JSON array, optionally in a ```json block).
    #[arg(long = "suggestions", value_name = "FILE")]
    pub suggestions: Option<PathBuf>,

    /// Deadline for the suggestion provider.
    #[arg(long = "suggest-timeout-ms", value_name = "MS")]
    pub suggest_timeout_ms: Option<u64>,

    /// Write the full response JSON to this file.
    #[arg(long = "output", short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Parser)]
pub struct SignArgs {
    /// File holding the JSON request body.
    #[arg(value_name = "BODY_JSON")]
    pub body: PathBuf,

    /// Unix timestamp in seconds to bind the signature to.
    #[arg(long = "timestamp", value_name = "N")]
    pub timestamp: i64,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DateOrderArg {
    MonthFirst,
    DayFirst,
}

impl From<DateOrderArg> for DateOrder {
    fn from(value: DateOrderArg) -> Self {
        match value {
            DateOrderArg::MonthFirst => DateOrder::MonthFirst,
            DateOrderArg::DayFirst => DateOrder::DayFirst,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
