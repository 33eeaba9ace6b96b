//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use contracts::TimestampBasis;

/// rgbd-extract - pull RGB-D frames at given timestamps out of a recording
#[derive(Parser, Debug)]
#[command(
    name = "rgbd-extract",
    author,
    version,
    about = "Timestamp-targeted RGB-D frame extraction",
    long_about = "Scans a color + depth recording once and keeps the frames whose\n\
                  timestamps fall within a tolerance of the requested targets.\n\n\
                  Targets may be relative to the recording start or absolute epoch\n\
                  milliseconds combined with a reference time."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "RGBD_EXTRACT_VERBOSE")]
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
        env = "RGBD_EXTRACT_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Prometheus metrics port (disabled when unset)
    #[arg(long, global = true, env = "RGBD_EXTRACT_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract frames from a recording
    Run(RunArgs),

    /// Validate a configuration file without running
    Validate(ValidateArgs),

    /// Display recording information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone, Default)]
pub struct RunArgs {
    /// Configuration file (TOML or JSON); flags below override it
    #[arg(short, long, env = "RGBD_EXTRACT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Recording directory
    #[arg(short, long, env = "RGBD_EXTRACT_RECORDING")]
    pub recording: Option<PathBuf>,

    /// Target timestamps in ms (decimal, 0x hex or 0 octal), comma separated
    #[arg(short, long, value_delimiter = ',')]
    pub targets: Vec<String>,

    /// Match tolerance in ms (exclusive)
    #[arg(long)]
    pub tolerance: Option<u64>,

    /// Absolute start time of the recording in epoch ms
    #[arg(long, conflicts_with = "use_recording_start")]
    pub reference_time: Option<String>,

    /// Take the reference time from the recording manifest
    #[arg(long)]
    pub use_recording_start: bool,

    /// Basis the targets are given in
    #[arg(long, value_enum)]
    pub basis: Option<BasisArg>,

    /// Keep frames across repeated runs
    #[arg(long)]
    pub append: bool,

    /// Swap red and blue channels of the color frames
    #[arg(long)]
    pub swap_red_blue: bool,

    /// Log every kept frame at info level
    #[arg(long)]
    pub frame_log: bool,

    /// Scan the whole recording even when no later frame can match
    #[arg(long)]
    pub no_early_stop: bool,

    /// Number of extraction passes over the recording
    #[arg(long, default_value = "1")]
    pub runs: u32,

    /// Output the summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "extract.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Recording directory
    #[arg(short, long, env = "RGBD_EXTRACT_RECORDING")]
    pub recording: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// List every frame timestamp
    #[arg(long)]
    pub timestamps: bool,
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

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

/// Timestamp basis
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BasisArg {
    /// Infer from the targets and reference time
    Auto,
    /// Milliseconds since recording start
    Relative,
    /// Epoch milliseconds
    Absolute,
}

impl From<BasisArg> for TimestampBasis {
    fn from(basis: BasisArg) -> Self {
        match basis {
            BasisArg::Auto => Self::Auto,
            BasisArg::Relative => Self::Relative,
            BasisArg::Absolute => Self::Absolute,
        }
    }
}
