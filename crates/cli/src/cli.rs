//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Pileup Merger - Stochastic event stream merger for detector simulation
#[derive(Parser, Debug)]
#[command(
    name = "pileup-merger",
    author,
    version,
    about = "Stochastic pile-up merger for simulated event streams",
    long_about = "Interleaves independently simulated event components into merged \n\
                  datasets. Arrival times are drawn from per-stream exponential \n\
                  clocks, isolated single-class events are discarded by a rolling \n\
                  coincidence filter, and the surviving payloads are materialized \n\
                  into timestamped container files."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "PILEUP_MERGER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "PILEUP_MERGER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a merge campaign
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration or dataset information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "config.toml",
        env = "PILEUP_MERGER_CONFIG"
    )]
    pub config: PathBuf,

    /// Number of datasets to produce
    #[arg(
        short = 'n',
        long,
        default_value = "1",
        env = "PILEUP_MERGER_NUM_DATASETS"
    )]
    pub num_datasets: u32,

    /// Index of the first dataset file
    #[arg(
        short = 's',
        long,
        default_value = "0",
        env = "PILEUP_MERGER_START_INDEX"
    )]
    pub start_index: u32,

    /// Simulated live time per dataset in seconds
    #[arg(
        short = 't',
        long,
        default_value = "3600",
        env = "PILEUP_MERGER_LIVE_TIME"
    )]
    pub live_time: f64,

    /// Subdirectory appended to both storage roots (geometry/target variant)
    #[arg(short = 'd', long, env = "PILEUP_MERGER_SUBDIR")]
    pub subdir: Option<String>,

    /// Base RNG seed (derived from clock and pid when omitted)
    #[arg(long, env = "PILEUP_MERGER_SEED")]
    pub seed: Option<u64>,

    /// Validate configuration and resolve sources without merging
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "PILEUP_MERGER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show resolved per-component source file counts
    #[arg(long)]
    pub components: bool,

    /// Inspect a merged dataset instead of the configuration
    #[arg(long)]
    pub dataset: Option<PathBuf>,

    /// Maximum events to list when inspecting a dataset
    #[arg(long, default_value = "10")]
    pub limit: usize,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
