//! CLI argument definitions.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "filawidth", version, about = "Filament width compensation CLI")]
pub struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE", default_value = "etc/filawidth.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the compensation loop against a simulated sensor and extruder
    Run {
        /// Stop after this many seconds (runs until Ctrl-C when absent)
        #[arg(long, value_name = "SECONDS")]
        duration_s: Option<u64>,

        /// Simulated extruder feed rate in mm/s
        #[arg(long, value_name = "MM_PER_S", default_value_t = 5.0)]
        feed_rate: f64,

        /// Simulate a filament runout starting at this many seconds
        #[arg(long, value_name = "SECONDS")]
        runout_at_s: Option<f64>,

        /// Duration of the simulated runout window in seconds
        #[arg(long, value_name = "SECONDS", default_value_t = 3.0)]
        runout_for_s: f64,
    },
    /// Take one simulated sample and print the status snapshot
    Query,
    /// Validate the config file and exit
    Check,
}
