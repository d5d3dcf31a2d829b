//! Command-line arguments.

use clap::Parser;
use std::path::PathBuf;

/// Relay wiki abuse-filter hits to IRC.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "filterwatch")]
#[command(about = "Relays wiki abuse-filter hits to IRC channels")]
#[command(version)]
pub struct Cli {
    /// Bot configuration file
    #[arg(short, long, env = "FILTERWATCH_CONFIG", default_value = "bots.toml")]
    pub config: PathBuf,

    /// Log level used when RUST_LOG is not set
    #[arg(
        short,
        long,
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"]
    )]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Validate the configuration, print the instance plan and exit
    #[arg(long)]
    pub check: bool,
}
