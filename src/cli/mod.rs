//! Command-line interface definitions.

pub mod parse;
pub mod pnl;
pub mod run;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tradebridge - TradingView signals to risk-controlled Binance futures orders.
#[derive(Parser, Debug)]
#[command(name = "tradebridge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the webhook and run the background tasks (foreground)
    Run(RunArgs),

    /// Print realized PnL for one exchange-local day
    Pnl(PnlArgs),

    /// Parse a command string and print what it would do
    Parse(ParseArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Override log level (debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Use JSON log format instead of pretty
    #[arg(long)]
    pub json_logs: bool,

    /// Override the webhook port
    #[arg(long)]
    pub port: Option<u16>,
}

/// Arguments for the `pnl` subcommand.
#[derive(Parser, Debug)]
pub struct PnlArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Exchange-local date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

/// Arguments for the `parse` subcommand.
#[derive(Parser, Debug)]
pub struct ParseArgs {
    /// Command string, e.g. ETHUSDT_LONG_500_true_true_true
    pub command: String,
}
