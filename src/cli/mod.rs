//! CLI interface for ticker-feed
//!
//! Provides subcommands for:
//! - `watch`: Stream the live ticker to the terminal
//! - `config`: Show the effective configuration

mod watch;

pub use watch::WatchArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "ticker-feed")]
#[command(about = "Live Bybit ticker feed with automatic reconnect")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream the live ticker
    Watch(WatchArgs),
    /// Show configuration
    Config,
}
