//! Command-line interface definitions and parsing

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path (uartlink.toml)
    #[arg(short, long)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect to the remote box and run the scripted probe exchange
    Central {
        /// Remote device address (overrides the config file)
        #[arg(short, long)]
        address: Option<String>,

        /// Local adapter name
        #[arg(long)]
        adapter: Option<String>,

        /// Probe sent on the phone channel
        #[arg(short, long, default_value = "act\n")]
        message: String,

        /// Per-receive timeout for the drain loop, in seconds
        #[arg(short, long, default_value_t = 2)]
        timeout: u64,
    },
    /// Serve the phone UART GATT service and answer inbound writes
    Peripheral {
        /// Advertised local name (overrides the config file)
        #[arg(short, long)]
        name: Option<String>,

        /// Local adapter name
        #[arg(long)]
        adapter: Option<String>,
    },
}
