//! uartlink CLI entry point

use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use uartlink_cli::{
    cli::{Cli, Commands},
    commands,
    config::AppConfig,
    error::Result,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_configuration(&cli)?;

    match cli.command {
        Commands::Central {
            address,
            adapter,
            message,
            timeout,
        } => {
            let mut central = config.central;
            if let Some(address) = address {
                central.device_address = address;
            }
            if let Some(adapter) = adapter {
                central.adapter_name = Some(adapter);
            }
            commands::run_central(central, message, Duration::from_secs(timeout)).await
        }
        Commands::Peripheral { name, adapter } => {
            let mut peripheral = config.peripheral;
            if let Some(name) = name {
                peripheral.local_name = name;
            }
            if let Some(adapter) = adapter {
                peripheral.adapter_name = Some(adapter);
            }
            commands::run_peripheral(peripheral).await
        }
    }
}

/// Setup logging based on verbosity level
fn setup_logging(verbose: bool) {
    let log_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();
}

/// Load configuration from file or use defaults
fn load_configuration(cli: &Cli) -> Result<AppConfig> {
    if let Some(config_path) = &cli.config {
        info!("loading configuration from {}", config_path);
        AppConfig::load_from_file(config_path)
    } else {
        Ok(AppConfig::default())
    }
}
