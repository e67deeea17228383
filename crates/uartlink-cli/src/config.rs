//! CLI configuration loading
//!
//! A single optional TOML file (`uartlink.toml`) with one table per role;
//! command-line flags override whatever the file provides. Every field has
//! a default, so a missing or partial file is fine.

use std::fs;

use serde::{Deserialize, Serialize};

use uartlink_ble::{CentralConfig, PeripheralConfig};

use crate::error::Result;

// ----------------------------------------------------------------------------
// Application Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for the CLI: one table per role
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Central role configuration
    pub central: CentralConfig,

    /// Peripheral role configuration
    pub peripheral: PeripheralConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }
}
