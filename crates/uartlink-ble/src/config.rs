//! Configuration for the central and peripheral roles

use std::time::Duration;

// ----------------------------------------------------------------------------
// Central Configuration
// ----------------------------------------------------------------------------

/// Configuration for the central role
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CentralConfig {
    /// Bluetooth address of the remote peripheral ("AA:BB:CC:DD:EE:FF")
    pub device_address: String,
    /// Local adapter to use; `None` picks the first available
    pub adapter_name: Option<String>,
    /// Maximum time to scan for the remote device
    pub scan_timeout: Duration,
    /// Maximum time to wait for the link to come up
    pub connection_timeout: Duration,
    /// Receive timeout applied when the caller does not pass one
    pub receive_timeout: Duration,
}

impl Default for CentralConfig {
    fn default() -> Self {
        Self {
            device_address: String::new(),
            adapter_name: None,
            scan_timeout: Duration::from_secs(10),
            connection_timeout: Duration::from_secs(5),
            receive_timeout: Duration::from_secs(5),
        }
    }
}

impl CentralConfig {
    /// Configuration targeting `device_address` with default timeouts
    pub fn new(device_address: impl Into<String>) -> Self {
        Self {
            device_address: device_address.into(),
            ..Self::default()
        }
    }

    /// Set the local adapter name
    pub fn with_adapter_name(mut self, name: impl Into<String>) -> Self {
        self.adapter_name = Some(name.into());
        self
    }

    /// Set the scan timeout
    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    /// Set the connection timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set the default receive timeout
    pub fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = timeout;
        self
    }
}

// ----------------------------------------------------------------------------
// Peripheral Configuration
// ----------------------------------------------------------------------------

/// Configuration for the peripheral role
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PeripheralConfig {
    /// Name advertised to scanning centrals
    pub local_name: String,
    /// Local adapter to use; `None` picks the default adapter
    pub adapter_name: Option<String>,
}

impl Default for PeripheralConfig {
    fn default() -> Self {
        Self {
            local_name: "uartlink".to_string(),
            adapter_name: None,
        }
    }
}

impl PeripheralConfig {
    /// Configuration advertising as `local_name`
    pub fn new(local_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            ..Self::default()
        }
    }

    /// Set the local adapter name
    pub fn with_adapter_name(mut self, name: impl Into<String>) -> Self {
        self.adapter_name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_central_config_builder() {
        let config = CentralConfig::new("88:88:88:88:88:88")
            .with_adapter_name("hci1")
            .with_receive_timeout(Duration::from_secs(2));

        assert_eq!(config.device_address, "88:88:88:88:88:88");
        assert_eq!(config.adapter_name.as_deref(), Some("hci1"));
        assert_eq!(config.receive_timeout, Duration::from_secs(2));
        // Untouched fields keep their defaults.
        assert_eq!(config.connection_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_peripheral_config_defaults() {
        let config = PeripheralConfig::default();
        assert_eq!(config.local_name, "uartlink");
        assert!(config.adapter_name.is_none());
    }
}
