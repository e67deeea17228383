//! Error types for the uartlink bridge
//!
//! Link and write failures are surfaced as typed errors at the transport
//! boundary. A `recv` that sees no data is NOT an error; it returns `None`
//! from the queue bridge, because the remote may simply be slow or may never
//! respond at all.

use uuid::Uuid;

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Errors produced by the bridge core and its BLE bindings
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Link error: {reason}")]
    Link { reason: String },

    #[error("Connection attempt timed out after {duration_ms}ms")]
    ConnectionTimeout { duration_ms: u64 },

    #[error("Remote device not found: {address}")]
    DeviceNotFound { address: String },

    #[error("No Bluetooth adapter available")]
    AdapterNotAvailable,

    #[error("Service not resolved on remote device: {uuid}")]
    ServiceNotFound { uuid: Uuid },

    #[error("Characteristic not found: {uuid}")]
    CharacteristicNotFound { uuid: Uuid },

    #[error("Characteristic write failed: {reason}")]
    WriteFailure { reason: String },

    #[error("Notification subscription failed: {reason}")]
    SubscriptionFailed { reason: String },

    #[error("No channel registered for service {uuid}")]
    ChannelNotFound { uuid: Uuid },

    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("Not supported on this platform: {feature}")]
    NotSupported { feature: String },
}

impl BridgeError {
    /// Wrap a transport-level connect/link failure
    pub fn link(reason: impl Into<String>) -> Self {
        Self::Link {
            reason: reason.into(),
        }
    }

    /// Wrap a transport-level write rejection
    pub fn write_failure(reason: impl Into<String>) -> Self {
        Self::WriteFailure {
            reason: reason.into(),
        }
    }
}

/// Result type for bridge operations
pub type Result<T> = core::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BridgeError::write_failure("link busy");
        assert_eq!(err.to_string(), "Characteristic write failed: link busy");

        let err = BridgeError::ConnectionTimeout { duration_ms: 5000 };
        assert!(err.to_string().contains("5000ms"));
    }
}
