//! BLE bindings for the uartlink bridge
//!
//! Two independent roles over the same UART-over-BLE framing:
//!
//! - [`central`] - connects outward to a remote peripheral via btleplug and
//!   exposes queue-backed send/receive per UART channel
//! - [`peripheral`] - hosts a BlueZ GATT server (Linux only) with chunked
//!   notification transfer toward subscribed clients
//! - [`protocol`] - the UART service and characteristic UUIDs
//! - [`config`] - role configuration
//!
//! The protocol logic itself (queues, fragmentation, lifecycle) lives in
//! `uartlink-core`; this crate binds it to actual Bluetooth stacks.

pub mod central;
pub mod config;
#[cfg(target_os = "linux")]
pub mod peripheral;
pub mod protocol;

// Public API exports
pub use central::UartCentral;
pub use config::{CentralConfig, PeripheralConfig};
#[cfg(target_os = "linux")]
pub use peripheral::{InboundHandler, PeripheralEvent, UartPeripheral};
pub use protocol::{
    control_channel, phone_channel, CTRL_RX_CHARACTERISTIC_UUID, CTRL_TX_CHARACTERISTIC_UUID,
    CTRL_UART_SERVICE_UUID, PHONE_RX_CHARACTERISTIC_UUID, PHONE_TX_CHARACTERISTIC_UUID,
    PHONE_UART_SERVICE_UUID,
};

// Re-export the core types callers handle directly
pub use uartlink_core::{BridgeError, ChannelConfig, LinkState, Result};
