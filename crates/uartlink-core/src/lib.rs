//! Core protocol logic for the uartlink UART-over-BLE bridge
//!
//! This crate holds everything about the bridge that does not touch a
//! Bluetooth stack:
//!
//! - [`queue`] - per-channel inbound queue bridging notification callbacks
//!   to timeout-bounded receive calls
//! - [`channel`] - the channel model binding a GATT characteristic pair to
//!   an inbound queue
//! - [`fragmentation`] - MTU-bounded chunking of outbound payloads and the
//!   writer loop that drives them through a notification sink
//! - [`link`] - the connect/disconnect lifecycle state machine
//! - [`errors`] - typed bridge errors
//!
//! The BLE bindings (btleplug central, bluer peripheral) live in
//! `uartlink-ble` and drive these pieces.

pub mod channel;
pub mod errors;
pub mod fragmentation;
pub mod link;
pub mod queue;

// Public API exports
pub use channel::{Channel, ChannelConfig};
pub use errors::{BridgeError, Result};
pub use fragmentation::{
    effective_fragment_size, fragment_count, FragmentStream, FragmentWriter, NotifySink,
    DEFAULT_FRAGMENT_SIZE, NOTIFY_OVERHEAD,
};
pub use link::{LinkState, LinkStateMachine};
pub use queue::InboundQueue;
