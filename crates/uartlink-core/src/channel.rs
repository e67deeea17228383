//! UART channel model
//!
//! A channel is one logical bidirectional byte stream bound to a pair of
//! GATT characteristics inside a service: a TX characteristic the local side
//! writes, and an RX characteristic whose notifications feed the channel's
//! inbound queue. A connection owns its channels exclusively; each channel
//! has exactly one inbound queue and one outbound write path.

use std::time::Duration;

use uuid::Uuid;

use crate::queue::InboundQueue;

// ----------------------------------------------------------------------------
// Channel Configuration
// ----------------------------------------------------------------------------

/// Identifiers binding a channel to its GATT service and characteristic pair
///
/// UUIDs are injected at construction; there are no process-wide UUID
/// globals. Ready-made UART channel sets live with the BLE bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Service the characteristic pair lives in
    pub service_uuid: Uuid,
    /// Characteristic accepting outbound writes
    pub tx_uuid: Uuid,
    /// Characteristic emitting inbound notifications
    pub rx_uuid: Uuid,
}

impl ChannelConfig {
    /// Create a channel configuration
    pub fn new(service_uuid: Uuid, tx_uuid: Uuid, rx_uuid: Uuid) -> Self {
        Self {
            service_uuid,
            tx_uuid,
            rx_uuid,
        }
    }
}

// ----------------------------------------------------------------------------
// Channel
// ----------------------------------------------------------------------------

/// One UART channel: characteristic bindings plus the inbound queue
#[derive(Debug)]
pub struct Channel {
    config: ChannelConfig,
    inbound: InboundQueue,
}

impl Channel {
    /// Create a channel with an empty inbound queue
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            inbound: InboundQueue::new(),
        }
    }

    /// Channel configuration
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Service UUID this channel is bound to
    pub fn service_uuid(&self) -> Uuid {
        self.config.service_uuid
    }

    /// Deliver one inbound notification value; event-pump context only
    pub fn push_inbound(&self, value: Vec<u8>) {
        self.inbound.push(value);
    }

    /// Wait up to `timeout` for the next inbound message
    pub async fn recv(&self, timeout: Duration) -> Option<Vec<u8>> {
        self.inbound.recv(timeout).await
    }

    /// Discard all queued inbound messages
    pub fn clear_inbound(&self) {
        self.inbound.clear();
    }

    /// Number of queued inbound messages
    pub fn pending(&self) -> usize {
        self.inbound.len()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ChannelConfig {
        ChannelConfig::new(
            Uuid::from_u128(0x6E400001_B5A3_F393_E0A9_E50E24DCCA9E),
            Uuid::from_u128(0x6E400002_B5A3_F393_E0A9_E50E24DCCA9E),
            Uuid::from_u128(0x6E400003_B5A3_F393_E0A9_E50E24DCCA9E),
        )
    }

    #[tokio::test]
    async fn test_channel_delivers_inbound_in_order() {
        let channel = Channel::new(test_config());
        channel.push_inbound(b"a".to_vec());
        channel.push_inbound(b"b".to_vec());

        assert_eq!(channel.recv(Duration::from_secs(1)).await.unwrap(), b"a");
        assert_eq!(channel.recv(Duration::from_secs(1)).await.unwrap(), b"b");
    }

    #[tokio::test]
    async fn test_clear_inbound() {
        let channel = Channel::new(test_config());
        channel.push_inbound(b"stale".to_vec());
        channel.clear_inbound();
        assert_eq!(channel.pending(), 0);
        assert!(channel.recv(Duration::ZERO).await.is_none());
    }
}
