//! UART service and characteristic UUIDs
//!
//! Two UART-style services make up the bridge: the control-box service with
//! its vendor UUIDs, and the phone service using the Nordic UART layout.
//! Each pairs a write characteristic (outbound from the central) with a
//! notify characteristic (inbound to the central).

use uartlink_core::ChannelConfig;
use uuid::Uuid;

// ----------------------------------------------------------------------------
// Control-Box UART Service
// ----------------------------------------------------------------------------

/// Control-box UART service UUID
pub const CTRL_UART_SERVICE_UUID: Uuid = Uuid::from_u128(0xB3E668C0_CF93_11EC_9D64_0242AC120002);

/// Control-box characteristic accepting writes
pub const CTRL_TX_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0xB3E668C1_CF93_11EC_9D64_0242AC120002);

/// Control-box characteristic emitting notifications
pub const CTRL_RX_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0xB3E668C2_CF93_11EC_9D64_0242AC120002);

// ----------------------------------------------------------------------------
// Phone UART Service (Nordic UART layout)
// ----------------------------------------------------------------------------

/// Phone UART service UUID
pub const PHONE_UART_SERVICE_UUID: Uuid = Uuid::from_u128(0x6E400001_B5A3_F393_E0A9_E50E24DCCA9E);

/// Phone characteristic accepting writes
pub const PHONE_TX_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x6E400002_B5A3_F393_E0A9_E50E24DCCA9E);

/// Phone characteristic emitting notifications
pub const PHONE_RX_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x6E400003_B5A3_F393_E0A9_E50E24DCCA9E);

// ----------------------------------------------------------------------------
// Channel Constructors
// ----------------------------------------------------------------------------

/// Channel bound to the control-box UART service
pub fn control_channel() -> ChannelConfig {
    ChannelConfig::new(
        CTRL_UART_SERVICE_UUID,
        CTRL_TX_CHARACTERISTIC_UUID,
        CTRL_RX_CHARACTERISTIC_UUID,
    )
}

/// Channel bound to the phone UART service
pub fn phone_channel() -> ChannelConfig {
    ChannelConfig::new(
        PHONE_UART_SERVICE_UUID,
        PHONE_TX_CHARACTERISTIC_UUID,
        PHONE_RX_CHARACTERISTIC_UUID,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_constructors_use_distinct_characteristics() {
        for channel in [control_channel(), phone_channel()] {
            assert_ne!(channel.tx_uuid, channel.rx_uuid);
            assert_ne!(channel.service_uuid, channel.tx_uuid);
            assert_ne!(channel.service_uuid, channel.rx_uuid);
        }
        assert_ne!(
            control_channel().service_uuid,
            phone_channel().service_uuid
        );
    }

    #[test]
    fn test_phone_service_is_nordic_uart() {
        assert_eq!(
            PHONE_UART_SERVICE_UUID.to_string(),
            "6e400001-b5a3-f393-e0a9-e50e24dcca9e"
        );
    }
}
