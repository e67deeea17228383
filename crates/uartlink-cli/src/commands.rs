//! Command implementations for the demo drivers

use std::time::Duration;

use tracing::info;

use uartlink_ble::{control_channel, phone_channel, CentralConfig, UartCentral};

use crate::error::{CliError, Result};

// ----------------------------------------------------------------------------
// Central Demo
// ----------------------------------------------------------------------------

/// Scripted central exchange: connect, probe the phone channel, drain the
/// response burst until the first no-data timeout, then tear down.
pub async fn run_central(
    config: CentralConfig,
    message: String,
    drain_timeout: Duration,
) -> Result<()> {
    if config.device_address.is_empty() {
        return Err(CliError::Config {
            reason: "no device address; pass --address or set central.device_address".into(),
        });
    }

    let central = UartCentral::new(config, vec![control_channel(), phone_channel()])?;
    let phone = phone_channel().service_uuid;

    central.run().await?;
    central.connect().await?;

    // Give the remote a moment to settle before the first request.
    tokio::time::sleep(Duration::from_secs(1)).await;

    info!("sending probe: {:?}", message);
    central.send(phone, message.as_bytes()).await?;

    while let Some(response) = central.recv(phone, drain_timeout).await? {
        match String::from_utf8(response) {
            Ok(text) => println!("{}", text.trim_end()),
            Err(e) => println!("<{} binary bytes: {}>", e.as_bytes().len(), hex::encode(e.as_bytes())),
        }
    }
    info!("no more data; shutting down");

    central.disconnect().await?;
    central.quit();
    Ok(())
}

// ----------------------------------------------------------------------------
// Peripheral Demo
// ----------------------------------------------------------------------------

#[cfg(target_os = "linux")]
pub use linux_peripheral::run_peripheral;

#[cfg(target_os = "linux")]
mod linux_peripheral {
    use std::sync::Arc;

    use async_trait::async_trait;
    use tracing::info;

    use uartlink_ble::{phone_channel, InboundHandler, PeripheralConfig, PeripheralEvent, UartPeripheral};

    use crate::error::Result;

    /// Demo handler: echo every inbound write back to the subscriber
    struct EchoHandler;

    #[async_trait]
    impl InboundHandler for EchoHandler {
        async fn handle_write(&self, data: Vec<u8>) -> Option<Vec<u8>> {
            info!("inbound write: {:?}", String::from_utf8_lossy(&data));
            Some(data)
        }
    }

    /// Sensor-style reading pushed while a subscriber is notifying:
    /// a temperature in centi-degrees as a 2-byte little-endian int.
    fn temperature_reading(tick: u64) -> Vec<u8> {
        let centi_degrees = 3200 + ((tick * 10) % 2110) as i16;
        centi_degrees.to_le_bytes().to_vec()
    }

    /// Serve the phone UART GATT service until Ctrl-C
    pub async fn run_peripheral(config: PeripheralConfig) -> Result<()> {
        let (mut peripheral, mut events) =
            UartPeripheral::new(config, phone_channel(), Arc::new(EchoHandler));
        peripheral.start().await?;
        info!("peripheral serving; press Ctrl-C to stop");

        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(1));
        let mut tick = 0u64;

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                event = events.recv() => match event {
                    Some(PeripheralEvent::SubscriptionStarted) => info!("client subscribed"),
                    Some(PeripheralEvent::SubscriptionStopped) => info!("client unsubscribed"),
                    None => break,
                },
                _ = ticker.tick() => {
                    // Dropped silently when nobody is notifying.
                    peripheral.notify(temperature_reading(tick)).await?;
                    tick += 1;
                }
            }
        }

        peripheral.stop();
        Ok(())
    }
}

#[cfg(not(target_os = "linux"))]
pub async fn run_peripheral(_config: uartlink_ble::PeripheralConfig) -> Result<()> {
    Err(uartlink_core::BridgeError::NotSupported {
        feature: "peripheral role (requires BlueZ)".into(),
    }
    .into())
}
