//! BLE central role: one remote peripheral, one or more UART channels
//!
//! `UartCentral` owns the connection to a single remote device and the
//! channels riding on it. Inbound traffic flows notification stream ->
//! pump task -> channel queue; the application drains the queue with
//! [`UartCentral::recv`]. Outbound traffic is a characteristic write
//! preceded by a queue clear, so a stale notification from a previous
//! exchange can never satisfy the response that follows.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::stream::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use uartlink_core::{BridgeError, Channel, ChannelConfig, LinkState, LinkStateMachine, Result};

use crate::config::CentralConfig;

// ----------------------------------------------------------------------------
// Central Adapter
// ----------------------------------------------------------------------------

/// Central-role bridge endpoint
pub struct UartCentral {
    config: CentralConfig,
    channels: Arc<Vec<Channel>>,
    link: Mutex<LinkStateMachine>,
    peripheral: tokio::sync::RwLock<Option<Peripheral>>,
    running: AtomicBool,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl UartCentral {
    /// Create a central for the given channels
    ///
    /// Channels must target distinct services; the service UUID is the
    /// handle the application uses to address a channel.
    pub fn new(config: CentralConfig, channel_configs: Vec<ChannelConfig>) -> Result<Self> {
        if channel_configs.is_empty() {
            return Err(BridgeError::InvalidConfiguration {
                reason: "at least one channel is required".into(),
            });
        }
        for (i, a) in channel_configs.iter().enumerate() {
            if channel_configs[i + 1..]
                .iter()
                .any(|b| b.service_uuid == a.service_uuid)
            {
                return Err(BridgeError::InvalidConfiguration {
                    reason: format!("duplicate channel for service {}", a.service_uuid),
                });
            }
        }

        let channels = channel_configs.into_iter().map(Channel::new).collect();

        Ok(Self {
            config,
            channels: Arc::new(channels),
            link: Mutex::new(LinkStateMachine::new()),
            peripheral: tokio::sync::RwLock::new(None),
            running: AtomicBool::new(false),
            pump: Mutex::new(None),
        })
    }

    /// Connect to the configured remote device and bind every channel
    ///
    /// Scans for the device address, establishes the link, discovers
    /// services, subscribes each channel's RX characteristic, and clears
    /// every inbound queue so a reconnect starts from a clean slate.
    pub async fn connect(&self) -> Result<()> {
        self.link.lock().expect("link lock poisoned").begin_connect()?;

        match self.establish_link().await {
            Ok(peripheral) => {
                *self.peripheral.write().await = Some(peripheral);
                for channel in self.channels.iter() {
                    channel.clear_inbound();
                }
                self.link
                    .lock()
                    .expect("link lock poisoned")
                    .mark_connected();
                info!("connected to {}", self.config.device_address);

                if self.running.load(Ordering::SeqCst) {
                    self.spawn_pump().await?;
                }
                Ok(())
            }
            Err(e) => {
                self.link.lock().expect("link lock poisoned").mark_failed();
                Err(e)
            }
        }
    }

    /// Tear down the link; a no-op when already disconnected
    pub async fn disconnect(&self) -> Result<()> {
        if !self
            .link
            .lock()
            .expect("link lock poisoned")
            .begin_disconnect()
        {
            debug!("disconnect on already-disconnected link ignored");
            return Ok(());
        }

        // The pump's notification stream dies with the link; reap the task
        // so a later reconnect can spawn a fresh one.
        self.abort_pump();

        if let Some(peripheral) = self.peripheral.write().await.take() {
            if let Err(e) = peripheral.disconnect().await {
                warn!("disconnect from {} failed: {}", self.config.device_address, e);
            }
        }

        self.link
            .lock()
            .expect("link lock poisoned")
            .mark_disconnected();
        info!("disconnected from {}", self.config.device_address);
        Ok(())
    }

    /// Lifecycle state as tracked by the controller
    pub fn link_state(&self) -> LinkState {
        self.link.lock().expect("link lock poisoned").state()
    }

    /// True link state as reported by the BLE stack
    pub async fn is_connected(&self) -> bool {
        let guard = self.peripheral.read().await;
        match guard.as_ref() {
            Some(peripheral) => peripheral.is_connected().await.unwrap_or(false),
            None => false,
        }
    }

    /// Start the notification event pump
    ///
    /// May be called before `connect()`; the pump activates once a
    /// connection exists. Without a running pump no inbound messages are
    /// produced at all.
    pub async fn run(&self) -> Result<()> {
        self.running.store(true, Ordering::SeqCst);
        if self.is_connected().await {
            self.spawn_pump().await?;
        }
        Ok(())
    }

    /// Stop the notification event pump
    ///
    /// Receives blocked at the time of the call still honor their own
    /// timeout and return the no-data outcome.
    pub fn quit(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.abort_pump();
        debug!("event pump stopped");
    }

    /// Send one message on the channel bound to `service`
    ///
    /// The channel's inbound queue is cleared first: exchanges are
    /// request/response, and anything queued before the write is presumed
    /// stale. A transport-rejected write surfaces as
    /// [`BridgeError::WriteFailure`] so the caller can decide to retry.
    pub async fn send(&self, service: Uuid, data: &[u8]) -> Result<()> {
        let channel = self.channel(service)?;
        channel.clear_inbound();

        let guard = self.peripheral.read().await;
        let peripheral = guard
            .as_ref()
            .ok_or_else(|| BridgeError::link("send on disconnected link"))?;

        let tx_uuid = channel.config().tx_uuid;
        let characteristic = peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == tx_uuid)
            .ok_or(BridgeError::CharacteristicNotFound { uuid: tx_uuid })?;

        peripheral
            .write(&characteristic, data, WriteType::WithoutResponse)
            .await
            .map_err(|e| BridgeError::write_failure(e.to_string()))?;

        debug!("sent {} bytes on service {}", data.len(), service);
        Ok(())
    }

    /// Wait up to `timeout` for the next message on `service`
    ///
    /// `None` is the no-data outcome: the remote was slow, never answered,
    /// or the event pump is not running.
    pub async fn recv(&self, service: Uuid, timeout: Duration) -> Result<Option<Vec<u8>>> {
        let channel = self.channel(service)?;
        Ok(channel.recv(timeout).await)
    }

    /// [`recv`](Self::recv) with the configured default receive timeout
    pub async fn recv_default(&self, service: Uuid) -> Result<Option<Vec<u8>>> {
        self.recv(service, self.config.receive_timeout).await
    }

    fn channel(&self, service: Uuid) -> Result<&Channel> {
        self.channels
            .iter()
            .find(|c| c.service_uuid() == service)
            .ok_or(BridgeError::ChannelNotFound { uuid: service })
    }

    // ------------------------------------------------------------------
    // Link establishment
    // ------------------------------------------------------------------

    async fn adapter(&self) -> Result<Adapter> {
        let manager = Manager::new()
            .await
            .map_err(|e| BridgeError::link(format!("failed to create BLE manager: {e}")))?;
        let adapters = manager
            .adapters()
            .await
            .map_err(|e| BridgeError::link(format!("failed to enumerate adapters: {e}")))?;

        if adapters.is_empty() {
            return Err(BridgeError::AdapterNotAvailable);
        }

        match &self.config.adapter_name {
            None => Ok(adapters.into_iter().next().expect("checked non-empty")),
            Some(wanted) => {
                for adapter in adapters {
                    let info = adapter
                        .adapter_info()
                        .await
                        .unwrap_or_else(|_| String::new());
                    if info.contains(wanted.as_str()) {
                        return Ok(adapter);
                    }
                }
                Err(BridgeError::InvalidConfiguration {
                    reason: format!("adapter {wanted} not found"),
                })
            }
        }
    }

    /// Scan until the configured device address shows up
    async fn discover_device(&self, adapter: &Adapter) -> Result<Peripheral> {
        let services = self
            .channels
            .iter()
            .map(|c| c.service_uuid())
            .collect::<Vec<_>>();
        adapter
            .start_scan(ScanFilter { services })
            .await
            .map_err(|e| BridgeError::link(format!("failed to start scan: {e}")))?;

        let deadline = tokio::time::Instant::now() + self.config.scan_timeout;
        let found = loop {
            if let Some(peripheral) = self.find_by_address(adapter).await? {
                break Some(peripheral);
            }
            if tokio::time::Instant::now() >= deadline {
                break None;
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        };

        if let Err(e) = adapter.stop_scan().await {
            warn!("failed to stop scan: {}", e);
        }

        found.ok_or_else(|| BridgeError::DeviceNotFound {
            address: self.config.device_address.clone(),
        })
    }

    async fn find_by_address(&self, adapter: &Adapter) -> Result<Option<Peripheral>> {
        let peripherals = adapter
            .peripherals()
            .await
            .map_err(|e| BridgeError::link(format!("failed to list peripherals: {e}")))?;

        for peripheral in peripherals {
            if let Ok(Some(properties)) = peripheral.properties().await {
                if properties
                    .address
                    .to_string()
                    .eq_ignore_ascii_case(&self.config.device_address)
                {
                    return Ok(Some(peripheral));
                }
            }
        }
        Ok(None)
    }

    async fn establish_link(&self) -> Result<Peripheral> {
        let adapter = self.adapter().await?;
        let peripheral = self.discover_device(&adapter).await?;

        timeout(self.config.connection_timeout, peripheral.connect())
            .await
            .map_err(|_| BridgeError::ConnectionTimeout {
                duration_ms: self.config.connection_timeout.as_millis() as u64,
            })?
            .map_err(|e| BridgeError::link(format!("connection failed: {e}")))?;

        peripheral
            .discover_services()
            .await
            .map_err(|e| BridgeError::link(format!("service discovery failed: {e}")))?;

        self.bind_channels(&peripheral).await?;
        Ok(peripheral)
    }

    /// Verify each channel's characteristic pair and subscribe its RX side
    async fn bind_channels(&self, peripheral: &Peripheral) -> Result<()> {
        let characteristics = peripheral.characteristics();

        for channel in self.channels.iter() {
            let config = channel.config();

            if !characteristics
                .iter()
                .any(|c| c.service_uuid == config.service_uuid)
            {
                return Err(BridgeError::ServiceNotFound {
                    uuid: config.service_uuid,
                });
            }
            if !characteristics.iter().any(|c| c.uuid == config.tx_uuid) {
                return Err(BridgeError::CharacteristicNotFound {
                    uuid: config.tx_uuid,
                });
            }
            let rx = characteristics
                .iter()
                .find(|c| c.uuid == config.rx_uuid)
                .ok_or(BridgeError::CharacteristicNotFound {
                    uuid: config.rx_uuid,
                })?;

            peripheral
                .subscribe(rx)
                .await
                .map_err(|e| BridgeError::SubscriptionFailed {
                    reason: e.to_string(),
                })?;
            debug!("subscribed to notifications on {}", config.rx_uuid);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Notification pump
    // ------------------------------------------------------------------

    async fn spawn_pump(&self) -> Result<()> {
        {
            let pump = self.pump.lock().expect("pump lock poisoned");
            if pump.as_ref().is_some_and(|h| !h.is_finished()) {
                return Ok(());
            }
        }

        let guard = self.peripheral.read().await;
        let Some(peripheral) = guard.as_ref() else {
            return Ok(());
        };

        let mut notifications =
            peripheral
                .notifications()
                .await
                .map_err(|e| BridgeError::SubscriptionFailed {
                    reason: format!("failed to open notification stream: {e}"),
                })?;

        let channels = Arc::clone(&self.channels);
        let handle = tokio::spawn(async move {
            while let Some(notification) = notifications.next().await {
                match channels
                    .iter()
                    .find(|c| c.config().rx_uuid == notification.uuid)
                {
                    Some(channel) => {
                        debug!(
                            "notification: {} bytes on {}",
                            notification.value.len(),
                            notification.uuid
                        );
                        channel.push_inbound(notification.value);
                    }
                    None => {
                        debug!("dropping notification from unknown {}", notification.uuid);
                    }
                }
            }
            debug!("notification pump ended");
        });

        *self.pump.lock().expect("pump lock poisoned") = Some(handle);
        debug!("event pump started");
        Ok(())
    }

    fn abort_pump(&self) {
        if let Some(handle) = self.pump.lock().expect("pump lock poisoned").take() {
            handle.abort();
        }
    }
}

impl Drop for UartCentral {
    fn drop(&mut self) {
        self.abort_pump();
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
