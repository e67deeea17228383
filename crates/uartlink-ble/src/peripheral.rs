//! BLE peripheral role: GATT server with chunked notification transfer
//!
//! One UART service is exposed: a write (+ write-without-response)
//! characteristic carrying inbound traffic, and a read + notify
//! characteristic carrying outbound traffic. Inbound writes are single-shot
//! messages (no reassembly); outbound payloads are fragmented at the
//! negotiated MTU and driven out as sequential notifications, each update
//! also refreshing the characteristic's stored value for readers.
//!
//! Linux only: BlueZ is the only stack the bridge serves a GATT
//! application on, matching the deployment target.

use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use bluer::adv::{Advertisement, AdvertisementHandle};
use bluer::gatt::local::{
    Application, ApplicationHandle, Characteristic, CharacteristicNotifier, CharacteristicNotify,
    CharacteristicNotifyMethod, CharacteristicRead, CharacteristicWrite, CharacteristicWriteMethod,
    Service,
};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use uartlink_core::{BridgeError, ChannelConfig, FragmentWriter, NotifySink, Result};

use crate::config::PeripheralConfig;

// ----------------------------------------------------------------------------
// Application Seam
// ----------------------------------------------------------------------------

/// Application logic behind the GATT server
///
/// One inbound write is one complete message. Returning `Some(payload)`
/// triggers the chunked outbound response cycle toward the subscriber.
#[async_trait]
pub trait InboundHandler: Send + Sync + 'static {
    async fn handle_write(&self, data: Vec<u8>) -> Option<Vec<u8>>;
}

/// Connection-level events surfaced to the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeripheralEvent {
    /// A client enabled notifications on the outbound characteristic
    SubscriptionStarted,
    /// The client unsubscribed or the notification session broke down
    SubscriptionStopped,
}

// ----------------------------------------------------------------------------
// Outbound Plumbing
// ----------------------------------------------------------------------------

/// One queued outbound payload plus the MTU hint current when it was queued
struct OutboundFrame {
    payload: Vec<u8>,
    mtu: Option<usize>,
}

type OutboundSlot = Arc<Mutex<Option<mpsc::Sender<OutboundFrame>>>>;

/// Fragment sink backed by a live bluer notifier
///
/// Every fragment refreshes the stored characteristic value before the
/// notification goes out, so a read observes the latest update.
struct NotifierSink<'a> {
    notifier: &'a mut CharacteristicNotifier,
    last_value: Arc<StdMutex<Vec<u8>>>,
    failed: bool,
}

#[async_trait]
impl NotifySink for NotifierSink<'_> {
    async fn send_fragment(&mut self, fragment: &[u8]) -> Result<bool> {
        if self.notifier.is_stopped() {
            return Ok(false);
        }
        *self.last_value.lock().expect("value lock poisoned") = fragment.to_vec();
        match self.notifier.notify(fragment.to_vec()).await {
            Ok(()) => Ok(true),
            Err(e) => {
                debug!("notify failed, subscriber presumed gone: {}", e);
                self.failed = true;
                Ok(false)
            }
        }
    }
}

/// Fold a write request's MTU hint into the tracked negotiated MTU
fn merge_mtu_hint(current: Option<usize>, hint: u16) -> Option<usize> {
    let hint = hint as usize;
    if hint == 0 {
        return current;
    }
    match current {
        Some(existing) if existing >= hint => current,
        _ => Some(hint),
    }
}

// ----------------------------------------------------------------------------
// Peripheral Server
// ----------------------------------------------------------------------------

/// Peripheral-role bridge endpoint
pub struct UartPeripheral {
    config: PeripheralConfig,
    channel: ChannelConfig,
    handler: Arc<dyn InboundHandler>,
    event_tx: mpsc::Sender<PeripheralEvent>,
    negotiated_mtu: Arc<StdMutex<Option<usize>>>,
    last_value: Arc<StdMutex<Vec<u8>>>,
    outbound: OutboundSlot,
    adv_handle: Option<AdvertisementHandle>,
    app_handle: Option<ApplicationHandle>,
}

impl UartPeripheral {
    /// Create a peripheral serving `channel` with the given handler
    ///
    /// The channel is interpreted from the remote central's perspective:
    /// inbound writes arrive on `tx_uuid`, notifications leave on `rx_uuid`.
    /// Returns the server plus the event stream for subscription changes.
    pub fn new(
        config: PeripheralConfig,
        channel: ChannelConfig,
        handler: Arc<dyn InboundHandler>,
    ) -> (Self, mpsc::Receiver<PeripheralEvent>) {
        let (event_tx, event_rx) = mpsc::channel(16);
        let peripheral = Self {
            config,
            channel,
            handler,
            event_tx,
            negotiated_mtu: Arc::new(StdMutex::new(None)),
            last_value: Arc::new(StdMutex::new(Vec::new())),
            outbound: Arc::new(Mutex::new(None)),
            adv_handle: None,
            app_handle: None,
        };
        (peripheral, event_rx)
    }

    /// Register the GATT application and start advertising
    pub async fn start(&mut self) -> Result<()> {
        let session = bluer::Session::new()
            .await
            .map_err(|e| BridgeError::link(format!("failed to open BlueZ session: {e}")))?;

        let adapter = match &self.config.adapter_name {
            Some(name) => session
                .adapter(name)
                .map_err(|e| BridgeError::InvalidConfiguration {
                    reason: format!("adapter {name} not found: {e}"),
                })?,
            None => session
                .default_adapter()
                .await
                .map_err(|_| BridgeError::AdapterNotAvailable)?,
        };

        if !adapter
            .is_powered()
            .await
            .map_err(|e| BridgeError::link(format!("adapter query failed: {e}")))?
        {
            info!("powering on adapter {}", adapter.name());
            adapter
                .set_powered(true)
                .await
                .map_err(|e| BridgeError::link(format!("failed to power adapter: {e}")))?;
        }
        adapter
            .set_alias(self.config.local_name.clone())
            .await
            .map_err(|e| BridgeError::link(format!("failed to set alias: {e}")))?;

        let app = self.build_application();
        self.app_handle = Some(
            adapter
                .serve_gatt_application(app)
                .await
                .map_err(|e| BridgeError::link(format!("failed to register GATT service: {e}")))?,
        );

        let advertisement = Advertisement {
            service_uuids: std::iter::once(self.channel.service_uuid).collect(),
            discoverable: Some(true),
            local_name: Some(self.config.local_name.clone()),
            ..Default::default()
        };
        self.adv_handle = Some(
            adapter
                .advertise(advertisement)
                .await
                .map_err(|e| BridgeError::link(format!("failed to start advertising: {e}")))?,
        );

        info!(
            "peripheral {} serving service {} on {}",
            self.config.local_name,
            self.channel.service_uuid,
            adapter.name()
        );
        Ok(())
    }

    /// Stop advertising and withdraw the GATT application
    pub fn stop(&mut self) {
        self.adv_handle.take();
        self.app_handle.take();
        info!("peripheral {} stopped", self.config.local_name);
    }

    /// Queue an unsolicited outbound payload (chunked like responses)
    ///
    /// Returns `false` when no subscriber is notifying; the payload is
    /// dropped, per the do-notify-while-subscribed contract.
    pub async fn notify(&self, payload: Vec<u8>) -> Result<bool> {
        let mtu = *self.negotiated_mtu.lock().expect("mtu lock poisoned");
        let slot = self.outbound.lock().await;
        match slot.as_ref() {
            Some(tx) => Ok(tx.send(OutboundFrame { payload, mtu }).await.is_ok()),
            None => Ok(false),
        }
    }

    /// MTU most recently hinted by a write request, if any
    pub fn negotiated_mtu(&self) -> Option<usize> {
        *self.negotiated_mtu.lock().expect("mtu lock poisoned")
    }

    fn build_application(&self) -> Application {
        Application {
            services: vec![Service {
                uuid: self.channel.service_uuid,
                primary: true,
                characteristics: vec![self.build_write_characteristic(), self.build_notify_characteristic()],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    /// Inbound characteristic: write + write-without-response
    fn build_write_characteristic(&self) -> Characteristic {
        let handler = Arc::clone(&self.handler);
        let negotiated_mtu = Arc::clone(&self.negotiated_mtu);
        let outbound = Arc::clone(&self.outbound);

        Characteristic {
            uuid: self.channel.tx_uuid,
            write: Some(CharacteristicWrite {
                write: true,
                write_without_response: true,
                method: CharacteristicWriteMethod::Fun(Box::new(move |data, req| {
                    let handler = Arc::clone(&handler);
                    let negotiated_mtu = Arc::clone(&negotiated_mtu);
                    let outbound = Arc::clone(&outbound);

                    Box::pin(async move {
                        debug!("inbound write: {} bytes, mtu hint {}", data.len(), req.mtu);

                        let mtu = {
                            let mut negotiated =
                                negotiated_mtu.lock().expect("mtu lock poisoned");
                            *negotiated = merge_mtu_hint(*negotiated, req.mtu);
                            *negotiated
                        };

                        if let Some(response) = handler.handle_write(data).await {
                            let slot = outbound.lock().await;
                            match slot.as_ref() {
                                Some(tx) => {
                                    if tx
                                        .send(OutboundFrame {
                                            payload: response,
                                            mtu,
                                        })
                                        .await
                                        .is_err()
                                    {
                                        debug!("subscriber gone; response dropped");
                                    }
                                }
                                None => debug!("no active subscription; response dropped"),
                            }
                        }
                        Ok(())
                    })
                })),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Outbound characteristic: read + notify
    fn build_notify_characteristic(&self) -> Characteristic {
        let last_value = Arc::clone(&self.last_value);
        let read_value = Arc::clone(&self.last_value);
        let outbound = Arc::clone(&self.outbound);
        let event_tx = self.event_tx.clone();

        Characteristic {
            uuid: self.channel.rx_uuid,
            read: Some(CharacteristicRead {
                read: true,
                fun: Box::new(move |_req| {
                    let read_value = Arc::clone(&read_value);
                    Box::pin(async move {
                        Ok(read_value.lock().expect("value lock poisoned").clone())
                    })
                }),
                ..Default::default()
            }),
            notify: Some(CharacteristicNotify {
                notify: true,
                method: CharacteristicNotifyMethod::Fun(Box::new(move |mut notifier| {
                    let last_value = Arc::clone(&last_value);
                    let outbound = Arc::clone(&outbound);
                    let event_tx = event_tx.clone();

                    Box::pin(async move {
                        info!("subscriber enabled notifications");
                        let (tx, mut rx) = mpsc::channel::<OutboundFrame>(32);
                        *outbound.lock().await = Some(tx);
                        let _ = event_tx.send(PeripheralEvent::SubscriptionStarted).await;

                        while let Some(frame) = rx.recv().await {
                            let writer = FragmentWriter::for_link_mtu(frame.mtu);
                            let aborted = {
                                let mut sink = NotifierSink {
                                    notifier: &mut notifier,
                                    last_value: Arc::clone(&last_value),
                                    failed: false,
                                };
                                match writer.write_all(&frame.payload, &mut sink).await {
                                    Ok(sent) => debug!(
                                        "notified {} fragment(s) of {} bytes",
                                        sent,
                                        frame.payload.len()
                                    ),
                                    Err(e) => warn!("outbound transfer failed: {}", e),
                                }
                                sink.failed
                            };
                            if aborted || notifier.is_stopped() {
                                break;
                            }
                        }

                        *outbound.lock().await = None;
                        let _ = event_tx.send(PeripheralEvent::SubscriptionStopped).await;
                        debug!("notification session ended");
                    })
                })),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
