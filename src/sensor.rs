use crate::device_scanner::{first_adapter, watto_filter};
use crate::error::ConnectionError;
use crate::watto_data::{decode_samples, Channel, SERVICE_UUID};
use btleplug::api::{CentralEvent, CharPropFlags, Central, Peripheral as _};
use btleplug::platform::{Adapter, Peripheral};
use crossbeam_channel::Sender;
use futures::{Stream, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub enum SensorUpdate {
    Samples { channel: Channel, values: Vec<f32> },
    ConnectionStatus(ConnectionStatus),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
    Error(String),
}

#[derive(Clone)]
pub struct Handler {
    sender: Sender<SensorUpdate>,
}

impl Handler {
    pub fn new(sender: Sender<SensorUpdate>) -> Self {
        Self { sender }
    }

    pub fn status(&self, status: ConnectionStatus) {
        if let Err(why) = self.sender.send(SensorUpdate::ConnectionStatus(status)) {
            log::warn!("Could not send connection status: {:?}", why);
        }
    }

    /// Decode a notification and forward it to the UI thread
    pub fn notification(&self, uuid: uuid::Uuid, payload: &[u8]) {
        let Some(channel) = Channel::from_uuid(uuid) else {
            log::debug!("Ignoring notification from {}", uuid);
            return;
        };
        let values = decode_samples(payload);
        if values.is_empty() {
            return;
        }
        if let Err(why) = self.sender.send(SensorUpdate::Samples { channel, values }) {
            log::warn!("Could not send {} samples: {:?}", channel, why);
        }
    }
}

async fn wait_for_stop(should_stop: &AtomicBool) {
    while !should_stop.load(Ordering::Relaxed) {
        tokio::time::sleep(STOP_POLL_INTERVAL).await;
    }
}

async fn poll_for_peripheral(
    central: &Adapter,
    device_id: &str,
    should_stop: &AtomicBool,
) -> Result<Peripheral, ConnectionError> {
    loop {
        if should_stop.load(Ordering::Relaxed) {
            return Err(ConnectionError::Interrupted);
        }
        for peripheral in central.peripherals().await? {
            if peripheral.id().to_string() == device_id {
                return Ok(peripheral);
            }
        }
        tokio::time::sleep(STOP_POLL_INTERVAL).await;
    }
}

/// Scan until the peripheral with `device_id` shows up
async fn find_peripheral(
    central: &Adapter,
    device_id: &str,
    timeout: Duration,
    should_stop: &AtomicBool,
) -> Result<Peripheral, ConnectionError> {
    central.start_scan(watto_filter()).await?;

    let lookup = poll_for_peripheral(central, device_id, should_stop);
    let result = match tokio::time::timeout(timeout, lookup).await {
        Ok(found) => found,
        Err(_) => Err(ConnectionError::DeviceNotFound(device_id.to_string())),
    };

    if let Err(e) = central.stop_scan().await {
        log::warn!("Could not stop scan: {}", e);
    }
    result
}

/// Resolves once `events` yields an item matching `wanted`. Returns false if
/// the stream ends first.
async fn first_match<S, T>(mut events: S, wanted: impl Fn(&T) -> bool) -> bool
where
    S: Stream<Item = T> + Unpin,
{
    while let Some(event) = events.next().await {
        if wanted(&event) {
            return true;
        }
    }
    false
}

async fn connect_with_retry(
    peripheral: &Peripheral,
    should_stop: &AtomicBool,
) -> Result<(), ConnectionError> {
    while !peripheral.is_connected().await? {
        if should_stop.load(Ordering::Relaxed) {
            return Err(ConnectionError::Interrupted);
        }
        if let Err(why) = peripheral.connect().await {
            log::warn!("Could not connect, retrying: {}", why);
            tokio::time::sleep(STOP_POLL_INTERVAL).await;
        }
    }
    Ok(())
}

async fn connect_to_device(
    peripheral: &Peripheral,
    timeout: Duration,
    should_stop: &AtomicBool,
) -> Result<(), ConnectionError> {
    log::info!("Connecting to {}", peripheral.id());
    match tokio::time::timeout(timeout, connect_with_retry(peripheral, should_stop)).await {
        Ok(result) => result?,
        Err(_) => return Err(ConnectionError::ConnectTimeout(peripheral.id().to_string())),
    }
    log::info!("Connected");
    Ok(())
}

/// Subscribe to every notifying characteristic of the telemetry service
async fn subscribe_to_streams(peripheral: &Peripheral) -> Result<usize, ConnectionError> {
    peripheral.discover_services().await?;

    let characteristics: Vec<_> = peripheral
        .characteristics()
        .into_iter()
        .filter(|c| c.service_uuid == SERVICE_UUID)
        .collect();
    if characteristics.is_empty() {
        return Err(ConnectionError::MissingService);
    }

    let mut subscribed = 0;
    for characteristic in characteristics
        .iter()
        .filter(|c| c.properties.contains(CharPropFlags::NOTIFY))
    {
        match peripheral.subscribe(characteristic).await {
            Ok(()) => {
                log::info!("Subscribed to {}", characteristic.uuid);
                subscribed += 1;
            }
            Err(why) => log::warn!("Could not subscribe to {}: {}", characteristic.uuid, why),
        }
    }
    Ok(subscribed)
}

async fn run_event_loop(
    central: &Adapter,
    peripheral: &Peripheral,
    handler: &Handler,
    should_stop: &AtomicBool,
) -> Result<(), ConnectionError> {
    let mut notifications = peripheral.notifications().await?;
    // bluez and CoreBluetooth keep the notification stream open after a link
    // loss, so watch the adapter for the disconnect instead
    let events = central.events().await?;
    let peripheral_id = peripheral.id();
    let link_lost = first_match(events, |event| {
        matches!(event, CentralEvent::DeviceDisconnected(id) if *id == peripheral_id)
    });

    tokio::select! {
        _ = async {
            while let Some(notification) = notifications.next().await {
                handler.notification(notification.uuid, &notification.value);
            }
        } => {
            log::info!("Notification stream ended");
        }
        lost = link_lost => {
            if lost {
                log::warn!("{} disconnected", peripheral_id);
                return Err(ConnectionError::LinkLost(peripheral_id.to_string()));
            }
            log::warn!("Adapter event stream ended");
        }
        _ = wait_for_stop(should_stop) => {
            log::info!("Disconnecting...");
            if let Err(e) = peripheral.disconnect().await {
                log::warn!("Disconnect failed: {}", e);
            }
        }
    }
    Ok(())
}

async fn run_session(
    device_id: &str,
    lookup_timeout: Duration,
    handler: &Handler,
    should_stop: &AtomicBool,
) -> Result<(), ConnectionError> {
    let central = first_adapter().await?.ok_or(ConnectionError::NoAdapter)?;
    let peripheral = find_peripheral(&central, device_id, lookup_timeout, should_stop).await?;

    connect_to_device(&peripheral, lookup_timeout, should_stop).await?;
    let subscribed = subscribe_to_streams(&peripheral).await?;
    log::info!("Streaming from {} characteristic(s)", subscribed);

    handler.status(ConnectionStatus::Connected);
    run_event_loop(&central, &peripheral, handler, should_stop).await
}

/// Discover → connect → subscribe → stream, until the stop flag is raised
/// or the device goes away
pub async fn start_data_collection(
    device_id: String,
    lookup_timeout: Duration,
    handler: Handler,
    should_stop: Arc<AtomicBool>,
) {
    handler.status(ConnectionStatus::Connecting);

    match run_session(&device_id, lookup_timeout, &handler, &should_stop).await {
        Ok(()) | Err(ConnectionError::Interrupted) => {
            handler.status(ConnectionStatus::Disconnected);
        }
        Err(e) => {
            log::error!("{}", e);
            handler.status(ConnectionStatus::Error(e.to_string()));
        }
    }
}
