use crate::error::ScanError;
use crate::watto_data::SERVICE_UUID;
use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BluetoothDevice {
    pub id: String,
    pub name: String,
}

impl BluetoothDevice {
    pub fn new(id: String, name: String) -> Self {
        Self { id, name }
    }
}

/// First adapter reported by the platform, if any
pub async fn first_adapter() -> Result<Option<Adapter>, btleplug::Error> {
    let manager = Manager::new().await?;
    Ok(manager.adapters().await?.into_iter().next())
}

/// Scan filter that asks the OS for Watto advertisements only
pub fn watto_filter() -> ScanFilter {
    ScanFilter {
        services: vec![SERVICE_UUID],
    }
}

/// Whether an advertisement looks like a Watto
pub fn is_watto(local_name: Option<&str>, services: &[uuid::Uuid]) -> bool {
    services.contains(&SERVICE_UUID)
        || local_name.is_some_and(|name| name.to_lowercase().contains("watto"))
}

/// Scans for nearby Watto devices for `duration`
pub async fn scan_devices(duration: Duration) -> Result<Vec<BluetoothDevice>, ScanError> {
    let central = first_adapter()
        .await
        .map_err(|e| ScanError::ManagerInit(e.to_string()))?
        .ok_or(ScanError::NoAdapters)?;

    log::info!("Scanning for Watto devices ({}s)", duration.as_secs());
    central
        .start_scan(watto_filter())
        .await
        .map_err(|e| ScanError::ScanFailed(e.to_string()))?;

    tokio::time::sleep(duration).await;

    central
        .stop_scan()
        .await
        .map_err(|e| ScanError::ScanFailed(e.to_string()))?;

    let peripherals = central
        .peripherals()
        .await
        .map_err(|e| ScanError::ScanFailed(e.to_string()))?;

    let mut devices = Vec::new();
    for peripheral in peripherals {
        if let Some(device) = describe(&peripheral).await {
            devices.push(device);
        }
    }

    log::info!("Scan finished, {} device(s) found", devices.len());
    Ok(devices)
}

async fn describe(peripheral: &Peripheral) -> Option<BluetoothDevice> {
    let props = peripheral.properties().await.ok().flatten()?;
    if !is_watto(props.local_name.as_deref(), &props.services) {
        return None;
    }
    let id = peripheral.id().to_string();
    let name = props.local_name.unwrap_or_else(|| "Watto".to_string());
    Some(BluetoothDevice::new(id, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_watto_by_service() {
        assert!(is_watto(None, &[SERVICE_UUID]));
    }

    #[test]
    fn test_is_watto_by_name() {
        assert!(is_watto(Some("WATTO-01"), &[]));
        assert!(!is_watto(Some("HR Sensor 1234"), &[]));
        assert!(!is_watto(None, &[]));
    }

    #[test]
    fn test_filter_targets_service() {
        assert_eq!(watto_filter().services, vec![SERVICE_UUID]);
    }
}
