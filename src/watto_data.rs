//! # Watto Device Data Module
//!
//! Device-specific GATT layout and payload decoding for the Watto power meter.
//! Keeps the device framing separate from the generic buffering in
//! `timeseries` and the bookkeeping in `session`.
//!
//! ## GATT Layout
//! ```text
//! service 0xA000
//! ├── 0xA001  voltage  (notify)
//! ├── 0xA002  current  (notify)
//! └── 0xA003  power    (notify)
//! ```
//!
//! ## Payload
//! Each notification carries a batch of little-endian IEEE-754 `f32` readings
//! packed back to back, with no header.

use btleplug::api::bleuuid::uuid_from_u16;
use std::fmt;
use uuid::Uuid;

pub const SERVICE_UUID: Uuid = uuid_from_u16(0xA000);
pub const VOLTAGE_UUID: Uuid = uuid_from_u16(0xA001);
pub const CURRENT_UUID: Uuid = uuid_from_u16(0xA002);
pub const POWER_UUID: Uuid = uuid_from_u16(0xA003);

const SAMPLE_SIZE: usize = std::mem::size_of::<f32>();

/// One of the three telemetry streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Voltage,
    Current,
    Power,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Voltage, Channel::Current, Channel::Power];

    pub fn from_uuid(uuid: Uuid) -> Option<Self> {
        Channel::ALL.into_iter().find(|channel| channel.uuid() == uuid)
    }

    pub fn uuid(self) -> Uuid {
        match self {
            Channel::Voltage => VOLTAGE_UUID,
            Channel::Current => CURRENT_UUID,
            Channel::Power => POWER_UUID,
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Channel::Voltage => "V",
            Channel::Current => "mA",
            Channel::Power => "W",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Channel::Voltage => 0,
            Channel::Current => 1,
            Channel::Power => 2,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Voltage => "Voltage",
            Channel::Current => "Current",
            Channel::Power => "Power",
        };
        f.write_str(name)
    }
}

/// Decode a notification payload into readings.
///
/// A trailing partial float is dropped.
pub fn decode_samples(payload: &[u8]) -> Vec<f32> {
    let chunks = payload.chunks_exact(SAMPLE_SIZE);
    let remainder = chunks.remainder().len();
    if remainder != 0 {
        log::debug!("Dropping {} trailing byte(s) from {} byte payload", remainder, payload.len());
    }
    chunks
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
