//! # Error Types Module
//!
//! Centralized error handling for the Watto monitor.
//!
//! ## Error Types
//! - `ConnectionError`: BLE session and runtime failures
//! - `ConfigError`: Configuration file I/O and parsing errors
//! - `ScanError`: Device discovery errors
//!
//! ## Usage
//! ```rust
//! pub fn load() -> Result<Config, ConfigError> { ... }
//! pub async fn scan_devices(..) -> Result<Vec<BluetoothDevice>, ScanError> { ... }
//! async fn run_session(..) -> Result<(), ConnectionError> { ... }
//! ```

use std::fmt;

/// Errors that can occur while a device session is running
#[derive(Debug)]
pub enum ConnectionError {
    /// Failed to create Tokio runtime
    RuntimeCreation(String),
    /// Bluetooth adapter not found or not available
    NoAdapter,
    /// The requested peripheral never showed up during the lookup scan
    DeviceNotFound(String),
    /// Connect attempts kept failing until the deadline
    ConnectTimeout(String),
    /// The peripheral dropped the link while streaming
    LinkLost(String),
    /// Peripheral connected but does not expose the telemetry service
    MissingService,
    /// Any failure reported by the BLE stack
    Ble(btleplug::Error),
    /// Stop flag was raised while connecting
    Interrupted,
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::RuntimeCreation(msg) => {
                write!(f, "Failed to create async runtime: {}", msg)
            }
            ConnectionError::NoAdapter => {
                write!(f, "No Bluetooth adapter found. Please ensure Bluetooth is enabled.")
            }
            ConnectionError::DeviceNotFound(id) => {
                write!(f, "Device {} is no longer advertising", id)
            }
            ConnectionError::ConnectTimeout(id) => {
                write!(f, "Timed out connecting to {}", id)
            }
            ConnectionError::LinkLost(id) => {
                write!(f, "Lost connection to {}", id)
            }
            ConnectionError::MissingService => {
                write!(f, "Device does not expose the Watto telemetry service")
            }
            ConnectionError::Ble(e) => {
                write!(f, "Bluetooth error: {}", e)
            }
            ConnectionError::Interrupted => {
                write!(f, "Connection was interrupted by user")
            }
        }
    }
}

impl std::error::Error for ConnectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConnectionError::Ble(e) => Some(e),
            _ => None,
        }
    }
}

impl From<btleplug::Error> for ConnectionError {
    fn from(e: btleplug::Error) -> Self {
        ConnectionError::Ble(e)
    }
}

/// Errors that can occur during configuration operations
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read config file
    ReadFailed(std::io::Error),
    /// Failed to write config file
    WriteFailed(std::io::Error),
    /// Failed to parse config file
    ParseFailed(toml::de::Error),
    /// Failed to serialize config
    SerializeFailed(toml::ser::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ReadFailed(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::WriteFailed(e) => write!(f, "Failed to write config file: {}", e),
            ConfigError::ParseFailed(e) => write!(f, "Failed to parse config file: {}", e),
            ConfigError::SerializeFailed(e) => write!(f, "Failed to serialize config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadFailed(e) => Some(e),
            ConfigError::WriteFailed(e) => Some(e),
            ConfigError::ParseFailed(e) => Some(e),
            ConfigError::SerializeFailed(e) => Some(e),
        }
    }
}

/// Errors that can occur during device scanning
#[derive(Debug, Clone)]
pub enum ScanError {
    /// Bluetooth manager initialization failed
    ManagerInit(String),
    /// No Bluetooth adapters available
    NoAdapters,
    /// Scan operation failed
    ScanFailed(String),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::ManagerInit(msg) => {
                write!(f, "Failed to initialize Bluetooth manager: {}", msg)
            }
            ScanError::NoAdapters => write!(f, "No Bluetooth adapters found"),
            ScanError::ScanFailed(msg) => write!(f, "Scan operation failed: {}", msg),
        }
    }
}

impl std::error::Error for ScanError {}
