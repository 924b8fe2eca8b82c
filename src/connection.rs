//! # Connection Management Module
//!
//! Handles the Bluetooth connection lifecycle for Watto devices.
//!
//! ## Key Components
//! - `ConnectionManager`: Owns the Tokio runtime and processes commands
//! - `ConnectionCommand`: Commands sent from UI to connection thread
//! - One atomic stop flag per connection attempt

use crate::error::ConnectionError;
use crate::sensor::{start_data_collection, ConnectionStatus, Handler, SensorUpdate};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionCommand {
    Connect(String),
    Disconnect,
}

/// Manages the connection lifecycle for Watto devices.
///
/// Runs in a dedicated thread with its own Tokio runtime so BLE calls never
/// block the UI thread.
pub struct ConnectionManager {
    command_receiver: Receiver<ConnectionCommand>,
    sensor_sender: Sender<SensorUpdate>,
    lookup_timeout: Duration,
}

impl ConnectionManager {
    /// Creates a new ConnectionManager.
    ///
    /// Returns the manager and a sender for issuing commands from the UI thread.
    pub fn new(
        sensor_sender: Sender<SensorUpdate>,
        lookup_timeout: Duration,
    ) -> (Self, Sender<ConnectionCommand>) {
        let (command_sender, command_receiver) = unbounded();

        let manager = ConnectionManager {
            command_receiver,
            sensor_sender,
            lookup_timeout,
        };

        (manager, command_sender)
    }

    /// Runs the connection management loop.
    ///
    /// Blocks until the command channel is closed; call it from a spawned thread.
    pub fn run(self) {
        let rt = match Runtime::new() {
            Ok(runtime) => runtime,
            Err(e) => {
                let error = ConnectionError::RuntimeCreation(e.to_string());
                log::error!("{}", error);
                let _ = self
                    .sensor_sender
                    .send(SensorUpdate::ConnectionStatus(ConnectionStatus::Error(error.to_string())));
                return;
            }
        };

        let mut stop_flag: Option<Arc<AtomicBool>> = None;

        while let Ok(command) = self.command_receiver.recv() {
            match command {
                ConnectionCommand::Connect(device_id) => {
                    log::info!("Connection manager: Connecting to device: {}", device_id);

                    // Only one device at a time; a new connect cancels the old session
                    if let Some(flag) = stop_flag.take() {
                        flag.store(true, Ordering::Relaxed);
                    }
                    let should_stop = Arc::new(AtomicBool::new(false));
                    stop_flag = Some(should_stop.clone());

                    let handler = Handler::new(self.sensor_sender.clone());
                    let timeout = self.lookup_timeout;
                    rt.spawn(start_data_collection(device_id, timeout, handler, should_stop));
                }
                ConnectionCommand::Disconnect => {
                    log::info!("Connection manager: Disconnect requested");
                    if let Some(flag) = stop_flag.take() {
                        log::debug!("Connection manager: Setting stop flag");
                        flag.store(true, Ordering::Relaxed);
                    }
                }
            }
        }

        if let Some(flag) = stop_flag {
            flag.store(true, Ordering::Relaxed);
        }
        log::info!("Connection manager: Command channel closed, shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_manager_creation() {
        let (sensor_sender, _sensor_receiver) = unbounded();
        let (_manager, command_sender) =
            ConnectionManager::new(sensor_sender, Duration::from_secs(5));

        assert!(command_sender.send(ConnectionCommand::Disconnect).is_ok());
    }

    #[test]
    fn test_run_returns_when_commands_close() {
        let (sensor_sender, sensor_receiver) = unbounded();
        let (manager, command_sender) =
            ConnectionManager::new(sensor_sender, Duration::from_secs(5));

        command_sender.send(ConnectionCommand::Disconnect).unwrap();
        drop(command_sender);

        let worker = std::thread::spawn(move || manager.run());
        worker.join().expect("manager thread panicked");
        assert!(sensor_receiver.try_recv().is_err());
    }
}
