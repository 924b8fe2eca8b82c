// Hide console window on Windows in release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod charts;
mod config;
mod connection;
mod decimation;
mod device_scanner;
mod error;
mod histogram;
mod sensor;
mod session;
mod stats;
mod timeseries;
mod ui;
mod watto_data;

use app::WattoMonitor;
use config::Config;
use connection::ConnectionManager;
use iced::Theme;
use sensor::SensorUpdate;
use std::time::Duration;

fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load().unwrap_or_else(|e| {
        log::warn!("{}; falling back to defaults", e);
        Config::default()
    });

    // BLE thread → UI thread
    let (sender, receiver) = crossbeam_channel::unbounded::<SensorUpdate>();

    let lookup_timeout = Duration::from_secs(config.scan_duration_secs.saturating_mul(2));
    let (manager, connect_sender) = ConnectionManager::new(sender, lookup_timeout);

    std::thread::spawn(move || {
        manager.run();
    });

    iced::application("Watto Monitor", WattoMonitor::update, WattoMonitor::view)
        .subscription(WattoMonitor::subscription)
        .theme(|_| Theme::Light)
        .window_size((1200.0, 800.0))
        .run_with(move || WattoMonitor::new(config, receiver, connect_sender))
}
