use crate::charts::{HistogramChart, SeriesChart};
use crate::config::Config;
use crate::connection::ConnectionCommand;
use crate::decimation::Stride;
use crate::device_scanner::{scan_devices, BluetoothDevice};
use crate::error::ScanError;
use crate::sensor::{ConnectionStatus, SensorUpdate};
use crate::session::Session;
use crate::stats::{energy_wh, BatteryEstimate, Summary};
use crate::ui::styles;
use crate::watto_data::Channel;
use crossbeam_channel::{Receiver, Sender};
use iced::widget::{button, column, container, row, scrollable, text};
use iced::{Element, Length, Subscription, Task};
use plotters_iced::ChartWidget;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    Disconnected,
    Scanning,
    Connecting,
    Connected,
}

// Iced Application State
pub struct WattoMonitor {
    pub session: Session,
    receiver: Receiver<SensorUpdate>,
    pub connection_state: ConnectionState,
    pub available_devices: Vec<BluetoothDevice>,
    pub selected_device: Option<BluetoothDevice>,
    pub last_error: Option<String>,
    connect_sender: Sender<ConnectionCommand>,
    config: Config,
    autoconnect_pending: bool,
}

#[derive(Debug, Clone)]
pub enum Message {
    Tick,
    ScanDevices,
    DevicesScanned(Result<Vec<BluetoothDevice>, ScanError>),
    SelectDevice(BluetoothDevice),
    ConnectDevice,
    DisconnectDevice,
    SetStride(Stride),
    SetCapacity(usize),
}

/// History lengths offered in the sidebar
pub const CAPACITY_CHOICES: [usize; 3] = [200, 500, 1000];

/// One line of the stats panel
pub fn format_summary(channel: Channel, summary: Option<Summary>) -> String {
    let unit = channel.unit();
    match summary {
        None => format!("{}: no data", channel),
        Some(s) => format!(
            "{}: {:.3} {unit}\nmean {:.3}  median {:.3}\nmin {:.3}  max {:.3}",
            channel, s.last, s.mean, s.median, s.min, s.max
        ),
    }
}

pub fn format_battery(estimate: Option<BatteryEstimate>, mean_power_w: Option<f32>) -> String {
    match estimate {
        None => "Battery life: waiting for current readings".to_string(),
        Some(est) => {
            let (hours, minutes) = est.hours_minutes();
            match mean_power_w {
                Some(power) => format!(
                    "Battery life: ~{}h {:02}m ({:.2} Wh at mean power)",
                    hours,
                    minutes,
                    energy_wh(power, est.hours)
                ),
                None => format!("Battery life: ~{}h {:02}m", hours, minutes),
            }
        }
    }
}

impl WattoMonitor {
    pub fn new(
        config: Config,
        receiver: Receiver<SensorUpdate>,
        connect_sender: Sender<ConnectionCommand>,
    ) -> (Self, Task<Message>) {
        let autoconnect_pending = config.enable_autoconnect;
        let startup = if autoconnect_pending {
            Task::done(Message::ScanDevices)
        } else {
            Task::none()
        };

        (
            WattoMonitor {
                session: Session::new(&config),
                receiver,
                connection_state: ConnectionState::Disconnected,
                available_devices: Vec::new(),
                selected_device: None,
                last_error: None,
                connect_sender,
                config,
                autoconnect_pending,
            },
            startup,
        )
    }

    fn apply_sensor_update(&mut self, update: SensorUpdate) {
        match update {
            SensorUpdate::Samples { channel, values } => {
                self.session.ingest(channel, &values);
            }
            SensorUpdate::ConnectionStatus(status) => match status {
                ConnectionStatus::Connecting => {
                    self.connection_state = ConnectionState::Connecting;
                }
                ConnectionStatus::Connected => {
                    self.connection_state = ConnectionState::Connected;
                    self.last_error = None;
                }
                ConnectionStatus::Disconnected => {
                    self.connection_state = ConnectionState::Disconnected;
                    self.session.reset();
                }
                ConnectionStatus::Error(e) => {
                    log::error!("Connection error: {}", e);
                    self.connection_state = ConnectionState::Disconnected;
                    self.session.reset();
                    self.last_error = Some(e);
                }
            },
        }
    }

    fn request_connect(&mut self) {
        let Some(device) = &self.selected_device else {
            return;
        };
        self.connection_state = ConnectionState::Connecting;
        if let Err(e) = self
            .connect_sender
            .send(ConnectionCommand::Connect(device.id.clone()))
        {
            log::error!("Failed to send connection request: {}", e);
            self.connection_state = ConnectionState::Disconnected;
        }
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => {
                // Drain everything queued since the last frame without blocking
                while let Ok(update) = self.receiver.try_recv() {
                    self.apply_sensor_update(update);
                }
                Task::none()
            }
            Message::ScanDevices => {
                self.connection_state = ConnectionState::Scanning;
                self.available_devices.clear();
                let duration = Duration::from_secs(self.config.scan_duration_secs);
                Task::perform(scan_devices(duration), Message::DevicesScanned)
            }
            Message::DevicesScanned(result) => {
                self.connection_state = ConnectionState::Disconnected;
                match result {
                    Ok(devices) => {
                        self.available_devices = devices;
                    }
                    Err(e) => {
                        log::error!("Error scanning devices: {}", e);
                        self.last_error = Some(e.to_string());
                    }
                }
                if std::mem::take(&mut self.autoconnect_pending) {
                    if let Some(first) = self.available_devices.first().cloned() {
                        log::info!("Autoconnecting to {}", first.name);
                        self.selected_device = Some(first);
                        self.request_connect();
                    }
                }
                Task::none()
            }
            Message::SelectDevice(device) => {
                self.selected_device = Some(device);
                Task::none()
            }
            Message::ConnectDevice => {
                self.request_connect();
                Task::none()
            }
            Message::DisconnectDevice => {
                log::debug!("UI: Sending disconnect command");
                if let Err(e) = self.connect_sender.send(ConnectionCommand::Disconnect) {
                    log::error!("Failed to send disconnect request: {}", e);
                }
                // A pending connect has nothing to tear down on screen; otherwise
                // wait for ConnectionStatus::Disconnected
                if self.connection_state == ConnectionState::Connecting {
                    self.connection_state = ConnectionState::Disconnected;
                }
                Task::none()
            }
            Message::SetStride(stride) => {
                self.session.set_stride(stride);
                Task::none()
            }
            Message::SetCapacity(capacity) => {
                self.session.set_capacity(capacity);
                Task::none()
            }
        }
    }

    /// What the connect/disconnect button does in the current state
    fn connect_button_action(&self) -> Option<Message> {
        match self.connection_state {
            ConnectionState::Connected | ConnectionState::Connecting => {
                Some(Message::DisconnectDevice)
            }
            ConnectionState::Scanning => None,
            ConnectionState::Disconnected => {
                self.selected_device.as_ref().map(|_| Message::ConnectDevice)
            }
        }
    }

    pub fn subscription(&self) -> Subscription<Message> {
        iced::time::every(Duration::from_millis(16)).map(|_| Message::Tick)
    }

    pub fn view(&'_ self) -> Element<'_, Message> {
        let sidebar = self.create_sidebar();

        let main_content = if self.connection_state == ConnectionState::Connected {
            self.create_main_view()
        } else {
            self.create_disconnected_view()
        };

        container(row![sidebar, main_content].spacing(0))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn create_sidebar(&self) -> Element<'_, Message> {
        let title = text("Watto Devices").size(20);

        let scan_button = button(text(if self.connection_state == ConnectionState::Scanning {
            "Scanning..."
        } else {
            "Scan for Devices"
        }))
        .on_press_maybe(
            (self.connection_state == ConnectionState::Disconnected).then_some(Message::ScanDevices),
        )
        .padding(10);

        let device_list: Element<'_, Message> = if self.available_devices.is_empty() {
            text("No devices found. Click 'Scan for Devices' to start.").into()
        } else {
            let is_connected = self.connection_state == ConnectionState::Connected;
            let devices = self.available_devices.iter().map(|device| {
                let is_selected = self.selected_device.as_ref() == Some(device);
                button(text(format!("{}\n{}", device.name, device.id)).size(14))
                    .on_press_maybe((!is_connected).then(|| Message::SelectDevice(device.clone())))
                    .width(Length::Fill)
                    .padding(10)
                    .style(styles::device_button_style(is_selected))
                    .into()
            });
            scrollable(column(devices).spacing(5)).into()
        };

        let action = self.connect_button_action();
        let connect_button = match self.connection_state {
            ConnectionState::Connected => button(text("Disconnect"))
                .on_press_maybe(action)
                .padding(10)
                .width(Length::Fill)
                .style(styles::disconnect_button_style()),
            ConnectionState::Connecting => button(text("Connecting... (cancel)"))
                .on_press_maybe(action)
                .padding(10)
                .width(Length::Fill)
                .style(styles::disconnect_button_style()),
            _ if self.selected_device.is_some() => button(text("Connect"))
                .on_press_maybe(action)
                .padding(10)
                .width(Length::Fill)
                .style(styles::connect_button_style()),
            _ => button(text("Select a device")).padding(10).width(Length::Fill),
        };

        let current = self.session.stride();
        let strides = row(Stride::ALL.iter().map(|&stride| {
            button(text(stride.to_string()).size(14))
                .on_press(Message::SetStride(stride))
                .padding(8)
                .style(styles::selector_button_style(stride == current))
                .into()
        }))
        .spacing(5);

        let capacity = self.session.capacity();
        let capacities = row(CAPACITY_CHOICES.iter().map(|&choice| {
            button(text(choice.to_string()).size(14))
                .on_press(Message::SetCapacity(choice))
                .padding(8)
                .style(styles::selector_button_style(choice == capacity))
                .into()
        }))
        .spacing(5);

        let mut sidebar_content = column![
            title,
            scan_button,
            device_list,
            connect_button,
            text("Keep batches").size(16),
            strides,
            text("History length").size(16),
            capacities
        ]
        .spacing(10)
        .padding(20)
        .width(300);

        if let Some(error) = &self.last_error {
            sidebar_content = sidebar_content.push(text(error.as_str()).size(14));
        }

        container(sidebar_content)
            .style(container::bordered_box)
            .width(Length::Fixed(300.0))
            .height(Length::Fill)
            .into()
    }

    fn create_disconnected_view(&self) -> Element<'_, Message> {
        let message = match self.connection_state {
            ConnectionState::Scanning => "Scanning for devices...",
            ConnectionState::Connecting => "Connecting to device...",
            _ => "Select a Watto device from the sidebar to begin",
        };

        container(
            column![text(message).size(24)]
                .width(Length::Fill)
                .align_x(iced::alignment::Horizontal::Center),
        )
        .width(Length::Fill)
        .height(Length::Fill)
        .center(Length::Fill)
        .into()
    }

    fn create_stats_panel(&self) -> Element<'_, Message> {
        let mut stats = column![].spacing(16);
        for channel in Channel::ALL {
            let running = self.session.running(channel);
            stats = stats
                .push(text(format_summary(channel, self.session.summary(channel))).size(16))
                .push(
                    text(match (running.mean(), running.min(), running.max()) {
                        (Some(mean), Some(min), Some(max)) => format!(
                            "session n={}  mean {:.3}  σ {:.3}  range {:.3}..{:.3}",
                            running.count(),
                            mean,
                            running.std_dev(),
                            min,
                            max
                        ),
                        _ => "session: no readings yet".to_string(),
                    })
                    .size(12),
                );
        }

        let mean_power = self.session.summary(Channel::Power).map(|s| s.mean);
        stats = stats.push(text(format_battery(self.session.battery_estimate(), mean_power)).size(16));

        let updated = match self.session.last_update() {
            Some(at) => format!("Last update: {}", at.format("%H:%M:%S")),
            None => "Last update: never".to_string(),
        };
        stats.push(text(updated).size(12)).into()
    }

    fn create_main_view(&self) -> Element<'_, Message> {
        let rows: Vec<Element<'_, Message>> = Channel::ALL
            .iter()
            .map(|&channel| {
                let line = ChartWidget::new(SeriesChart { state: self, channel })
                    .width(Length::FillPortion(3))
                    .height(Length::Fill);
                let histogram = ChartWidget::new(HistogramChart { state: self, channel })
                    .width(Length::FillPortion(2))
                    .height(Length::Fill);
                row![line, histogram].spacing(10).height(Length::Fill).into()
            })
            .collect();

        let plots = column(rows).width(Length::FillPortion(4)).spacing(10);

        let stats = container(self.create_stats_panel()).width(Length::FillPortion(1));

        container(row![plots, stats].spacing(20).padding(20))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    fn app(config: Config) -> (WattoMonitor, Sender<SensorUpdate>, Receiver<ConnectionCommand>) {
        let (sensor_tx, sensor_rx) = unbounded();
        let (command_tx, command_rx) = unbounded();
        let (app, _) = WattoMonitor::new(config, sensor_rx, command_tx);
        (app, sensor_tx, command_rx)
    }

    fn device(id: &str) -> BluetoothDevice {
        BluetoothDevice::new(id.to_string(), format!("WATTO {}", id))
    }

    #[test]
    fn test_tick_drains_samples_into_session() {
        let (mut app, sensor_tx, _) = app(Config::default());
        sensor_tx
            .send(SensorUpdate::Samples {
                channel: Channel::Voltage,
                values: vec![3.6, 3.7],
            })
            .unwrap();
        sensor_tx
            .send(SensorUpdate::ConnectionStatus(ConnectionStatus::Connected))
            .unwrap();

        let _ = app.update(Message::Tick);

        assert_eq!(app.session.samples(Channel::Voltage), vec![3.6, 3.7]);
        assert_eq!(app.connection_state, ConnectionState::Connected);
    }

    #[test]
    fn test_disconnect_resets_session() {
        let (mut app, sensor_tx, _) = app(Config::default());
        sensor_tx
            .send(SensorUpdate::Samples {
                channel: Channel::Power,
                values: vec![1.0],
            })
            .unwrap();
        sensor_tx
            .send(SensorUpdate::ConnectionStatus(ConnectionStatus::Disconnected))
            .unwrap();

        let _ = app.update(Message::Tick);

        assert!(app.session.buffer(Channel::Power).is_empty());
        assert_eq!(app.connection_state, ConnectionState::Disconnected);
    }

    #[test]
    fn test_error_status_is_kept_for_display() {
        let (mut app, sensor_tx, _) = app(Config::default());
        sensor_tx
            .send(SensorUpdate::ConnectionStatus(ConnectionStatus::Error("boom".into())))
            .unwrap();
        let _ = app.update(Message::Tick);
        assert_eq!(app.last_error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_error_after_connect_clears_stale_series() {
        let (mut app, sensor_tx, _) = app(Config::default());
        sensor_tx
            .send(SensorUpdate::ConnectionStatus(ConnectionStatus::Connected))
            .unwrap();
        sensor_tx
            .send(SensorUpdate::Samples {
                channel: Channel::Current,
                values: vec![42.0],
            })
            .unwrap();
        sensor_tx
            .send(SensorUpdate::ConnectionStatus(ConnectionStatus::Error(
                "Lost connection to A".into(),
            )))
            .unwrap();

        let _ = app.update(Message::Tick);

        assert!(app.session.buffer(Channel::Current).is_empty());
        assert_eq!(app.connection_state, ConnectionState::Disconnected);
        assert_eq!(app.last_error.as_deref(), Some("Lost connection to A"));
    }

    #[test]
    fn test_pending_connect_can_be_cancelled() {
        let config = Config {
            enable_autoconnect: false,
            ..Config::default()
        };
        let (mut app, _, command_rx) = app(config);

        let _ = app.update(Message::SelectDevice(device("A")));
        let _ = app.update(Message::ConnectDevice);
        assert_eq!(command_rx.try_recv(), Ok(ConnectionCommand::Connect("A".to_string())));
        assert_eq!(app.connection_state, ConnectionState::Connecting);
        assert!(matches!(
            app.connect_button_action(),
            Some(Message::DisconnectDevice)
        ));

        let _ = app.update(Message::DisconnectDevice);
        assert_eq!(command_rx.try_recv(), Ok(ConnectionCommand::Disconnect));
        assert_eq!(app.connection_state, ConnectionState::Disconnected);
        assert!(matches!(
            app.connect_button_action(),
            Some(Message::ConnectDevice)
        ));
    }

    #[test]
    fn test_autoconnect_picks_first_device_once() {
        let (mut app, _, command_rx) = app(Config::default());

        let _ = app.update(Message::DevicesScanned(Ok(vec![device("A"), device("B")])));
        assert_eq!(command_rx.try_recv(), Ok(ConnectionCommand::Connect("A".to_string())));
        assert_eq!(app.connection_state, ConnectionState::Connecting);

        let _ = app.update(Message::DevicesScanned(Ok(vec![device("C")])));
        assert!(command_rx.try_recv().is_err());
    }

    #[test]
    fn test_manual_connect_without_autoconnect() {
        let config = Config {
            enable_autoconnect: false,
            ..Config::default()
        };
        let (mut app, _, command_rx) = app(config);

        let _ = app.update(Message::DevicesScanned(Ok(vec![device("A"), device("B")])));
        assert!(command_rx.try_recv().is_err());

        let _ = app.update(Message::SelectDevice(device("B")));
        let _ = app.update(Message::ConnectDevice);
        assert_eq!(command_rx.try_recv(), Ok(ConnectionCommand::Connect("B".to_string())));

        let _ = app.update(Message::DisconnectDevice);
        assert_eq!(command_rx.try_recv(), Ok(ConnectionCommand::Disconnect));
    }

    #[test]
    fn test_set_stride_message() {
        let (mut app, _, _) = app(Config::default());
        let _ = app.update(Message::SetStride(Stride::Hundred));
        assert_eq!(app.session.stride(), Stride::Hundred);
    }

    #[test]
    fn test_set_capacity_message() {
        let (mut app, _, _) = app(Config::default());
        let _ = app.update(Message::SetCapacity(1000));
        assert_eq!(app.session.capacity(), 1000);
    }

    #[test]
    fn test_format_summary() {
        assert_eq!(format_summary(Channel::Current, None), "Current: no data");

        let summary = crate::stats::summarize(&[1.0, 2.0, 3.0]);
        let line = format_summary(Channel::Voltage, summary);
        assert!(line.starts_with("Voltage: 3.000 V"));
        assert!(line.contains("median 2.000"));
    }

    #[test]
    fn test_format_battery() {
        assert!(format_battery(None, None).contains("waiting"));

        let est = BatteryEstimate::from_mean_current(1000.0, 400.0);
        assert_eq!(format_battery(est, None), "Battery life: ~2h 30m");
        assert!(format_battery(est, Some(2.0)).contains("5.00 Wh"));
    }
}
