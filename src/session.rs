//! # Session Module
//!
//! The single owner of everything derived from the device stream: three
//! bounded series, a decimator per series, running statistics, and the
//! histogram/battery settings. Only the UI thread writes to it.
//!
//! ## Flow
//! notification batch → `Decimator::admit` → `SampleBuffer::extend`
//! → `RunningStats::extend` → on-demand `summary` / `histogram`

use crate::config::{clamp_capacity, Config};
use crate::decimation::{Decimator, Stride};
use crate::histogram::Histogram;
use crate::stats::{summarize, BatteryEstimate, RunningStats, Summary};
use crate::timeseries::SampleBuffer;
use crate::watto_data::Channel;
use chrono::{DateTime, Local};

#[derive(Debug, Clone)]
struct Series {
    buffer: SampleBuffer,
    decimator: Decimator,
    running: RunningStats,
}

impl Series {
    fn new(capacity: usize, stride: Stride) -> Self {
        Self {
            buffer: SampleBuffer::new(capacity),
            decimator: Decimator::new(stride),
            running: RunningStats::new(),
        }
    }
}

pub struct Session {
    series: [Series; 3],
    histogram_bins: usize,
    histogram_exponent: f32,
    battery_capacity_mah: f32,
    last_update: Option<DateTime<Local>>,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        let capacity = clamp_capacity(config.history_capacity);
        let stride = config.default_stride;
        Self {
            series: Channel::ALL.map(|_| Series::new(capacity, stride)),
            histogram_bins: config.histogram_bins,
            histogram_exponent: config.histogram_exponent,
            battery_capacity_mah: config.battery_capacity_mah,
            last_update: None,
        }
    }

    fn series(&self, channel: Channel) -> &Series {
        &self.series[channel.index()]
    }

    /// Feed one notification batch. Returns whether the decimator kept it.
    pub fn ingest(&mut self, channel: Channel, batch: &[f32]) -> bool {
        let series = &mut self.series[channel.index()];
        if !series.decimator.admit() {
            return false;
        }
        let readings: Vec<f32> = batch.iter().copied().filter(|v| v.is_finite()).collect();
        if readings.len() != batch.len() {
            log::debug!(
                "{}: dropped {} non-finite reading(s)",
                channel,
                batch.len() - readings.len()
            );
        }
        series.buffer.extend(&readings);
        series.running.extend(&readings);
        self.last_update = Some(Local::now());

        log::debug!(
            "{}: kept {} reading(s), buffer {}/{}",
            channel,
            readings.len(),
            series.buffer.len(),
            series.buffer.capacity()
        );
        true
    }

    pub fn stride(&self) -> Stride {
        self.series[0].decimator.stride()
    }

    pub fn set_stride(&mut self, stride: Stride) {
        log::info!("Decimation stride set to {}", stride);
        for series in &mut self.series {
            series.decimator.set_stride(stride);
        }
    }

    pub fn capacity(&self) -> usize {
        self.series[0].buffer.capacity()
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        let capacity = clamp_capacity(capacity);
        for series in &mut self.series {
            series.buffer.set_capacity(capacity);
        }
    }

    pub fn samples(&self, channel: Channel) -> Vec<f32> {
        self.series(channel).buffer.to_vec()
    }

    pub fn buffer(&self, channel: Channel) -> &SampleBuffer {
        &self.series(channel).buffer
    }

    pub fn summary(&self, channel: Channel) -> Option<Summary> {
        summarize(&self.samples(channel))
    }

    pub fn running(&self, channel: Channel) -> &RunningStats {
        &self.series(channel).running
    }

    pub fn histogram(&self, channel: Channel) -> Histogram {
        Histogram::from_samples(
            &self.samples(channel),
            self.histogram_bins,
            self.histogram_exponent,
        )
    }

    /// Remaining runtime at the mean current of the buffered window
    pub fn battery_estimate(&self) -> Option<BatteryEstimate> {
        let current = self.summary(Channel::Current)?;
        BatteryEstimate::from_mean_current(self.battery_capacity_mah, current.mean)
    }

    pub fn last_update(&self) -> Option<DateTime<Local>> {
        self.last_update
    }

    /// Drop all readings and statistics, keeping settings
    pub fn reset(&mut self) {
        for series in &mut self.series {
            series.buffer.clear();
            series.decimator.reset();
            series.running.reset();
        }
        self.last_update = None;
    }
}
