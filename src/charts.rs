use crate::app::{Message, WattoMonitor};
use crate::histogram::Histogram;
use crate::watto_data::Channel;
use plotters::chart::ChartBuilder;
use plotters::element::Rectangle;
use plotters::series::LineSeries;
use plotters::style::{Color as _, RGBColor, BLUE, GREEN, RED};
use plotters_iced::{Chart, DrawingBackend};

const BACKGROUND: RGBColor = RGBColor(245, 245, 240);
const AXIS: RGBColor = RGBColor(60, 60, 60);

fn series_color(channel: Channel) -> RGBColor {
    match channel {
        Channel::Voltage => RED,
        Channel::Current => BLUE,
        Channel::Power => GREEN,
    }
}

/// Y range with 5% headroom; flat or empty series get a unit-wide band
pub fn padded_range(min_max: Option<(f32, f32)>) -> (f32, f32) {
    match min_max {
        None => (0.0, 1.0),
        Some((min, max)) if max - min <= f32::EPSILON => (min - 0.5, max + 0.5),
        Some((min, max)) => {
            let pad = (max - min) * 0.05;
            (min - pad, max + pad)
        }
    }
}

/// Line chart of one series, x axis is the sample index
pub struct SeriesChart<'a> {
    pub state: &'a WattoMonitor,
    pub channel: Channel,
}

/// Power-law histogram of one series
pub struct HistogramChart<'a> {
    pub state: &'a WattoMonitor,
    pub channel: Channel,
}

impl<'a> Chart<Message> for SeriesChart<'a> {
    type State = ();

    fn build_chart<DB: DrawingBackend>(&self, _state: &Self::State, mut builder: ChartBuilder<DB>) {
        let buffer = self.state.session.buffer(self.channel);
        let (y_min, y_max) = padded_range(buffer.min_max());
        let x_max = buffer.capacity() as f32;

        let caption = match buffer.last() {
            Some(last) => format!("{} ({}) {:.3}", self.channel, self.channel.unit(), last),
            None => format!("{} ({})", self.channel, self.channel.unit()),
        };

        let mut chart = builder
            .margin(10)
            .caption(caption, ("sans-serif", 18))
            .x_label_area_size(20)
            .y_label_area_size(40)
            .build_cartesian_2d(0f32..x_max, y_min..y_max)
            .expect("Failed to build chart");

        chart.plotting_area().fill(&BACKGROUND).expect("Failed to fill background");
        chart
            .configure_mesh()
            .axis_style(AXIS)
            .draw()
            .expect("Failed to draw mesh");

        chart
            .draw_series(LineSeries::new(
                buffer.iter().enumerate().map(|(i, v)| (i as f32, v)),
                &series_color(self.channel),
            ))
            .expect("Failed to draw series");
    }
}

impl<'a> Chart<Message> for HistogramChart<'a> {
    type State = ();

    fn build_chart<DB: DrawingBackend>(&self, _state: &Self::State, mut builder: ChartBuilder<DB>) {
        let histogram: Histogram = self.state.session.histogram(self.channel);
        let edges = histogram.edges();
        let (x_min, x_max) = padded_range(edges.first().copied().zip(edges.last().copied()));
        let y_max = (histogram.max_count().max(1) as f32) * 1.1;

        let mut chart = builder
            .margin(10)
            .caption(
                format!("{} distribution (n={})", self.channel, histogram.total()),
                ("sans-serif", 18),
            )
            .x_label_area_size(20)
            .y_label_area_size(30)
            .build_cartesian_2d(x_min..x_max, 0f32..y_max)
            .expect("Failed to build chart");

        chart.plotting_area().fill(&BACKGROUND).expect("Failed to fill background");
        chart
            .configure_mesh()
            .axis_style(AXIS)
            .draw()
            .expect("Failed to draw mesh");

        if histogram.is_empty() {
            return;
        }
        let color = series_color(self.channel);
        let flat = edges.len() == 2 && edges[0] == edges[1];
        chart
            .draw_series(histogram.buckets().map(|(lower, upper, count)| {
                // a constant series has a zero-width bucket; give it a visible bar
                let (lower, upper) = if flat { (x_min, x_max) } else { (lower, upper) };
                Rectangle::new([(lower, 0.0), (upper, count as f32)], color.mix(0.6).filled())
            }))
            .expect("Failed to draw histogram");
    }
}
