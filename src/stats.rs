//! # Statistics Module
//!
//! Summary statistics over the buffered window, Welford running statistics
//! over everything admitted since the last reset, and the battery-life estimate.

/// Snapshot of a window of readings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f32,
    pub min: f32,
    pub max: f32,
    pub last: f32,
    pub median: f32,
}

/// Summarize a window. Non-finite readings are ignored; `None` when nothing is left.
pub fn summarize(samples: &[f32]) -> Option<Summary> {
    let mut sorted: Vec<f32> = samples.iter().copied().filter(|v| v.is_finite()).collect();
    let last = *sorted.last()?;

    let count = sorted.len();
    // f64 accumulator keeps 1000 f32 readings from drifting
    let sum: f64 = sorted.iter().map(|&v| v as f64).sum();
    let mean = (sum / count as f64) as f32;

    sorted.sort_by(f32::total_cmp);
    let mid = count / 2;
    let median = if count % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    Some(Summary {
        count,
        mean,
        min: sorted[0],
        max: sorted[count - 1],
        last,
        median,
    })
}

/// Incremental mean/variance/min/max (Welford)
#[derive(Debug, Clone, Copy)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f32,
    max: f32,
}

impl Default for RunningStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunningStats {
    pub const fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
        }
    }

    pub fn push(&mut self, x: f32) {
        if !x.is_finite() {
            return;
        }
        self.count += 1;
        let x64 = x as f64;
        let delta = x64 - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x64 - self.mean);
        self.min = self.min.min(x);
        self.max = self.max.max(x);
    }

    pub fn extend(&mut self, batch: &[f32]) {
        batch.iter().for_each(|&x| self.push(x));
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> Option<f32> {
        (self.count > 0).then_some(self.mean as f32)
    }

    /// Sample variance
    pub fn variance(&self) -> f32 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / (self.count - 1) as f64) as f32
        }
    }

    pub fn std_dev(&self) -> f32 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> Option<f32> {
        (self.count > 0).then_some(self.min)
    }

    pub fn max(&self) -> Option<f32> {
        (self.count > 0).then_some(self.max)
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Time left on a battery at the observed average draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryEstimate {
    pub hours: f32,
}

impl BatteryEstimate {
    pub fn from_mean_current(capacity_mah: f32, mean_current_ma: f32) -> Option<Self> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if !valid(capacity_mah) || !valid(mean_current_ma) {
            return None;
        }
        Some(Self {
            hours: capacity_mah / mean_current_ma,
        })
    }

    /// Whole hours and leftover minutes, for display
    pub fn hours_minutes(&self) -> (u64, u64) {
        let total_minutes = (self.hours as f64 * 60.0).round() as u64;
        (total_minutes / 60, total_minutes % 60)
    }
}

/// Energy drawn over `hours` at a constant `mean_power_w`
pub fn energy_wh(mean_power_w: f32, hours: f32) -> f32 {
    mean_power_w * hours
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_empty() {
        assert_eq!(summarize(&[]), None);
        assert_eq!(summarize(&[f32::NAN]), None);
    }

    #[test]
    fn test_summarize_odd_count() {
        let s = summarize(&[5.0, 1.0, 3.0]).unwrap();
        assert_eq!(s.count, 3);
        assert_eq!(s.mean, 3.0);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 5.0);
        assert_eq!(s.last, 3.0);
        assert_eq!(s.median, 3.0);
    }

    #[test]
    fn test_summarize_even_count_median() {
        let s = summarize(&[4.0, 1.0, 2.0, 3.0]).unwrap();
        assert_eq!(s.median, 2.5);
        assert_eq!(s.last, 3.0);
    }

    #[test]
    fn test_summarize_ignores_non_finite() {
        let s = summarize(&[1.0, f32::NAN, 3.0, f32::INFINITY]).unwrap();
        assert_eq!(s.count, 2);
        assert_eq!(s.mean, 2.0);
        assert_eq!(s.max, 3.0);
        assert_eq!(s.last, 3.0);
    }

    #[test]
    fn test_running_stats_skip_non_finite() {
        let mut rs = RunningStats::new();
        rs.extend(&[10.0, 20.0]);
        rs.push(f32::from_le_bytes([0x00, 0x00, 0x80, 0x7F]));
        rs.push(f32::NEG_INFINITY);
        rs.push(30.0);

        assert_eq!(rs.count(), 3);
        assert_eq!(rs.mean(), Some(20.0));
        assert!(rs.std_dev().is_finite());
        assert_eq!(rs.max(), Some(30.0));
    }

    #[test]
    fn test_running_stats() {
        let mut rs = RunningStats::new();
        assert_eq!(rs.mean(), None);
        assert_eq!(rs.variance(), 0.0);

        rs.extend(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(rs.count(), 8);
        assert!((rs.mean().unwrap() - 5.0).abs() < 1e-6);
        assert!((rs.variance() - 32.0 / 7.0).abs() < 1e-5);
        assert_eq!(rs.min(), Some(2.0));
        assert_eq!(rs.max(), Some(9.0));

        rs.reset();
        assert_eq!(rs.count(), 0);
        assert_eq!(rs.max(), None);
    }

    #[test]
    fn test_battery_estimate() {
        let est = BatteryEstimate::from_mean_current(1000.0, 40.0).unwrap();
        assert_eq!(est.hours, 25.0);
        assert_eq!(est.hours_minutes(), (25, 0));

        let est = BatteryEstimate::from_mean_current(100.0, 80.0).unwrap();
        assert_eq!(est.hours_minutes(), (1, 15));
    }

    #[test]
    fn test_battery_estimate_rejects_bad_input() {
        assert_eq!(BatteryEstimate::from_mean_current(1000.0, 0.0), None);
        assert_eq!(BatteryEstimate::from_mean_current(1000.0, -3.0), None);
        assert_eq!(BatteryEstimate::from_mean_current(0.0, 10.0), None);
        assert_eq!(BatteryEstimate::from_mean_current(1000.0, f32::NAN), None);
    }

    #[test]
    fn test_energy_wh() {
        assert_eq!(energy_wh(0.5, 4.0), 2.0);
    }
}
