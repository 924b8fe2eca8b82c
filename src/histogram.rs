//! # Histogram Module
//!
//! Adaptive histogram whose bucket edges follow a power law between the
//! observed minimum and maximum:
//!
//! ```text
//! edge[i] = min + (max - min) * (i / bins)^exponent     for i in 0..=bins
//! ```
//!
//! An exponent above 1 packs narrow buckets near `min`; below 1 packs them
//! near `max`; exactly 1 gives linear buckets.

use crate::timeseries::SampleSliceExt;

/// Bucket edges for `bins` buckets spanning `[min, max]`.
///
/// Returns `bins + 1` non-decreasing edges, or an empty vector when `bins` is 0
/// or either bound is not finite.
pub fn power_law_edges(min: f32, max: f32, bins: usize, exponent: f32) -> Vec<f32> {
    if bins == 0 || !min.is_finite() || !max.is_finite() {
        return Vec::new();
    }
    let (min, max) = if min <= max { (min, max) } else { (max, min) };
    let exponent = if exponent.is_finite() && exponent > 0.0 {
        exponent
    } else {
        1.0
    };

    let span = max - min;
    let mut edges: Vec<f32> = (0..=bins)
        .map(|i| {
            let position = i as f32 / bins as f32;
            min + span * position.powf(exponent)
        })
        .collect();
    // pin the ends so rounding never drops `max` out of the last bucket
    edges[0] = min;
    edges[bins] = max;
    edges
}

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    edges: Vec<f32>,
    counts: Vec<u32>,
}

impl Histogram {
    /// Bin a window of readings. NaN and infinite readings are skipped.
    pub fn from_samples(samples: &[f32], bins: usize, exponent: f32) -> Self {
        let finite: Vec<f32> = samples.iter().copied().filter(|v| v.is_finite()).collect();

        let Some((min, max)) = finite.min_max() else {
            return Self::empty();
        };
        if bins == 0 {
            return Self::empty();
        }

        if min == max {
            return Self {
                edges: vec![min, max],
                counts: vec![finite.len() as u32],
            };
        }

        let edges = power_law_edges(min, max, bins, exponent);
        let mut histogram = Self {
            counts: vec![0; edges.len() - 1],
            edges,
        };
        for value in finite {
            if let Some(bucket) = histogram.bucket_of(value) {
                histogram.counts[bucket] += 1;
            }
        }
        histogram
    }

    pub fn empty() -> Self {
        Self {
            edges: Vec::new(),
            counts: Vec::new(),
        }
    }

    pub fn edges(&self) -> &[f32] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    pub fn max_count(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// `(lower, upper, count)` per bucket
    pub fn buckets(&self) -> impl Iterator<Item = (f32, f32, u32)> + '_ {
        self.edges
            .windows(2)
            .zip(&self.counts)
            .map(|(edge, &count)| (edge[0], edge[1], count))
    }

    /// Index of the bucket holding `value`.
    ///
    /// Buckets are `[lower, upper)` except the last, which also takes `upper`.
    pub fn bucket_of(&self, value: f32) -> Option<usize> {
        let last = self.counts.len().checked_sub(1)?;
        let (&first_edge, &last_edge) = (self.edges.first()?, self.edges.last()?);
        if value.is_nan() || value < first_edge || value > last_edge {
            return None;
        }
        // number of edges <= value, minus one, is the bucket
        let idx = self.edges.partition_point(|&edge| edge <= value);
        Some(idx.saturating_sub(1).min(last))
    }
}
