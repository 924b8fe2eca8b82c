//! # Decimation Module
//!
//! Batch-level sample-rate reduction. Keeping only every Nth notification batch
//! stretches the time window a fixed-size buffer covers without touching the
//! values that are kept.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How many incoming batches map to one kept batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Stride {
    #[default]
    One,
    Ten,
    Hundred,
}

impl Stride {
    pub const ALL: [Stride; 3] = [Stride::One, Stride::Ten, Stride::Hundred];

    pub fn as_usize(self) -> usize {
        match self {
            Stride::One => 1,
            Stride::Ten => 10,
            Stride::Hundred => 100,
        }
    }
}

impl fmt::Display for Stride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1/{}", self.as_usize())
    }
}

impl TryFrom<u32> for Stride {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Stride::One),
            10 => Ok(Stride::Ten),
            100 => Ok(Stride::Hundred),
            other => Err(format!("unsupported stride {}, expected 1, 10 or 100", other)),
        }
    }
}

impl From<Stride> for u32 {
    fn from(stride: Stride) -> Self {
        stride.as_usize() as u32
    }
}

/// Per-stream batch counter
#[derive(Debug, Clone)]
pub struct Decimator {
    stride: Stride,
    counter: usize,
}

impl Decimator {
    pub fn new(stride: Stride) -> Self {
        Self { stride, counter: 0 }
    }

    pub fn stride(&self) -> Stride {
        self.stride
    }

    /// Change the stride. The next batch is always kept.
    pub fn set_stride(&mut self, stride: Stride) {
        self.stride = stride;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.counter = 0;
    }

    /// Call once per incoming batch; returns whether to keep it
    pub fn admit(&mut self) -> bool {
        let keep = self.counter == 0;
        self.counter = (self.counter + 1) % self.stride.as_usize();
        keep
    }
}

impl Default for Decimator {
    fn default() -> Self {
        Self::new(Stride::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kept(decimator: &mut Decimator, batches: usize) -> Vec<usize> {
        (0..batches).filter(|_| decimator.admit()).collect()
    }

    #[test]
    fn test_stride_one_keeps_everything() {
        let mut d = Decimator::new(Stride::One);
        assert_eq!(kept(&mut d, 5), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_stride_ten_keeps_every_tenth() {
        let mut d = Decimator::new(Stride::Ten);
        assert_eq!(kept(&mut d, 25), vec![0, 10, 20]);
    }

    #[test]
    fn test_stride_hundred() {
        let mut d = Decimator::new(Stride::Hundred);
        assert_eq!(kept(&mut d, 250).len(), 3);
    }

    #[test]
    fn test_set_stride_restarts_counter() {
        let mut d = Decimator::new(Stride::Ten);
        assert!(d.admit());
        assert!(!d.admit());
        d.set_stride(Stride::Ten);
        assert!(d.admit());
        assert_eq!(d.stride(), Stride::Ten);
    }

    #[test]
    fn test_stride_conversions() {
        assert_eq!(Stride::try_from(10), Ok(Stride::Ten));
        assert!(Stride::try_from(3).is_err());
        assert_eq!(u32::from(Stride::Hundred), 100);
        assert_eq!(Stride::Ten.to_string(), "1/10");
    }
}
