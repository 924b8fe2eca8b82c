use std::collections::VecDeque;

/// Fixed-capacity FIFO of readings. New batches push the oldest readings out.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    data: VecDeque<f32>,
    capacity: usize,
}

pub trait SampleSliceExt {
    fn min_max(&self) -> Option<(f32, f32)>;
}

impl SampleSliceExt for [f32] {
    /// Bounds of the finite readings
    fn min_max(&self) -> Option<(f32, f32)> {
        self.iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((min, max)) => Some((min.min(v), max.max(v))),
            })
    }
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn last(&self) -> Option<f32> {
        self.data.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.data.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Append a batch in arrival order, then trim from the front
    pub fn extend(&mut self, batch: &[f32]) {
        // Only the tail of an oversized batch can survive
        let skip = batch.len().saturating_sub(self.capacity);
        self.data.extend(batch[skip..].iter().copied());
        self.trim();
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.trim();
    }

    pub fn min_max(&self) -> Option<(f32, f32)> {
        let (front, back) = self.data.as_slices();
        front
            .min_max()
            .into_iter()
            .chain(back.min_max())
            .reduce(|(a_min, a_max), (b_min, b_max)| (a_min.min(b_min), a_max.max(b_max)))
    }

    fn trim(&mut self) {
        let overflow = self.data.len().saturating_sub(self.capacity);
        if overflow > 0 {
            self.data.drain(..overflow);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_within_capacity() {
        let mut buf = SampleBuffer::new(5);
        buf.extend(&[1.0, 2.0]);
        buf.extend(&[3.0]);
        assert_eq!(buf.to_vec(), vec![1.0, 2.0, 3.0]);
        assert_eq!(buf.last(), Some(3.0));
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let mut buf = SampleBuffer::new(4);
        buf.extend(&[1.0, 2.0, 3.0]);
        buf.extend(&[4.0, 5.0, 6.0]);
        assert_eq!(buf.to_vec(), vec![3.0, 4.0, 5.0, 6.0]);
        assert_eq!(buf.len(), buf.capacity());
    }

    #[test]
    fn test_batch_larger_than_capacity_keeps_tail() {
        let mut buf = SampleBuffer::new(3);
        buf.extend(&[9.0]);
        buf.extend(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(buf.to_vec(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_shrinking_capacity_trims_front() {
        let mut buf = SampleBuffer::new(5);
        buf.extend(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        buf.set_capacity(2);
        assert_eq!(buf.to_vec(), vec![4.0, 5.0]);
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let mut buf = SampleBuffer::new(0);
        buf.extend(&[1.0, 2.0]);
        assert_eq!(buf.capacity(), 1);
        assert_eq!(buf.to_vec(), vec![2.0]);
    }

    #[test]
    fn test_min_max_skips_non_finite() {
        let mut buf = SampleBuffer::new(10);
        assert_eq!(buf.min_max(), None);
        buf.extend(&[3.0, f32::NAN, -1.0, f32::INFINITY, 7.5, f32::NEG_INFINITY]);
        assert_eq!(buf.min_max(), Some((-1.0, 7.5)));

        let only_inf: &[f32] = &[f32::INFINITY];
        assert_eq!(only_inf.min_max(), None);
    }

    #[test]
    fn test_min_max_after_wraparound() {
        let mut buf = SampleBuffer::new(3);
        buf.extend(&[10.0, 20.0, 30.0]);
        buf.extend(&[-5.0]);
        assert_eq!(buf.min_max(), Some((-5.0, 30.0)));
    }
}
