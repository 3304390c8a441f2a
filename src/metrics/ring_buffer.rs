//! Ring buffer for sparkline history.
//!
//! Each buffer keeps the last [`HISTORY_CAPACITY`] totals of one tracked
//! quantity, one sample per ingested batch. The oldest sample is evicted
//! once the buffer is full.

use std::collections::VecDeque;

/// Number of samples retained per tracked quantity.
pub const HISTORY_CAPACITY: usize = 30;

/// Bounded FIFO of per-batch totals, most recent last.
#[derive(Debug, Clone)]
pub struct TimeSeriesBuffer {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl Default for TimeSeriesBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSeriesBuffer {
    /// Create an empty buffer holding [`HISTORY_CAPACITY`] samples
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(HISTORY_CAPACITY + 1),
            capacity: HISTORY_CAPACITY,
        }
    }

    /// Append a sample, evicting the oldest one when full
    pub fn record(&mut self, value: f64) {
        self.samples.push_back(value);
        if self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Current samples in arrival order
    pub fn samples(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }

    /// Iterate samples without copying them out
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    /// Most recently recorded sample
    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    /// Get current number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Get buffer capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every sample
    pub fn reset(&mut self) {
        self.samples.clear();
    }
}
