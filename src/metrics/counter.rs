//! Reset-aware accumulator for cumulative OTLP counters.
//!
//! A cumulative counter only grows while its source process lives and
//! starts again near zero when that process restarts. Any drop in the raw
//! value is treated as such a restart: the last raw value is folded into
//! the base so the reported total keeps growing.

/// Running total of one cumulative counter across source restarts.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CumulativeCounter {
    last_raw_value: f64,
    accumulated_before_reset: f64,
}

impl CumulativeCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a newly reported raw value.
    ///
    /// Returns `true` when the value was lower than the previous one and
    /// was therefore treated as a counter reset. Equal values are not a
    /// reset.
    pub fn update(&mut self, raw_value: f64) -> bool {
        let reset = raw_value < self.last_raw_value;
        if reset {
            self.accumulated_before_reset += self.last_raw_value;
        }
        self.last_raw_value = raw_value;
        reset
    }

    /// Total across every observed source lifetime.
    pub fn total(&self) -> f64 {
        self.accumulated_before_reset + self.last_raw_value
    }

    /// Most recent raw value reported by the source.
    pub fn last_raw_value(&self) -> f64 {
        self.last_raw_value
    }

    pub fn reset(&mut self) {
        self.last_raw_value = 0.0;
        self.accumulated_before_reset = 0.0;
    }
}
