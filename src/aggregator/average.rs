//! Running min/max/mean statistic over duration samples.

use serde::{Deserialize, Serialize};

/// Accumulated timing statistic for one stage position across runs.
///
/// The mean is maintained incrementally (`avg += (sample - avg) / n`), so the
/// accumulator stays O(1) regardless of the window size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageTime {
    pub min_nanos: u64,
    pub max_nanos: u64,
    pub average_nanos: f64,
    /// How many samples have been folded in
    pub measurement_counter: u32,
}

impl AverageTime {
    /// Starts a statistic from its first sample
    pub fn from_sample(nanos: u64) -> Self {
        Self {
            min_nanos: nanos,
            max_nanos: nanos,
            average_nanos: nanos as f64,
            measurement_counter: 1,
        }
    }

    /// Folds one more sample into the statistic
    pub fn record(&mut self, nanos: u64) {
        self.min_nanos = self.min_nanos.min(nanos);
        self.max_nanos = self.max_nanos.max(nanos);
        self.measurement_counter += 1;
        self.average_nanos +=
            (nanos as f64 - self.average_nanos) / f64::from(self.measurement_counter);
    }
}
