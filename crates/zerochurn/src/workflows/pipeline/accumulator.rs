use serde::{Deserialize, Serialize};

/// Streaming count, total, mean, and variance.
///
/// The mean is updated incrementally (Welford) so long runs do not drift the way recomputing
/// `(mean * count + value) / (count + 1)` does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningStats {
    count: u64,
    total: f64,
    mean: f64,
    /// Sum of squared deviations; carried so a deserialized accumulator keeps its variance.
    #[serde(default)]
    m2: f64,
}

impl RunningStats {
    pub fn add(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }

        self.count += 1;
        self.total += value;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance; zero until two values have been added.
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }
}

impl FromIterator<f64> for RunningStats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = Self::default();
        for value in iter {
            stats.add(value);
        }
        stats
    }
}
