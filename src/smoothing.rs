//! 'smoothing' keeps an exponentially weighted mean and variance of a
//! stream whose samples arrive at irregular times.
//!
//! The weight of a sample decays with the time since it arrived, not with the
//! number of samples that followed it. A sample that arrives `tau`
//! milliseconds after the previous one moves the mean `1 - 1/e` of the way
//! toward itself.

use std::time::Duration;

use crate::interval::as_millis_f64;

// Smallest time constant accepted. Anything at or below it makes each sample
// all but replace the mean.
const MIN_TIME_CONSTANT_MS: f64 = 1e-9;

/// Exponentially weighted mean and standard deviation
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use runquant::smoothing::ExponentialSmoothing;
///
/// let mut stats = ExponentialSmoothing::new(1000.0);
/// stats.sample(10.0, Duration::from_millis(0));
/// stats.sample(10.0, Duration::from_millis(500));
/// assert_eq!(stats.mean(), Some(10.0));
/// assert_eq!(stats.std_dev(), Some(0.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub struct ExponentialSmoothing {
    time_constant_ms: f64,
    mean: f64,
    variance: f64,
    count: u64,
    last_at: Option<Duration>,
}

impl ExponentialSmoothing {
    /// Create smoothing statistics with time constant `time_constant_ms`
    ///
    /// A time constant that is not a positive finite number is replaced by a
    /// vanishingly small one.
    pub fn new(time_constant_ms: f64) -> ExponentialSmoothing {
        let time_constant_ms = if time_constant_ms.is_finite() && time_constant_ms > MIN_TIME_CONSTANT_MS {
            time_constant_ms
        } else {
            MIN_TIME_CONSTANT_MS
        };
        ExponentialSmoothing {
            time_constant_ms,
            mean: 0.0,
            variance: 0.0,
            count: 0,
            last_at: None,
        }
    }

    /// Fold in `value`, observed at time `at` on some monotonic clock.
    pub fn sample(&mut self, value: f64, at: Duration) {
        self.count += 1;
        let prev = match self.last_at.replace(at) {
            None => {
                self.mean = value;
                self.variance = 0.0;
                return;
            }
            Some(prev) => prev,
        };
        let dt = as_millis_f64(at.saturating_sub(prev));
        let alpha = 1.0 - (-dt / self.time_constant_ms).exp();
        let diff = value - self.mean;
        let incr = alpha * diff;
        self.mean += incr;
        self.variance = (1.0 - alpha) * (self.variance + diff * incr);
    }

    /// The weighted mean, `None` before the first sample.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.mean)
        }
    }

    /// The weighted standard deviation, `None` before the first sample.
    pub fn std_dev(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.variance.max(0.0).sqrt())
        }
    }

    /// Number of samples folded in.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Whether no sample has been folded in.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The time constant in use, in milliseconds.
    pub fn time_constant_ms(&self) -> f64 {
        self.time_constant_ms
    }
}
