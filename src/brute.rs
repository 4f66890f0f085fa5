//! 'brute' is the obviously correct way to compute a running quantile: keep
//! the last `capacity` samples in arrival order and sort a copy of them on
//! every query.
//!
//! It serves as the oracle the skip-list backed `WindowedQuantile` is checked
//! against. For very small windows it is also the cheaper of the two.

use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::{interpolate, RunningQuantile};

/// Running quantiles by sorting on every query
///
/// # Examples
/// ```
/// use runquant::{BruteForceQuantile, RunningQuantile};
///
/// let mut brute = BruteForceQuantile::new(5).unwrap();
/// for v in &[3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0] {
///     brute.sample(*v);
/// }
/// assert_eq!(brute.quantile(0.5).unwrap(), 5.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub struct BruteForceQuantile {
    capacity: usize,
    samples: VecDeque<f64>,
}

impl BruteForceQuantile {
    /// Create an estimator retaining the last `capacity` samples
    ///
    /// # Errors
    /// Returns `Error::InvalidCapacity` when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<BruteForceQuantile> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }
        Ok(BruteForceQuantile {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        })
    }

    /// The retained samples, oldest first.
    pub fn recent(&self) -> Vec<f64> {
        self.samples.iter().cloned().collect()
    }

    /// Forget every sample.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl RunningQuantile for BruteForceQuantile {
    fn sample(&mut self, value: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    fn quantile(&self, q: f64) -> Result<f64> {
        let mut sorted: Vec<f64> = self.samples.iter().cloned().collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        interpolate(q, sorted.len(), |floor| {
            Ok((sorted[floor], sorted.get(floor + 1).cloned()))
        })
    }

    fn len(&self) -> usize {
        self.samples.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}
