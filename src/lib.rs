//! This crate provides exact running quantiles over a sliding window of the
//! most recent samples of a stream.
//!
//! Timing diagnostics want a rolling median, or some other quantile, of the
//! last few hundred samples without re-sorting the window on every query. The
//! window is kept in an indexable skip list that is ordered by value and also
//! threaded in arrival order, so the oldest sample can be evicted in O(log n)
//! regardless of where it sits in the value order and any order statistic can
//! be fetched in O(log n).
//!
//! # Examples
//!
//! ```
//! use runquant::{RunningQuantile, WindowedQuantile};
//!
//! let mut window = WindowedQuantile::new(5).unwrap();
//! for v in &[3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0] {
//!     window.sample(*v);
//! }
//! assert_eq!(window.quantile(0.5).unwrap(), 5.0);
//! assert_eq!(window.quantile(0.0).unwrap(), 1.0);
//! assert_eq!(window.quantile(1.0).unwrap(), 9.0);
//! ```
#![deny(missing_docs, missing_debug_implementations, unstable_features,
        unused_import_braces)]

#[cfg(test)]
#[macro_use]
extern crate quickcheck;

#[cfg(feature = "serde_support")]
#[macro_use]
extern crate serde_derive;

#[cfg(feature = "serde_support")]
extern crate serde;

pub mod brute;
pub mod error;
pub mod interval;
pub mod monitor;
pub mod pacing;
pub mod shared;
pub mod skiplist;
pub mod smoothing;
pub mod util;
pub mod window;

pub use brute::BruteForceQuantile;
pub use error::{Error, Result};
pub use interval::TimeIntervalQuantile;
pub use monitor::PerformanceMonitor;
pub use shared::SharedQuantile;
pub use skiplist::SkipList;
pub use window::WindowedQuantile;

/// A quantile estimator fed one sample at a time
///
/// Implementors keep some bounded view of the samples they have seen and
/// answer quantile queries over that view. Both the skip-list backed
/// `WindowedQuantile` and the sorting `BruteForceQuantile` implement this
/// trait, which is what lets `TimeIntervalQuantile` and `SharedQuantile` wrap
/// either of them.
pub trait RunningQuantile {
    /// Record a sample, possibly evicting the oldest retained one.
    fn sample(&mut self, value: f64);

    /// Query the linearly interpolated quantile `q` of the retained samples.
    ///
    /// `q` must lie in `[0.0, 1.0]`. An estimator holding no samples answers
    /// `0.0` for every valid `q`.
    fn quantile(&self, q: f64) -> Result<f64>;

    /// Number of samples currently retained.
    fn len(&self) -> usize;

    /// Maximum number of samples retained.
    fn capacity(&self) -> usize;

    /// Whether no samples are retained.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Check that `q` is a valid quantile argument.
pub(crate) fn check_quantile(q: f64) -> Result<()> {
    if q >= 0.0 && q <= 1.0 {
        Ok(())
    } else {
        Err(Error::QuantileOutOfRange(q))
    }
}

/// Linear interpolation between the order statistics bracketing
/// `q * (len - 1)`.
///
/// `fetch(floor)` must return the order statistic at rank `floor` and the one
/// after it, or only the one at `floor` when `floor` is the last rank. Both
/// estimators route through this function so their answers agree bit for bit.
pub(crate) fn interpolate<F>(q: f64, len: usize, fetch: F) -> Result<f64>
where
    F: FnOnce(usize) -> Result<(f64, Option<f64>)>,
{
    check_quantile(q)?;
    match len {
        0 => Ok(0.0),
        1 => fetch(0).map(|(v, _)| v),
        _ => {
            let real_index = q * ((len - 1) as f64);
            let floor = real_index.floor() as usize;
            match fetch(floor)? {
                (lo, Some(hi)) => {
                    let ceil = (floor + 1) as f64;
                    Ok((ceil - real_index) * lo + (real_index - floor as f64) * hi)
                }
                (lo, None) => Ok(lo),
            }
        }
    }
}
