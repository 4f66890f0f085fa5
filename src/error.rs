//! Errors signalled by the skip list and the estimators built on it.
//!
//! Every failure is local and synchronous. Nothing is retried and a failed
//! call leaves the structure exactly as it was.

use thiserror::Error;

/// Result type alias used throughout this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Logical errors raised by this crate
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A skip list needs at least one level.
    #[error("skip list needs at least one level, got {0}")]
    InvalidLevels(usize),

    /// A sliding window needs room for at least one sample.
    #[error("window capacity must be at least 1, got {0}")]
    InvalidCapacity(usize),

    /// Quantiles are only defined on `[0.0, 1.0]`.
    #[error("quantile {0} is outside of [0, 1]")]
    QuantileOutOfRange(f64),

    /// Delay limits must be positive and ordered.
    #[error("invalid delay limits: min {min_ms} ms, max {max_ms} ms")]
    InvalidDelayLimits {
        /// Configured shortest delay
        min_ms: f64,
        /// Configured longest delay
        max_ms: f64,
    },

    /// There is no oldest element to remove.
    #[error("no such element: container is empty")]
    Empty,

    /// A rank index, or the end of a requested run, lies past the last
    /// element.
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// Offending index
        index: usize,
        /// Number of elements stored at the time of the call
        len: usize,
    },
}
