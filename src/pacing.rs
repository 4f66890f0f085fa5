//! 'pacing' schedules camera grabs in a live preview so that frames are not
//! grabbed faster than they can be displayed.
//!
//! The pacer watches the time between displayed frames and takes a low
//! quantile of it as the display interval. The next grab is delayed by the
//! longer of exposure and display interval, minus whatever time has already
//! passed since the previous grab, clipped to a sane range.

use crate::error::{Error, Result};
use crate::interval::{Clock, MonotonicClock, TimeIntervalQuantile};
use crate::window::WindowedQuantile;
use crate::check_quantile;

/// Limits and estimator settings of a `FramePacer`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub struct PacingConfig {
    /// Shortest delay ever scheduled, in milliseconds.
    pub min_delay_ms: f64,
    /// Longest delay scheduled before it gets split, in milliseconds.
    pub max_delay_ms: f64,
    /// Quantile of the display intervals taken as the display interval.
    pub quantile: f64,
    /// Number of recent display intervals considered.
    pub window: usize,
}

impl Default for PacingConfig {
    fn default() -> PacingConfig {
        PacingConfig {
            min_delay_ms: 1000.0 / 60.0,
            max_delay_ms: 300.0,
            quantile: 0.25,
            window: 50,
        }
    }
}

/// Milliseconds to wait before the next grab
///
/// The wait covers the longer of `exposure_ms` and `display_interval_ms`,
/// less `already_elapsed_ms`, and is never shorter than
/// `config.min_delay_ms`. A wait longer than `config.max_delay_ms` is divided
/// into the fewest equal parts that each fit, and the first part returned, so
/// that slow streams still refresh at least every `max_delay_ms`.
///
/// # Examples
/// ```
/// use runquant::pacing::{grab_delay_ms, PacingConfig};
///
/// let config = PacingConfig::default();
/// assert_eq!(grab_delay_ms(&config, 100.0, 40.0, 20.0), 80);
/// assert_eq!(grab_delay_ms(&config, 1000.0, 0.0, 0.0), 250);
/// assert_eq!(grab_delay_ms(&config, 1.0, 0.0, 0.0), 17);
/// ```
pub fn grab_delay_ms(
    config: &PacingConfig,
    exposure_ms: f64,
    display_interval_ms: f64,
    already_elapsed_ms: f64,
) -> u64 {
    let mut delay = exposure_ms.max(display_interval_ms) - already_elapsed_ms;
    delay = delay.max(config.min_delay_ms);
    if delay > config.max_delay_ms {
        let parts = (delay / config.max_delay_ms).ceil();
        tracing::trace!(delay, parts, "grab delay split");
        delay /= parts;
    }
    delay.round() as u64
}

/// Paces grabs against the observed display rate
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use runquant::interval::ManualClock;
/// use runquant::pacing::{FramePacer, PacingConfig};
///
/// let clock = ManualClock::new();
/// let mut pacer = FramePacer::with_clock(PacingConfig::default(), clock.clone()).unwrap();
/// for _ in 0..10 {
///     pacer.frame_displayed();
///     clock.advance(Duration::from_millis(40));
/// }
/// assert_eq!(pacer.display_interval_ms(), 40.0);
/// assert_eq!(pacer.next_grab_delay_ms(10.0, 0.0), 40);
/// ```
#[derive(Debug)]
pub struct FramePacer<C = MonotonicClock> {
    config: PacingConfig,
    intervals: TimeIntervalQuantile<WindowedQuantile, C>,
}

impl FramePacer<MonotonicClock> {
    /// Create a pacer timing displayed frames with the system clock
    ///
    /// # Errors
    /// Returns `Error::InvalidCapacity` when `config.window` is zero,
    /// `Error::QuantileOutOfRange` when `config.quantile` is outside `[0, 1]`
    /// and `Error::InvalidDelayLimits` unless
    /// `0 < config.max_delay_ms` and `config.min_delay_ms <= config.max_delay_ms`.
    pub fn new(config: PacingConfig) -> Result<FramePacer<MonotonicClock>> {
        FramePacer::with_clock(config, MonotonicClock::new())
    }
}

impl<C> FramePacer<C>
where
    C: Clock,
{
    /// Create a pacer timing displayed frames with `clock`
    ///
    /// # Errors
    /// Same as `FramePacer::new`.
    pub fn with_clock(config: PacingConfig, clock: C) -> Result<FramePacer<C>> {
        check_quantile(config.quantile)?;
        // NaN limits fail both comparisons
        if !(config.max_delay_ms > 0.0 && config.min_delay_ms <= config.max_delay_ms) {
            return Err(Error::InvalidDelayLimits {
                min_ms: config.min_delay_ms,
                max_ms: config.max_delay_ms,
            });
        }
        let window = WindowedQuantile::new(config.window)?;
        Ok(FramePacer {
            config,
            intervals: TimeIntervalQuantile::with_clock(window, clock),
        })
    }

    /// Record that a frame reached the screen now.
    pub fn frame_displayed(&mut self) {
        self.intervals.sample();
    }

    /// The configured quantile of recent display intervals, `0.0` until two
    /// frames have been displayed.
    pub fn display_interval_ms(&self) -> f64 {
        // quantile was validated at construction
        self.intervals.quantile(self.config.quantile).unwrap_or(0.0)
    }

    /// Milliseconds to wait before the next grab, given the camera exposure
    /// and the time already spent since the previous grab.
    pub fn next_grab_delay_ms(&self, exposure_ms: f64, already_elapsed_ms: f64) -> u64 {
        grab_delay_ms(
            &self.config,
            exposure_ms,
            self.display_interval_ms(),
            already_elapsed_ms,
        )
    }

    /// Forget the display history, e.g. when the preview window is reopened.
    pub fn reset(&mut self) {
        tracing::debug!(
            intervals = self.intervals.len(),
            "resetting display interval estimate"
        );
        self.intervals.restart();
        self.intervals.estimator_mut().clear();
    }

    /// The pacing limits in use.
    pub fn config(&self) -> &PacingConfig {
        &self.config
    }

    /// Number of display intervals retained.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Whether no display interval is retained.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}
