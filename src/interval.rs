//! 'interval' turns a stream of "it happened" events into a stream of
//! inter-event times, in milliseconds, fed to a quantile estimator.
//!
//! The estimator itself knows nothing about time. The time source is a
//! `Clock`, monotonic by default and hand-driven in tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::RunningQuantile;

/// A monotonic time source
pub trait Clock {
    /// Time elapsed since some fixed origin. Never decreases.
    fn elapsed(&self) -> Duration;
}

/// The system's monotonic clock
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// A clock whose origin is now.
    pub fn new() -> MonotonicClock {
        MonotonicClock {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> MonotonicClock {
        MonotonicClock::new()
    }
}

impl Clock for MonotonicClock {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A clock that only moves when told to
///
/// Clones share the same time, so a test can keep one handle and give the
/// other away.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use runquant::interval::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// let handle = clock.clone();
/// handle.advance(Duration::from_millis(5));
/// assert_eq!(clock.elapsed(), Duration::from_millis(5));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// A clock standing at its origin.
    pub fn new() -> ManualClock {
        ManualClock::default()
    }

    /// Move time forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

impl<'a, C: Clock + ?Sized> Clock for &'a C {
    fn elapsed(&self) -> Duration {
        (**self).elapsed()
    }
}

/// Milliseconds in `d`, with sub-millisecond precision.
pub fn as_millis_f64(d: Duration) -> f64 {
    d.as_secs() as f64 * 1000.0 + f64::from(d.subsec_nanos()) / 1_000_000.0
}

/// Measures the time between consecutive `lap` calls
#[derive(Debug, Clone, Default)]
pub struct IntervalTimer {
    last: Option<Duration>,
}

impl IntervalTimer {
    /// A timer that has seen no event yet.
    pub fn new() -> IntervalTimer {
        IntervalTimer::default()
    }

    /// Mark an event at `now`. Returns the milliseconds since the previous
    /// event, or `None` for the very first one.
    pub fn lap(&mut self, now: Duration) -> Option<f64> {
        let since = self.last.map(|prev| as_millis_f64(now.saturating_sub(prev)));
        self.last = Some(now);
        since
    }

    /// Forget the previous event.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Running quantiles of the time between events
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use runquant::WindowedQuantile;
/// use runquant::interval::{ManualClock, TimeIntervalQuantile};
///
/// let clock = ManualClock::new();
/// let window = WindowedQuantile::new(10).unwrap();
/// let mut intervals = TimeIntervalQuantile::with_clock(window, clock.clone());
///
/// intervals.sample();
/// for ms in &[10, 30, 20] {
///     clock.advance(Duration::from_millis(*ms));
///     intervals.sample();
/// }
/// assert_eq!(intervals.quantile(0.5).unwrap(), 20.0);
/// ```
#[derive(Debug)]
pub struct TimeIntervalQuantile<E, C = MonotonicClock> {
    estimator: E,
    clock: C,
    timer: IntervalTimer,
}

impl<E> TimeIntervalQuantile<E, MonotonicClock>
where
    E: RunningQuantile,
{
    /// Wrap `estimator`, timing events with the system's monotonic clock.
    pub fn new(estimator: E) -> TimeIntervalQuantile<E, MonotonicClock> {
        TimeIntervalQuantile::with_clock(estimator, MonotonicClock::new())
    }
}

impl<E, C> TimeIntervalQuantile<E, C>
where
    E: RunningQuantile,
    C: Clock,
{
    /// Wrap `estimator`, timing events with `clock`.
    pub fn with_clock(estimator: E, clock: C) -> TimeIntervalQuantile<E, C> {
        TimeIntervalQuantile {
            estimator,
            clock,
            timer: IntervalTimer::new(),
        }
    }

    /// Record that an event happened now
    ///
    /// The first event only starts the clock. Every later event feeds the
    /// milliseconds since the previous one to the wrapped estimator.
    pub fn sample(&mut self) {
        let now = self.clock.elapsed();
        match self.timer.lap(now) {
            Some(ms) => self.estimator.sample(ms),
            None => tracing::trace!("first event, interval timer armed"),
        }
    }

    /// Interpolated quantile `q` of the recorded intervals, in milliseconds.
    pub fn quantile(&self, q: f64) -> Result<f64> {
        self.estimator.quantile(q)
    }

    /// Number of intervals retained.
    pub fn len(&self) -> usize {
        self.estimator.len()
    }

    /// Whether no interval has been retained yet.
    pub fn is_empty(&self) -> bool {
        self.estimator.is_empty()
    }

    /// Forget the previous event, so the next `sample` only restarts the
    /// clock. Recorded intervals are kept.
    pub fn restart(&mut self) {
        self.timer.reset();
    }

    /// The wrapped estimator.
    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    /// The wrapped estimator, mutably.
    pub fn estimator_mut(&mut self) -> &mut E {
        &mut self.estimator
    }

    /// Unwrap the estimator.
    pub fn into_inner(self) -> E {
        self.estimator
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::brute::BruteForceQuantile;
    use crate::window::WindowedQuantile;

    #[test]
    fn first_event_only_arms() {
        let clock = ManualClock::new();
        let mut intervals =
            TimeIntervalQuantile::with_clock(WindowedQuantile::new(4).unwrap(), &clock);
        intervals.sample();
        assert!(intervals.is_empty());
        assert_eq!(intervals.quantile(0.5).unwrap(), 0.0);

        clock.advance(Duration::from_micros(2500));
        intervals.sample();
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals.quantile(0.5).unwrap(), 2.5);
    }

    #[test]
    fn window_of_intervals_slides() {
        let clock = ManualClock::new();
        let mut intervals =
            TimeIntervalQuantile::with_clock(BruteForceQuantile::new(3).unwrap(), clock.clone());
        intervals.sample();
        for ms in &[1, 2, 3, 4, 5] {
            clock.advance(Duration::from_millis(*ms));
            intervals.sample();
        }
        assert_eq!(intervals.estimator().recent(), vec![3.0, 4.0, 5.0]);
        assert_eq!(intervals.quantile(0.0).unwrap(), 3.0);
    }

    #[test]
    fn restart_skips_one_interval() {
        let clock = ManualClock::new();
        let mut intervals =
            TimeIntervalQuantile::with_clock(BruteForceQuantile::new(8).unwrap(), clock.clone());
        intervals.sample();
        clock.advance(Duration::from_millis(10));
        intervals.sample();
        intervals.restart();
        clock.advance(Duration::from_secs(60));
        intervals.sample();
        clock.advance(Duration::from_millis(12));
        intervals.sample();
        assert_eq!(intervals.into_inner().recent(), vec![10.0, 12.0]);
    }

    #[test]
    fn monotonic_clock_moves_forward() {
        let clock = MonotonicClock::new();
        let a = clock.elapsed();
        let b = clock.elapsed();
        assert!(b >= a);

        let mut intervals = TimeIntervalQuantile::new(WindowedQuantile::new(2).unwrap());
        intervals.sample();
        intervals.sample();
        assert!(intervals.quantile(1.0).unwrap() >= 0.0);
    }

    #[test]
    fn timer_laps() {
        let mut timer = IntervalTimer::new();
        assert_eq!(timer.lap(Duration::from_millis(3)), None);
        assert_eq!(timer.lap(Duration::from_millis(7)), Some(4.0));
        timer.reset();
        assert_eq!(timer.lap(Duration::from_millis(9)), None);
    }
}
