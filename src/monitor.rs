//! 'monitor' aggregates named performance metrics.
//!
//! Each label gets its own exponentially smoothed mean and deviation plus a
//! sliding window of recent samples for medians. Metrics spring into existence
//! the first time a label is sampled. All metrics sit behind one lock, so a
//! monitor can be shared between the threads producing samples and whoever
//! displays or logs the summaries.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::interval::{Clock, IntervalTimer, MonotonicClock};
use crate::smoothing::ExponentialSmoothing;
use crate::util::Xorshift;
use crate::window::WindowedQuantile;
use crate::{check_quantile, RunningQuantile};

/// Settings shared by every metric of a `PerformanceMonitor`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub struct MonitorConfig {
    /// Time constant of the exponential smoothing, in milliseconds.
    pub time_constant_ms: f64,
    /// Number of recent samples each metric keeps for quantiles.
    pub window: usize,
}

impl Default for MonitorConfig {
    fn default() -> MonitorConfig {
        MonitorConfig {
            time_constant_ms: 1000.0,
            window: 50,
        }
    }
}

/// A point-in-time view of one metric
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub struct MetricSummary {
    /// The metric's label.
    pub label: String,
    /// Samples recorded over the metric's lifetime.
    pub count: u64,
    /// Exponentially smoothed mean.
    pub mean: f64,
    /// Exponentially smoothed standard deviation.
    pub std_dev: f64,
    /// Median of the recent samples window.
    pub median: f64,
}

#[derive(Debug)]
struct Metric {
    stats: ExponentialSmoothing,
    recent: WindowedQuantile<Xorshift>,
    timer: IntervalTimer,
}

impl Metric {
    fn record(&mut self, value: f64, at: std::time::Duration) {
        self.stats.sample(value, at);
        self.recent.sample(value);
    }
}

/// Named metrics with smoothed statistics and running medians
///
/// # Examples
/// ```
/// use runquant::monitor::PerformanceMonitor;
///
/// let monitor = PerformanceMonitor::with_time_constant_ms(1000.0).unwrap();
/// monitor.sample("Grab schedule delay (ms)", 16.0);
/// monitor.sample("Grab schedule delay (ms)", 18.0);
///
/// let summaries = monitor.summaries();
/// assert_eq!(summaries.len(), 1);
/// assert_eq!(summaries[0].count, 2);
/// assert_eq!(summaries[0].median, 17.0);
/// ```
#[derive(Debug)]
pub struct PerformanceMonitor<C = MonotonicClock> {
    time_constant_ms: f64,
    window: NonZeroUsize,
    clock: C,
    metrics: Mutex<BTreeMap<String, Metric>>,
}

impl PerformanceMonitor<MonotonicClock> {
    /// Create a monitor from `config`
    ///
    /// # Errors
    /// Returns `Error::InvalidCapacity` when `config.window` is zero.
    pub fn new(config: MonitorConfig) -> Result<PerformanceMonitor<MonotonicClock>> {
        PerformanceMonitor::with_clock(config, MonotonicClock::new())
    }

    /// Create a monitor smoothing with `time_constant_ms` and keeping the
    /// default window of recent samples
    ///
    /// # Errors
    /// Same as `PerformanceMonitor::new`.
    pub fn with_time_constant_ms(time_constant_ms: f64) -> Result<PerformanceMonitor<MonotonicClock>> {
        PerformanceMonitor::new(MonitorConfig {
            time_constant_ms,
            ..MonitorConfig::default()
        })
    }
}

impl<C> PerformanceMonitor<C>
where
    C: Clock,
{
    /// Create a monitor from `config` that timestamps samples with `clock`
    ///
    /// # Errors
    /// Returns `Error::InvalidCapacity` when `config.window` is zero.
    pub fn with_clock(config: MonitorConfig, clock: C) -> Result<PerformanceMonitor<C>> {
        let window = NonZeroUsize::new(config.window).ok_or(Error::InvalidCapacity(config.window))?;
        Ok(PerformanceMonitor {
            time_constant_ms: config.time_constant_ms,
            window,
            clock,
            metrics: Mutex::new(BTreeMap::new()),
        })
    }

    /// Record `value` under `label`.
    pub fn sample(&self, label: &str, value: f64) {
        let now = self.clock.elapsed();
        let mut metrics = self.metrics.lock();
        self.metric(&mut metrics, label).record(value, now);
    }

    /// Record, under `label`, the milliseconds since the previous call with
    /// the same label. The first call for a label records nothing.
    pub fn sample_time_interval(&self, label: &str) {
        let now = self.clock.elapsed();
        let mut metrics = self.metrics.lock();
        let metric = self.metric(&mut metrics, label);
        match metric.timer.lap(now) {
            Some(ms) => metric.record(ms, now),
            None => tracing::trace!(label, "interval timer armed"),
        }
    }

    /// Interpolated quantile `q` of the recent samples of `label`, `None` if
    /// the label was never sampled
    ///
    /// # Errors
    /// Returns `Error::QuantileOutOfRange` when `q` is outside `[0, 1]`.
    pub fn quantile(&self, label: &str, q: f64) -> Result<Option<f64>> {
        check_quantile(q)?;
        let metrics = self.metrics.lock();
        match metrics.get(label) {
            Some(metric) => metric.recent.quantile(q).map(Some),
            None => Ok(None),
        }
    }

    /// Summaries of every metric, ordered by label.
    pub fn summaries(&self) -> Vec<MetricSummary> {
        let metrics = self.metrics.lock();
        metrics
            .iter()
            .map(|(label, metric)| MetricSummary {
                label: label.clone(),
                count: metric.stats.count(),
                mean: metric.stats.mean().unwrap_or(0.0),
                std_dev: metric.stats.std_dev().unwrap_or(0.0),
                median: metric.recent.quantile(0.5).unwrap_or(0.0),
            })
            .collect()
    }

    /// Labels of every metric, in order.
    pub fn labels(&self) -> Vec<String> {
        self.metrics.lock().keys().cloned().collect()
    }

    /// Number of metrics tracked.
    pub fn len(&self) -> usize {
        self.metrics.lock().len()
    }

    /// Whether no metric is tracked.
    pub fn is_empty(&self) -> bool {
        self.metrics.lock().is_empty()
    }

    /// Drop every metric.
    pub fn clear(&self) {
        self.metrics.lock().clear();
    }

    fn metric<'a>(&self, metrics: &'a mut BTreeMap<String, Metric>, label: &str) -> &'a mut Metric {
        let seed = metrics.len() as u64;
        let window = self.window;
        let time_constant_ms = self.time_constant_ms;
        metrics.entry(label.to_owned()).or_insert_with(|| {
            tracing::debug!(label, window = window.get(), "tracking new metric");
            Metric {
                stats: ExponentialSmoothing::new(time_constant_ms),
                recent: WindowedQuantile::with_capacity(window, Xorshift::new(seed)),
                timer: IntervalTimer::new(),
            }
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::interval::ManualClock;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn monitor(window: usize) -> (PerformanceMonitor<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let config = MonitorConfig {
            time_constant_ms: 100.0,
            window,
        };
        (PerformanceMonitor::with_clock(config, clock.clone()).unwrap(), clock)
    }

    #[test]
    fn rejects_empty_window() {
        let config = MonitorConfig {
            window: 0,
            ..MonitorConfig::default()
        };
        assert_eq!(
            PerformanceMonitor::new(config).unwrap_err(),
            Error::InvalidCapacity(0)
        );
    }

    #[test]
    fn time_constant_keeps_default_window() {
        let monitor = PerformanceMonitor::with_time_constant_ms(250.0).unwrap();
        for v in 0..60 {
            monitor.sample("m", f64::from(v));
        }
        // last 50 of 0..60
        assert_eq!(monitor.quantile("m", 0.0).unwrap(), Some(10.0));
        assert_eq!(monitor.quantile("m", 1.0).unwrap(), Some(59.0));
        assert_eq!(monitor.summaries()[0].count, 60);
    }

    #[test]
    fn metrics_created_lazily() {
        let (monitor, _) = monitor(4);
        assert!(monitor.is_empty());
        assert_eq!(monitor.quantile("b", 0.5).unwrap(), None);
        monitor.sample("b", 1.0);
        monitor.sample("a", 2.0);
        monitor.sample("b", 3.0);
        assert_eq!(monitor.labels(), vec!["a".to_owned(), "b".to_owned()]);
        assert_eq!(monitor.len(), 2);
        assert_eq!(monitor.quantile("b", 0.5).unwrap(), Some(2.0));
        assert!(monitor.quantile("b", 1.5).is_err());
        monitor.clear();
        assert!(monitor.is_empty());
    }

    #[test]
    fn summaries_cover_every_metric() {
        let (monitor, clock) = monitor(3);
        for v in &[5.0, 1.0, 3.0, 7.0] {
            monitor.sample("latency", *v);
            clock.advance(Duration::from_millis(10));
        }
        monitor.sample("other", 1.0);

        let summaries = monitor.summaries();
        assert_eq!(summaries.len(), 2);
        let latency = &summaries[0];
        assert_eq!(latency.label, "latency");
        assert_eq!(latency.count, 4);
        // window holds 1, 3, 7
        assert_eq!(latency.median, 3.0);
        assert!(latency.mean > 1.0 && latency.mean < 7.0);
        assert!(latency.std_dev > 0.0);

        let other = &summaries[1];
        assert_eq!(other.mean, 1.0);
        assert_eq!(other.std_dev, 0.0);
    }

    #[test]
    fn time_intervals_per_label() {
        let (monitor, clock) = monitor(8);
        monitor.sample_time_interval("frame");
        monitor.sample_time_interval("paint");
        assert_eq!(monitor.summaries()[0].count, 0);

        clock.advance(Duration::from_millis(16));
        monitor.sample_time_interval("frame");
        clock.advance(Duration::from_millis(4));
        monitor.sample_time_interval("paint");
        clock.advance(Duration::from_millis(18));
        monitor.sample_time_interval("frame");

        assert_eq!(monitor.quantile("frame", 0.0).unwrap(), Some(16.0));
        // the paint lap in between does not split the frame interval
        assert_eq!(monitor.quantile("frame", 1.0).unwrap(), Some(22.0));
        assert_eq!(monitor.quantile("paint", 0.5).unwrap(), Some(20.0));
    }

    #[test]
    fn shared_between_threads() {
        let monitor = Arc::new(PerformanceMonitor::with_time_constant_ms(50.0).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let monitor = Arc::clone(&monitor);
                thread::spawn(move || {
                    for i in 0..250 {
                        monitor.sample("shared", f64::from(t * 1000 + i));
                        monitor.sample_time_interval("ticks");
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let summaries = monitor.summaries();
        let shared = summaries.iter().find(|s| s.label == "shared").unwrap();
        assert_eq!(shared.count, 1000);
        let ticks = summaries.iter().find(|s| s.label == "ticks").unwrap();
        assert_eq!(ticks.count, 999);
    }
}
