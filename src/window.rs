//! 'window' keeps the most recent `capacity` samples of a stream ordered by
//! value, answering exact interpolated quantiles over them.
//!
//! Every sample costs one skip list insertion and, once the window is full,
//! one eviction of the oldest sample. A query costs one rank lookup. Nothing
//! is ever re-sorted.

use std::num::NonZeroUsize;

use crate::error::{Error, Result};
use crate::skiplist::coin::Coin;
use crate::skiplist::{SkipList, DEFAULT_MAX_LEVELS};
use crate::util::Xorshift;
use crate::{interpolate, RunningQuantile};

const DEFAULT_SEED: u64 = 0x5EED;

/// Number of skip list levels that keeps a window of `capacity` samples
/// balanced: ⌈log2(capacity)⌉ + 1, clamped to `[1, DEFAULT_MAX_LEVELS]`.
pub fn levels_for(capacity: usize) -> usize {
    if capacity <= 1 {
        return 1;
    }
    let bits = (usize::BITS - (capacity - 1).leading_zeros()) as usize;
    (bits + 1).min(DEFAULT_MAX_LEVELS)
}

/// Exact running quantiles over a sliding window of samples
///
/// # Examples
/// ```
/// use runquant::{RunningQuantile, WindowedQuantile};
///
/// let mut window = WindowedQuantile::new(3).unwrap();
/// assert_eq!(window.quantile(0.5).unwrap(), 0.0);
///
/// window.sample(10.0);
/// window.sample(20.0);
/// assert_eq!(window.quantile(0.5).unwrap(), 15.0);
///
/// window.sample(30.0);
/// window.sample(40.0); // 10.0 falls out of the window
/// assert_eq!(window.len(), 3);
/// assert_eq!(window.quantile(0.0).unwrap(), 20.0);
/// ```
#[derive(Debug)]
pub struct WindowedQuantile<C = Xorshift> {
    capacity: usize,
    samples: SkipList<f64, (), C>,
}

impl WindowedQuantile<Xorshift> {
    /// Create a window retaining the last `capacity` samples
    ///
    /// # Errors
    /// Returns `Error::InvalidCapacity` when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<WindowedQuantile<Xorshift>> {
        WindowedQuantile::with_coin(capacity, Xorshift::new(DEFAULT_SEED))
    }
}

impl<C> WindowedQuantile<C>
where
    C: Coin,
{
    /// Create a window retaining the last `capacity` samples whose skip list
    /// takes its level decisions from `coin`
    ///
    /// # Errors
    /// Returns `Error::InvalidCapacity` when `capacity` is zero.
    pub fn with_coin(capacity: usize, coin: C) -> Result<WindowedQuantile<C>> {
        match NonZeroUsize::new(capacity) {
            Some(capacity) => Ok(WindowedQuantile::with_capacity(capacity, coin)),
            None => Err(Error::InvalidCapacity(capacity)),
        }
    }

    /// Create a window retaining the last `capacity` samples whose skip list
    /// takes its level decisions from `coin`.
    pub fn with_capacity(capacity: NonZeroUsize, coin: C) -> WindowedQuantile<C> {
        let levels = NonZeroUsize::new(levels_for(capacity.get())).unwrap_or(NonZeroUsize::MIN);
        WindowedQuantile {
            capacity: capacity.get(),
            samples: SkipList::with_levels(levels, coin),
        }
    }

    /// The retained samples, smallest first.
    pub fn sorted(&self) -> Vec<f64> {
        self.samples.iter().map(|(v, _)| v).collect()
    }

    /// The retained samples, oldest first.
    pub fn recent(&self) -> Vec<f64> {
        self.samples.arrivals().map(|(v, _)| v).collect()
    }

    /// Forget every sample.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// The underlying skip list.
    pub fn skiplist(&self) -> &SkipList<f64, (), C> {
        &self.samples
    }
}

impl<C> RunningQuantile for WindowedQuantile<C>
where
    C: Coin,
{
    fn sample(&mut self, value: f64) {
        self.samples.insert(value, ());
        if self.samples.len() > self.capacity {
            // cannot be empty, we just inserted
            if let Err(e) = self.samples.remove_oldest() {
                debug_assert!(false, "eviction from a full window failed: {}", e);
            }
        }
    }

    fn quantile(&self, q: f64) -> Result<f64> {
        let samples = &self.samples;
        interpolate(q, samples.len(), |floor| {
            if floor + 1 < samples.len() {
                let pair = samples.sublist(floor, 2)?;
                Ok((pair[0].0, Some(pair[1].0)))
            } else {
                samples.get(floor).map(|(v, _)| (v, None))
            }
        })
    }

    fn len(&self) -> usize {
        self.samples.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::brute::BruteForceQuantile;
    use quickcheck::{QuickCheck, TestResult};

    #[test]
    fn level_sizing() {
        assert_eq!(levels_for(0), 1);
        assert_eq!(levels_for(1), 1);
        assert_eq!(levels_for(2), 2);
        assert_eq!(levels_for(5), 4);
        assert_eq!(levels_for(8), 4);
        assert_eq!(levels_for(9), 5);
        assert_eq!(levels_for(usize::max_value()), DEFAULT_MAX_LEVELS);
    }

    #[test]
    fn zero_capacity_rejected() {
        assert_eq!(
            WindowedQuantile::new(0).unwrap_err(),
            Error::InvalidCapacity(0)
        );
    }

    #[test]
    fn concrete_window() {
        let mut window = WindowedQuantile::new(5).unwrap();
        for v in &[3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0] {
            window.sample(*v);
            window.samples.check_invariants();
        }
        assert_eq!(window.recent(), vec![1.0, 5.0, 9.0, 2.0, 6.0]);
        assert_eq!(window.sorted(), vec![1.0, 2.0, 5.0, 6.0, 9.0]);
        assert_eq!(window.quantile(0.5).unwrap(), 5.0);
        assert_eq!(window.quantile(0.0).unwrap(), 1.0);
        assert_eq!(window.quantile(1.0).unwrap(), 9.0);
        assert_eq!(window.quantile(0.25).unwrap(), 2.0);
        assert_eq!(window.quantile(0.125).unwrap(), 1.5);
    }

    #[test]
    fn degenerate_windows() {
        let mut window = WindowedQuantile::new(4).unwrap();
        for q in &[0.0, 0.3, 1.0] {
            assert_eq!(window.quantile(*q).unwrap(), 0.0);
        }
        window.sample(-2.5);
        for q in &[0.0, 0.3, 1.0] {
            assert_eq!(window.quantile(*q).unwrap(), -2.5);
        }
    }

    #[test]
    fn rejects_bad_quantiles() {
        let mut window = WindowedQuantile::new(4).unwrap();
        window.sample(1.0);
        for q in &[-0.1, 1.1, std::f64::NAN] {
            assert!(match window.quantile(*q) {
                Err(Error::QuantileOutOfRange(_)) => true,
                _ => false,
            });
        }
        // state untouched
        assert_eq!(window.len(), 1);
        assert_eq!(window.quantile(0.5).unwrap(), 1.0);
    }

    #[test]
    fn capacity_one_tracks_last_sample() {
        let mut window = WindowedQuantile::new(1).unwrap();
        for v in 0..100 {
            window.sample(f64::from(v));
            assert_eq!(window.len(), 1);
            assert_eq!(window.quantile(0.7).unwrap(), f64::from(v));
        }
    }

    #[test]
    fn eviction_follows_arrival_not_value() {
        let mut window = WindowedQuantile::new(3).unwrap();
        for v in &[9.0, 1.0, 5.0, 9.0, 0.0] {
            window.sample(*v);
            window.samples.check_invariants();
            assert!(window.len() <= 3);
        }
        assert_eq!(window.recent(), vec![5.0, 9.0, 0.0]);
        assert_eq!(window.skiplist().oldest().map(|(k, _)| k), Some(5.0));
        assert_eq!(window.quantile(0.5).unwrap(), 5.0);
    }

    #[test]
    fn clear_empties_window() {
        let mut window = WindowedQuantile::new(3).unwrap();
        window.sample(1.0);
        window.sample(2.0);
        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.quantile(0.5).unwrap(), 0.0);
    }

    // The window holds exactly the last `capacity` samples.
    #[test]
    fn window_bound() {
        fn inner(data: Vec<i16>, capacity: usize) -> TestResult {
            let capacity = capacity % 64;
            if capacity == 0 {
                return TestResult::discard();
            }
            let mut window = WindowedQuantile::new(capacity).unwrap();
            for d in &data {
                window.sample(f64::from(*d));
                assert!(window.len() <= capacity);
            }
            window.samples.check_invariants();

            let skip = data.len().saturating_sub(capacity);
            let expected: Vec<f64> = data[skip..].iter().map(|d| f64::from(*d)).collect();
            let mut expected_sorted = expected.clone();
            expected_sorted.sort_by(|a, b| a.total_cmp(b));

            TestResult::from_bool(window.recent() == expected && window.sorted() == expected_sorted)
        }
        QuickCheck::new().quickcheck(inner as fn(Vec<i16>, usize) -> TestResult);
    }

    #[test]
    fn agrees_with_brute_force() {
        fn inner(data: Vec<f64>, capacity: usize) -> TestResult {
            let capacity = capacity % 200 + 1;
            let mut window = WindowedQuantile::new(capacity).unwrap();
            let mut brute = BruteForceQuantile::new(capacity).unwrap();
            for d in data.into_iter().filter(|d| d.is_finite()) {
                window.sample(d);
                brute.sample(d);
                for q in &[0.0, 0.25, 0.5, 0.75, 1.0] {
                    let w = window.quantile(*q).unwrap();
                    let b = brute.quantile(*q).unwrap();
                    if w != b {
                        return TestResult::error(format!("q={} window={} brute={}", q, w, b));
                    }
                }
            }
            TestResult::passed()
        }
        QuickCheck::new().quickcheck(inner as fn(Vec<f64>, usize) -> TestResult);
    }
}
