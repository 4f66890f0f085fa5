//! 'shared' lets several threads feed and query one estimator.
//!
//! A single lock guards the whole estimator, for samples and queries alike.
//! Critical sections are one insertion or one rank lookup, so contention
//! stays low at diagnostic sampling rates.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::RunningQuantile;

/// A cloneable handle to an estimator behind one lock
///
/// # Examples
/// ```
/// use std::thread;
/// use runquant::{SharedQuantile, WindowedQuantile};
///
/// let shared = SharedQuantile::new(WindowedQuantile::new(100).unwrap());
/// let producer = shared.clone();
/// thread::spawn(move || {
///     for v in 0..10 {
///         producer.sample(f64::from(v));
///     }
/// })
/// .join()
/// .unwrap();
/// assert_eq!(shared.len(), 10);
/// assert_eq!(shared.quantile(0.5).unwrap(), 4.5);
/// ```
#[derive(Debug)]
pub struct SharedQuantile<E> {
    inner: Arc<Mutex<E>>,
}

impl<E> Clone for SharedQuantile<E> {
    fn clone(&self) -> SharedQuantile<E> {
        SharedQuantile {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> SharedQuantile<E>
where
    E: RunningQuantile,
{
    /// Put `estimator` behind a lock.
    pub fn new(estimator: E) -> SharedQuantile<E> {
        SharedQuantile {
            inner: Arc::new(Mutex::new(estimator)),
        }
    }

    /// Record a sample.
    pub fn sample(&self, value: f64) {
        self.inner.lock().sample(value);
    }

    /// Interpolated quantile `q` of the retained samples.
    pub fn quantile(&self, q: f64) -> Result<f64> {
        self.inner.lock().quantile(q)
    }

    /// Number of samples retained.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether no sample is retained.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Run `f` with exclusive access to the estimator, e.g. to take several
    /// quantiles of the same window.
    pub fn with_lock<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut E) -> T,
    {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }
}
