use std::cmp::Ordering;
use std::fmt::Debug;

/// A totally ordered scalar usable as a skip list key
///
/// Floats are ordered by `total_cmp`, so NaN and signed zeroes have a fixed
/// place in the order rather than poisoning comparisons.
pub trait Key: Copy + Debug {
    /// Total order over keys.
    fn key_cmp(&self, other: &Self) -> Ordering;
}

macro_rules! ord_key {
    ($($t:ty),*) => {
        $(
            impl Key for $t {
                #[inline]
                fn key_cmp(&self, other: &$t) -> Ordering {
                    self.cmp(other)
                }
            }
        )*
    }
}

macro_rules! float_key {
    ($($t:ty),*) => {
        $(
            impl Key for $t {
                #[inline]
                fn key_cmp(&self, other: &$t) -> Ordering {
                    self.total_cmp(other)
                }
            }
        )*
    }
}

ord_key!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);
float_key!(f32, f64);
