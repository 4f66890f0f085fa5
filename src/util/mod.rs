//! Utilities shared by the estimators, benchmarks and fuzz targets.

/// A small, fast, seedable pseudo-random generator
///
/// This is splitmix64. It is not suitable for anything cryptographic; it is
/// here to drive skip list level assignment and to generate reproducible
/// sample streams in benchmarks and fuzz targets.
#[derive(Debug, Clone, Copy)]
pub struct Xorshift {
    seed: u64,
}

impl Xorshift {
    /// Create a generator from `seed`. Equal seeds give equal streams.
    pub fn new(seed: u64) -> Xorshift {
        Xorshift { seed }
    }

    /// Next 64 bits of the stream.
    pub fn next_u64(&mut self) -> u64 {
        // implementation inspired by
        // https://github.com/astocko/xorshift/blob/master/src/splitmix64.rs
        use std::num::Wrapping as w;

        let mut z = w(self.seed) + w(0x9E37_79B9_7F4A_7C15_u64);
        self.seed = z.0;
        z = (z ^ (z >> 30)) * w(0xBF58_476D_1CE4_E5B9_u64);
        z = (z ^ (z >> 27)) * w(0x94D0_49BB_1331_11EB_u64);
        (z ^ (z >> 31)).0
    }

    /// Next 32 bits of the stream.
    pub fn next_val(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// A uniformly distributed float in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}
