#![no_main]
#[macro_use]
extern crate libfuzzer_sys;
extern crate byteorder;
extern crate runquant;

use byteorder::{BigEndian, ReadBytesExt};
use runquant::util::Xorshift;
use runquant::{BruteForceQuantile, RunningQuantile, WindowedQuantile};
use std::io::Cursor;

const QUANTILES: [f64; 7] = [0.0, 0.1, 0.25, 0.5, 0.75, 0.9, 1.0];

fuzz_target!(|data: &[u8]| {
    let mut cursor = Cursor::new(data);

    // bounded 2**10
    let capacity: usize = if let Ok(res) = cursor.read_u16::<BigEndian>() {
        usize::from(res % 1024) + 1
    } else {
        return;
    };
    // unbounded, drives the skip list's level decisions
    let seed: u64 = if let Ok(res) = cursor.read_u64::<BigEndian>() {
        res
    } else {
        return;
    };

    let mut window = WindowedQuantile::with_coin(capacity, Xorshift::new(seed)).unwrap();
    let mut brute = BruteForceQuantile::new(capacity).unwrap();
    while let Ok(val) = cursor.read_f64::<BigEndian>() {
        if !val.is_finite() {
            continue;
        }
        window.sample(val);
        brute.sample(val);
        assert_eq!(window.len(), brute.len());
        for q in &QUANTILES {
            let w = window.quantile(*q).unwrap();
            let b = brute.quantile(*q).unwrap();
            assert!(w == b, "q={} window={} brute={}", q, w, b);
        }
    }
    assert_eq!(window.recent(), brute.recent());
});
