mod integration {
    mod window {
        extern crate rand;
        extern crate runquant;

        use self::rand::rngs::StdRng;
        use self::rand::{Rng, SeedableRng};
        use self::runquant::interval::{ManualClock, TimeIntervalQuantile};
        use self::runquant::skiplist::coin::{Always, Scripted};
        use self::runquant::{BruteForceQuantile, Error, RunningQuantile, WindowedQuantile};
        use std::time::Duration;

        const QUANTILES: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

        fn assert_agree<A, B>(window: &A, brute: &B)
        where
            A: RunningQuantile,
            B: RunningQuantile,
        {
            assert_eq!(window.len(), brute.len());
            for q in &QUANTILES {
                assert_eq!(
                    window.quantile(*q).unwrap(),
                    brute.quantile(*q).unwrap(),
                    "q = {}",
                    q
                );
            }
        }

        #[test]
        fn cross_validate_random_streams() {
            let mut rng = StdRng::seed_from_u64(0x00C0_FFEE);
            for _ in 0..50 {
                let capacity = rng.gen_range(1..=200);
                let mut window = WindowedQuantile::new(capacity).unwrap();
                let mut brute = BruteForceQuantile::new(capacity).unwrap();
                for _ in 0..(3 * capacity) {
                    let v: f64 = rng.gen_range(-1000.0..1000.0);
                    window.sample(v);
                    brute.sample(v);
                    assert_agree(&window, &brute);
                }
                assert_eq!(window.recent(), brute.recent());
            }
        }

        #[test]
        fn cross_validate_heavy_duplicates() {
            let mut rng = StdRng::seed_from_u64(7);
            let mut window = WindowedQuantile::new(37).unwrap();
            let mut brute = BruteForceQuantile::new(37).unwrap();
            for _ in 0..2000 {
                let v = f64::from(rng.gen_range(0..4u8));
                window.sample(v);
                brute.sample(v);
                assert_agree(&window, &brute);
            }
        }

        // Degenerate skip lists (a single linked list, or every node at full
        // height) answer exactly like balanced ones.
        #[test]
        fn cross_validate_degenerate_coins() {
            let mut rng = StdRng::seed_from_u64(42);
            let mut flat = WindowedQuantile::with_coin(64, Always::tails()).unwrap();
            let mut tall = WindowedQuantile::with_coin(64, Always::heads()).unwrap();
            let script: Vec<bool> = (0..10_000).map(|_| rng.gen()).collect();
            let mut scripted = WindowedQuantile::with_coin(64, Scripted::new(script)).unwrap();
            let mut brute = BruteForceQuantile::new(64).unwrap();
            for _ in 0..500 {
                let v = f64::from(rng.gen_range(-50i32..50));
                flat.sample(v);
                tall.sample(v);
                scripted.sample(v);
                brute.sample(v);
                assert_agree(&flat, &brute);
                assert_agree(&tall, &brute);
                assert_agree(&scripted, &brute);
            }
        }

        #[test]
        fn worked_example() {
            let mut window = WindowedQuantile::new(5).unwrap();
            let mut brute = BruteForceQuantile::new(5).unwrap();
            for v in &[3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0] {
                window.sample(*v);
                brute.sample(*v);
            }
            for estimator in &[&window as &dyn RunningQuantile, &brute] {
                assert_eq!(estimator.len(), 5);
                assert_eq!(estimator.capacity(), 5);
                assert_eq!(estimator.quantile(0.5).unwrap(), 5.0);
                assert_eq!(estimator.quantile(0.0).unwrap(), 1.0);
                assert_eq!(estimator.quantile(1.0).unwrap(), 9.0);
                assert_eq!(estimator.quantile(0.25).unwrap(), 2.0);
            }
            assert_eq!(window.quantile(1.01), Err(Error::QuantileOutOfRange(1.01)));
        }

        #[test]
        fn intervals_through_either_estimator() {
            let clock = ManualClock::new();
            let mut fast = TimeIntervalQuantile::with_clock(WindowedQuantile::new(16).unwrap(), &clock);
            let mut slow = TimeIntervalQuantile::with_clock(BruteForceQuantile::new(16).unwrap(), &clock);
            fast.sample();
            slow.sample();
            let mut rng = StdRng::seed_from_u64(99);
            for _ in 0..100 {
                clock.advance(Duration::from_micros(rng.gen_range(1_000..50_000)));
                fast.sample();
                slow.sample();
                for q in &QUANTILES {
                    assert_eq!(fast.quantile(*q).unwrap(), slow.quantile(*q).unwrap());
                }
            }
            assert_eq!(fast.len(), 16);
        }
    }
}
