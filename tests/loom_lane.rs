#![cfg(feature = "loom_test")]

//! Exhaustive interleaving checks over `LaneCounter`'s CAS-retry release
//! loop. Run with:
//!
//!     LOOM_MAX_PREEMPTIONS=3 cargo test --release --features loom_test --test loom_lane

use std::sync::Arc;

use laned_core::LaneCounter;
use loom::thread;

#[test]
fn counter_never_underflows_under_concurrent_release() {
    loom::model(|| {
        let counter = Arc::new(LaneCounter::new());
        counter.acquire();
        counter.acquire();

        let a = {
            let counter = Arc::clone(&counter);
            thread::spawn(move || counter.release())
        };
        let b = {
            let counter = Arc::clone(&counter);
            thread::spawn(move || counter.release())
        };

        let (va, _) = a.join().unwrap();
        let (vb, _) = b.join().unwrap();

        assert!(counter.load() >= 0);
        assert!(va >= 0 && vb >= 0);
    });
}

#[test]
fn concurrent_acquire_and_release_conserve_the_count() {
    loom::model(|| {
        let counter = Arc::new(LaneCounter::new());

        let acquirer = {
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                counter.acquire();
            })
        };
        counter.acquire();

        acquirer.join().unwrap();
        let (after_first_release, _) = counter.release();
        assert!(after_first_release >= 0);
        let (after_second_release, _) = counter.release();
        assert_eq!(after_second_release, 0);
    });
}
