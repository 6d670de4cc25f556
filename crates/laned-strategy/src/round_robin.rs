use std::sync::atomic::{AtomicI32, Ordering};

use laned_core::SelectionStrategy;

/// Wait-free round-robin selection. A single shared counter advances on
/// every call; the returned index is the counter's value modulo `n`.
///
/// The counter is `i32` rather than `usize` so wraparound is well-defined:
/// `fetch_add` on a signed integer wraps in two's complement without a
/// panic in release or debug builds, and masking off the sign bit before
/// the modulo keeps the result non-negative regardless of how many times
/// the counter has wrapped.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicI32,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self {
            counter: AtomicI32::new(0),
        }
    }
}

impl SelectionStrategy for RoundRobin {
    fn name(&self) -> &str {
        "round-robin"
    }

    fn select(&self, n: usize) -> usize {
        let ticket = self.counter.fetch_add(1, Ordering::AcqRel);
        let unsigned = (ticket & i32::MAX) as usize;
        unsigned % n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_through_every_lane() {
        let strategy = RoundRobin::new();
        let n = 8;
        let mut seen = vec![0usize; n];
        for _ in 0..n {
            let index = strategy.select(n);
            seen[index] += 1;
        }
        assert!(seen.iter().all(|&count| count == 1));
    }

    #[test]
    fn always_in_bounds() {
        let strategy = RoundRobin::new();
        for _ in 0..1000 {
            assert!(strategy.select(5) < 5);
        }
    }

    #[test]
    fn single_lane_always_selects_zero() {
        let strategy = RoundRobin::new();
        for _ in 0..10 {
            assert_eq!(strategy.select(1), 0);
        }
    }
}
