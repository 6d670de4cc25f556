use std::sync::{Arc, OnceLock};

use laned_core::{LaneCounter, LanedError, SelectionStrategy};

/// Steers every call toward whichever lane currently has the fewest
/// in-flight requests, ties breaking to the lowest index.
///
/// Stateful: `initialize` captures the manager's own `Arc<LaneCounter>`
/// handles once, and every `select` call thereafter does a linear scan over
/// them. This is the one shipped strategy that is O(n) instead of O(1); it
/// trades that for steering quality when request duration is uneven across
/// lanes. No separate bookkeeping is needed on `on_acquired`/`on_released`
/// because the captured counters are the same atomics `Lane` itself mutates.
#[derive(Debug, Default)]
pub struct LeastInFlight {
    counters: OnceLock<Vec<Arc<LaneCounter>>>,
}

impl LeastInFlight {
    pub fn new() -> Self {
        Self {
            counters: OnceLock::new(),
        }
    }
}

impl SelectionStrategy for LeastInFlight {
    fn name(&self) -> &str {
        "least-in-flight"
    }

    fn initialize(&self, counters: &[Arc<LaneCounter>]) -> Result<(), LanedError> {
        if counters.is_empty() {
            return Err(LanedError::NotInitialized);
        }
        // A second initialize call (e.g. a manager built twice against the
        // same strategy instance) is treated as a no-op: the first snapshot
        // wins and later calls are silently ignored rather than erroring.
        let _ = self.counters.set(counters.to_vec());
        Ok(())
    }

    fn select(&self, n: usize) -> usize {
        let counters = self
            .counters
            .get()
            .expect("LeastInFlight::select called before initialize");
        debug_assert_eq!(counters.len(), n);

        let mut best_index = 0;
        let mut best_value = i32::MAX;
        for (index, counter) in counters.iter().enumerate() {
            let value = counter.load();
            if value < best_value {
                best_value = value;
                best_index = index;
            }
        }
        best_index
    }

    fn in_flight(&self, lane_index: usize) -> i32 {
        self.counters
            .get()
            .and_then(|counters| counters.get(lane_index))
            .map(|counter| counter.load())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counters(n: usize) -> Vec<Arc<LaneCounter>> {
        (0..n).map(|_| Arc::new(LaneCounter::new())).collect()
    }

    #[test]
    fn steers_toward_the_least_loaded_lane() {
        let strategy = LeastInFlight::new();
        let counters = counters(4);
        strategy.initialize(&counters).unwrap();

        counters[0].acquire();
        counters[0].acquire();
        counters[1].acquire();

        assert_eq!(strategy.select(4), 2);
    }

    #[test]
    fn ties_break_to_lowest_index() {
        let strategy = LeastInFlight::new();
        let counters = counters(3);
        strategy.initialize(&counters).unwrap();
        assert_eq!(strategy.select(3), 0);
    }

    #[test]
    fn rejects_empty_counter_set() {
        let strategy = LeastInFlight::new();
        assert!(matches!(
            strategy.initialize(&[]),
            Err(LanedError::NotInitialized)
        ));
    }

    #[test]
    fn second_initialize_is_a_silent_no_op() {
        let strategy = LeastInFlight::new();
        let first = counters(2);
        let second = counters(3);
        strategy.initialize(&first).unwrap();
        strategy.initialize(&second).unwrap();
        assert_eq!(strategy.select(2), 0);
    }
}
