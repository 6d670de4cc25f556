use std::sync::Arc;

use crate::error::LanedError;
use crate::lane::LaneCounter;

/// Maps a selection request to a lane index in `[0, N)`.
///
/// Implementations must be safe to call from many threads concurrently, must
/// not allocate on `select`'s hot path, and must never fail `select` itself —
/// a strategy that would otherwise need to report `NotInitialized` is
/// expected to panic, since reaching that state is a construction-order bug
/// the manager already guards against.
pub trait SelectionStrategy: Send + Sync {
    /// Stable metrics tag, e.g. `"round-robin"`.
    fn name(&self) -> &str;

    /// Called exactly once by `LanedManager`, before any `select`. Stateless
    /// strategies ignore it. Fails with `NotInitialized` if `counters` is
    /// empty.
    fn initialize(&self, counters: &[Arc<LaneCounter>]) -> Result<(), LanedError> {
        let _ = counters;
        Ok(())
    }

    /// Returns an index in `[0, n)`. Must be thread-safe and allocation-free.
    fn select(&self, n: usize) -> usize;

    /// Lifecycle hook fired after a lane is acquired. The canonical counter
    /// lives in `Lane`/`LaneCounter`; this hook is informational only — the
    /// default no-op is correct for all three shipped strategies, since a
    /// stateful strategy observes the same shared `Arc<LaneCounter>` `Lane`
    /// mutates.
    fn on_acquired(&self, _lane_index: usize) {}

    /// Lifecycle hook fired after a lane is released. See `on_acquired`.
    fn on_released(&self, _lane_index: usize) {}

    /// Observability accessor. Stateless strategies return 0.
    fn in_flight(&self, _lane_index: usize) -> i32 {
        0
    }
}
