#[cfg(not(feature = "loom_test"))]
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
#[cfg(feature = "loom_test")]
use loom::sync::atomic::{AtomicI32, Ordering};

use crate::error::LanedError;
use crate::metrics::MetricsSink;
use crate::transport::Transport;

/// The lock-free in-flight counter a `Lane` owns. Split out from `Lane<T>`
/// itself (rather than embedded directly) so a `SelectionStrategy` can hold
/// its own `Arc` to the same atomic without being generic over the transport
/// type `T` — see `LeastInFlight` in `laned-strategy`, which stores exactly
/// these handles after `initialize`.
///
/// Invariant: monotone-bounded. Every increment pairs with at most one
/// successful decrement; decrements never drive the value below zero.
#[derive(Debug, Default)]
pub struct LaneCounter {
    in_flight: AtomicI32,
}

impl LaneCounter {
    pub fn new() -> Self {
        Self {
            in_flight: AtomicI32::new(0),
        }
    }

    /// Returns the post-increment value. Wait-free, never retries.
    pub fn acquire(&self) -> i32 {
        self.in_flight.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// CAS-guarded decrement that never drives the counter below zero.
    /// Returns `(post_value, retries)`; `retries` counts failed CAS attempts
    /// so the caller can surface `cas_retry` metrics.
    pub fn release(&self) -> (i32, u32) {
        let mut current = self.in_flight.load(Ordering::Acquire);
        let mut retries = 0u32;
        loop {
            if current <= 0 {
                return (current, retries);
            }
            match self.in_flight.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return (current - 1, retries),
                Err(observed) => {
                    current = observed;
                    retries += 1;
                }
            }
        }
    }

    /// Snapshot read. May be mildly stale under concurrent writers; every
    /// load observes a value written by some prior acquire or release.
    pub fn load(&self) -> i32 {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// One long-lived multiplexed transport plus its in-flight counter.
/// Uniquely identified by its zero-based index; index and transport are
/// immutable after construction.
pub struct Lane<T: Transport> {
    index: usize,
    transport: T,
    counter: Arc<LaneCounter>,
    metrics: Arc<dyn MetricsSink>,
    connection_name: Arc<str>,
    strategy_name: Arc<str>,
}

impl<T: Transport> Lane<T> {
    pub fn new(
        index: usize,
        transport: T,
        counter: Arc<LaneCounter>,
        metrics: Arc<dyn MetricsSink>,
        connection_name: Arc<str>,
        strategy_name: Arc<str>,
    ) -> Self {
        Self {
            index,
            transport,
            counter,
            metrics,
            connection_name,
            strategy_name,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn counter(&self) -> &Arc<LaneCounter> {
        &self.counter
    }

    pub fn in_flight(&self) -> i32 {
        self.counter.load()
    }

    /// Records acquisition: atomic increment plus a `set_in_flight` gauge
    /// snapshot at the post-increment value.
    pub(crate) fn acquire(&self) {
        let value = self.counter.acquire();
        self.metrics
            .set_in_flight(&self.connection_name, self.index, value);
    }

    /// Records release: CAS-guarded decrement plus a `set_in_flight` gauge
    /// snapshot at the post-decrement value. Emits `cas_retry` once per
    /// failed CAS attempt observed along the way.
    pub(crate) fn release(&self) {
        let (value, retries) = self.counter.release();
        self.metrics
            .set_in_flight(&self.connection_name, self.index, value);
        for _ in 0..retries {
            self.metrics
                .cas_retry(&self.connection_name, &self.strategy_name);
        }
    }

    /// Physically closes the underlying transport. Idempotent because
    /// `Transport::close` itself must be.
    pub async fn close(&self) -> Result<(), LanedError> {
        self.transport.close().await
    }
}
