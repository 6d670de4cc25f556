use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::LanedError;
use crate::handle::BorrowedHandle;
use crate::lane::{Lane, LaneCounter};
use crate::metrics::{MetricsSink, NoopMetricsSink};
use crate::strategy::SelectionStrategy;
use crate::transport::{Transport, TransportFactory};

const MIN_LANES: usize = 1;
const MAX_LANES: usize = 64;

/// Owns a fixed set of `N` long-lived lanes over a single logical endpoint
/// and hands them out one at a time via a pluggable `SelectionStrategy`.
///
/// Construction opens all `N` transports up front and never opens another
/// one afterward; a transport that fails to open during construction rolls
/// back every lane already opened for this manager.
pub struct LanedManager<T: Transport> {
    connection_name: Arc<str>,
    lanes: Vec<Arc<Lane<T>>>,
    strategy: Arc<dyn SelectionStrategy>,
    metrics: Arc<dyn MetricsSink>,
    shut_down: AtomicBool,
}

impl<T: Transport> LanedManager<T> {
    /// Opens `num_lanes` transports from `factory` and binds them to
    /// `strategy`. `num_lanes` must be in `[1, 64]`. If any transport after
    /// the first fails to open, every lane opened so far for this call is
    /// closed before the error is returned.
    pub async fn new<F>(
        connection_name: impl Into<Arc<str>>,
        num_lanes: usize,
        factory: F,
        strategy: Arc<dyn SelectionStrategy>,
    ) -> Result<Self, LanedError>
    where
        F: TransportFactory<Transport = T>,
    {
        Self::with_metrics(
            connection_name,
            num_lanes,
            factory,
            strategy,
            Arc::new(NoopMetricsSink),
        )
        .await
    }

    /// Same as `new`, but with an explicit metrics sink instead of the
    /// default no-op.
    pub async fn with_metrics<F>(
        connection_name: impl Into<Arc<str>>,
        num_lanes: usize,
        factory: F,
        strategy: Arc<dyn SelectionStrategy>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Result<Self, LanedError>
    where
        F: TransportFactory<Transport = T>,
    {
        if !(MIN_LANES..=MAX_LANES).contains(&num_lanes) {
            return Err(LanedError::InvalidLaneCount {
                requested: num_lanes,
            });
        }

        let connection_name: Arc<str> = connection_name.into();
        let strategy_name: Arc<str> = Arc::from(strategy.name());

        let mut lanes: Vec<Arc<Lane<T>>> = Vec::with_capacity(num_lanes);
        for index in 0..num_lanes {
            match factory.open().await {
                Ok(transport) => {
                    let lane = Lane::new(
                        index,
                        transport,
                        Arc::new(LaneCounter::new()),
                        Arc::clone(&metrics),
                        Arc::clone(&connection_name),
                        Arc::clone(&strategy_name),
                    );
                    lanes.push(Arc::new(lane));
                }
                Err(err) => {
                    warn!(
                        connection = %connection_name,
                        opened = lanes.len(),
                        requested = num_lanes,
                        "transport open failed during lane construction, rolling back"
                    );
                    for lane in &lanes {
                        let _ = lane.close().await;
                    }
                    return Err(LanedError::initialization_failed(err));
                }
            }
        }

        let counters: Vec<Arc<LaneCounter>> =
            lanes.iter().map(|lane| Arc::clone(lane.counter())).collect();
        strategy.initialize(&counters)?;

        debug!(
            connection = %connection_name,
            num_lanes,
            strategy = %strategy_name,
            "laned manager constructed"
        );

        Ok(Self {
            connection_name,
            lanes,
            strategy,
            metrics,
            shut_down: AtomicBool::new(false),
        })
    }

    /// Number of lanes this manager owns. Fixed for the manager's lifetime.
    pub fn open_lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Selects a lane via the configured strategy and returns a handle onto
    /// it. Fails with `ManagerShutDown` once `teardown` has completed.
    pub async fn acquire(&self) -> Result<BorrowedHandle<T>, LanedError> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(LanedError::ManagerShutDown);
        }

        let index = self.strategy.select(self.lanes.len());
        let lane = Arc::clone(&self.lanes[index]);
        self.metrics
            .selection(&self.connection_name, index, self.strategy.name());
        self.strategy.on_acquired(index);
        Ok(BorrowedHandle::new(lane, Arc::clone(&self.strategy)))
    }

    /// Closes every lane's transport and notifies the metrics sink.
    /// Idempotent: a second call is a no-op.
    pub async fn teardown(&self) -> Result<(), LanedError> {
        if self
            .shut_down
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        for lane in &self.lanes {
            if let Err(err) = lane.close().await {
                warn!(
                    connection = %self.connection_name,
                    lane_index = lane.index(),
                    error = %err,
                    "lane close failed during teardown"
                );
            }
        }
        self.metrics.close(&self.connection_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;

    use super::*;
    use crate::strategy::SelectionStrategy;

    struct StubTransport {
        open: AtomicBool,
    }

    #[async_trait]
    impl Transport for StubTransport {
        fn is_open(&self) -> bool {
            self.open.load(Ordering::Acquire)
        }

        async fn close(&self) -> Result<(), LanedError> {
            self.open.store(false, Ordering::Release);
            Ok(())
        }
    }

    struct StubFactory {
        opened: AtomicUsize,
        fail_at: Option<usize>,
    }

    #[async_trait]
    impl TransportFactory for StubFactory {
        type Transport = StubTransport;

        async fn open(&self) -> Result<Self::Transport, LanedError> {
            let attempt = self.opened.fetch_add(1, Ordering::AcqRel) + 1;
            if self.fail_at == Some(attempt) {
                return Err(LanedError::initialization_failed(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "stub open failure",
                )));
            }
            Ok(StubTransport {
                open: AtomicBool::new(true),
            })
        }
    }

    struct StubRoundRobin(std::sync::atomic::AtomicUsize);

    impl SelectionStrategy for StubRoundRobin {
        fn name(&self) -> &str {
            "stub-round-robin"
        }

        fn select(&self, n: usize) -> usize {
            self.0.fetch_add(1, Ordering::Relaxed) % n
        }
    }

    #[tokio::test]
    async fn rejects_lane_counts_outside_one_to_sixty_four() {
        let factory = StubFactory {
            opened: AtomicUsize::new(0),
            fail_at: None,
        };
        let err = LanedManager::new(
            "test",
            0,
            factory,
            Arc::new(StubRoundRobin(std::sync::atomic::AtomicUsize::new(0))),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, LanedError::InvalidLaneCount { requested: 0 }));
    }

    #[tokio::test]
    async fn rolls_back_opened_lanes_on_partial_failure() {
        let factory = StubFactory {
            opened: AtomicUsize::new(0),
            fail_at: Some(3),
        };
        let err = LanedManager::new(
            "test",
            4,
            factory,
            Arc::new(StubRoundRobin(std::sync::atomic::AtomicUsize::new(0))),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, LanedError::InitializationFailed { .. }));
    }

    #[tokio::test]
    async fn acquire_after_teardown_is_rejected() {
        let factory = StubFactory {
            opened: AtomicUsize::new(0),
            fail_at: None,
        };
        let manager = LanedManager::new(
            "test",
            2,
            factory,
            Arc::new(StubRoundRobin(std::sync::atomic::AtomicUsize::new(0))),
        )
        .await
        .unwrap();

        manager.teardown().await.unwrap();
        manager.teardown().await.unwrap();

        let err = manager.acquire().await.unwrap_err();
        assert!(matches!(err, LanedError::ManagerShutDown));
    }

    #[tokio::test]
    async fn acquire_cycles_through_lanes() {
        let factory = StubFactory {
            opened: AtomicUsize::new(0),
            fail_at: None,
        };
        let manager = LanedManager::new(
            "test",
            3,
            factory,
            Arc::new(StubRoundRobin(std::sync::atomic::AtomicUsize::new(0))),
        )
        .await
        .unwrap();

        let first = manager.acquire().await.unwrap();
        let second = manager.acquire().await.unwrap();
        let third = manager.acquire().await.unwrap();
        assert_eq!(first.lane_index(), 0);
        assert_eq!(second.lane_index(), 1);
        assert_eq!(third.lane_index(), 2);
    }
}
