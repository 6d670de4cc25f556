//! Fixed-N laned multiplexing layer over a single logical transport
//! endpoint: a pool of long-lived connections ("lanes") with pluggable
//! lane-selection strategies, sitting between an application and a
//! request/response protocol that forbids response reordering.
//!
//! This crate re-exports the pieces split across the workspace:
//! construction and the borrowed-handle contract from `laned-core`, the
//! shipped selection strategies from `laned-strategy`, and a `metrics`-backed
//! sink from `laned-observability`.

pub use laned_core::{
    BorrowedHandle, Lane, LaneCounter, LanedConfig, LanedError, LanedManager, MetricsSink,
    NoopMetricsSink, SelectionStrategy, StrategyKind, Transport, TransportFactory,
};
pub use laned_observability::MetricsRecorderSink;
pub use laned_strategy::{LeastInFlight, RoundRobin, ThreadAffinity};
