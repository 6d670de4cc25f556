//! Test doubles for exercising `laned-core` without a real transport:
//! an in-memory `Transport`/`TransportFactory` pair, and a `MetricsSink`
//! that records every emission for assertions.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use laned_core::{LanedError, MetricsSink, Transport, TransportFactory};

/// A `Transport` that does nothing but track whether it has been closed.
/// Reports every close back to the `closed` counter shared with the
/// `InMemoryTransportFactory` that created it, so a test can assert on how
/// many transports a manager actually tore down (e.g. during rollback).
#[derive(Debug)]
pub struct InMemoryTransport {
    open: AtomicBool,
    closed: Arc<AtomicUsize>,
}

impl InMemoryTransport {
    fn new(closed: Arc<AtomicUsize>) -> Self {
        Self {
            open: AtomicBool::new(true),
            closed,
        }
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    async fn close(&self) -> Result<(), LanedError> {
        if self
            .open
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.closed.fetch_add(1, Ordering::AcqRel);
        }
        Ok(())
    }
}

/// Opens `InMemoryTransport`s, counting how many it has opened and closed.
/// Can be configured to fail starting at a given open attempt, to exercise
/// `LanedManager`'s rollback-on-partial-failure path.
#[derive(Debug, Default)]
pub struct InMemoryTransportFactory {
    opened: AtomicUsize,
    closed: Arc<AtomicUsize>,
    fail_after: Option<usize>,
}

impl InMemoryTransportFactory {
    pub fn new() -> Self {
        Self {
            opened: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
            fail_after: None,
        }
    }

    /// Returns a factory whose `open` call numbered `fail_after` (1-based)
    /// and every call after it fails.
    pub fn failing_after(fail_after: usize) -> Self {
        Self {
            opened: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
            fail_after: Some(fail_after),
        }
    }

    pub fn opened_count(&self) -> usize {
        self.opened.load(Ordering::Acquire)
    }

    /// How many transports this factory's `open` calls have produced that
    /// have since had `close` called on them.
    pub fn closed_count(&self) -> usize {
        self.closed.load(Ordering::Acquire)
    }

    /// A cloned handle onto this factory's close counter, so a caller that
    /// is about to hand the factory itself (by value) to a `LanedManager`
    /// can still observe how many of its transports get closed afterward.
    pub fn closed_tracker(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closed)
    }
}

#[async_trait]
impl TransportFactory for InMemoryTransportFactory {
    type Transport = InMemoryTransport;

    async fn open(&self) -> Result<Self::Transport, LanedError> {
        let attempt = self.opened.fetch_add(1, Ordering::AcqRel) + 1;
        if let Some(fail_after) = self.fail_after {
            if attempt >= fail_after {
                return Err(LanedError::initialization_failed(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    format!("simulated open failure on attempt {attempt}"),
                )));
            }
        }
        Ok(InMemoryTransport::new(Arc::clone(&self.closed)))
    }
}

/// One recorded `MetricsSink` call, for scenario-test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricsEvent {
    Selection {
        connection: String,
        lane_index: usize,
        strategy_name: String,
    },
    SetInFlight {
        connection: String,
        lane_index: usize,
        value: i32,
    },
    CasRetry {
        connection: String,
        strategy_name: String,
    },
    SlowOperation {
        connection: String,
        command_name: String,
        millis: u64,
    },
    Close {
        connection: String,
    },
}

/// A `MetricsSink` that appends every emission to a `Mutex<Vec<_>>` instead
/// of forwarding anywhere, so tests can assert on exactly what fired.
#[derive(Debug, Default)]
pub struct RecordingMetricsSink {
    events: Mutex<Vec<MetricsEvent>>,
}

impl RecordingMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<MetricsEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn selection_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, MetricsEvent::Selection { .. }))
            .count()
    }

    pub fn cas_retry_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, MetricsEvent::CasRetry { .. }))
            .count()
    }
}

impl MetricsSink for RecordingMetricsSink {
    fn selection(&self, connection: &str, lane_index: usize, strategy_name: &str) {
        self.events.lock().unwrap().push(MetricsEvent::Selection {
            connection: connection.to_string(),
            lane_index,
            strategy_name: strategy_name.to_string(),
        });
    }

    fn set_in_flight(&self, connection: &str, lane_index: usize, value: i32) {
        self.events.lock().unwrap().push(MetricsEvent::SetInFlight {
            connection: connection.to_string(),
            lane_index,
            value,
        });
    }

    fn cas_retry(&self, connection: &str, strategy_name: &str) {
        self.events.lock().unwrap().push(MetricsEvent::CasRetry {
            connection: connection.to_string(),
            strategy_name: strategy_name.to_string(),
        });
    }

    fn slow_operation(&self, connection: &str, command_name: &str, millis: u64) {
        self.events
            .lock()
            .unwrap()
            .push(MetricsEvent::SlowOperation {
                connection: connection.to_string(),
                command_name: command_name.to_string(),
                millis,
            });
    }

    fn close(&self, connection: &str) {
        self.events.lock().unwrap().push(MetricsEvent::Close {
            connection: connection.to_string(),
        });
    }
}
