/// Opaque, thread-safe recorder for lane selections, in-flight snapshots,
/// CAS retries, slow operations, and per-connection teardown.
///
/// Every emission carries the manager's `connection` name; per-lane
/// emissions additionally carry `lane_index`, strategy emissions
/// `strategy_name`. Implementations must never panic — a broken metrics
/// backend must not take down the data path.
pub trait MetricsSink: Send + Sync {
    /// `lane.selections` counter.
    fn selection(&self, connection: &str, lane_index: usize, strategy_name: &str);

    /// `lane.in_flight` gauge — absolute value, not a delta.
    fn set_in_flight(&self, connection: &str, lane_index: usize, value: i32);

    /// `strategy.cas.retries` counter. Emitted only for retried
    /// compare-and-swap attempts on the in-flight decrement path.
    fn cas_retry(&self, connection: &str, strategy_name: &str);

    /// `slow.commands` counter. Nothing in this crate fires it today; the
    /// firing hook belongs to an external command-listener collaborator.
    fn slow_operation(&self, connection: &str, command_name: &str, millis: u64);

    /// Idempotent per-connection cleanup, called once from
    /// `LanedManager::teardown`. Must never panic.
    fn close(&self, connection: &str);
}

/// Zero-overhead default sink. Every method is an empty, `#[inline]` no-op so
/// that a manager built without an explicit sink costs nothing beyond the
/// `Arc<dyn MetricsSink>` vtable indirection already required for a
/// user-supplied sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    #[inline]
    fn selection(&self, _connection: &str, _lane_index: usize, _strategy_name: &str) {}

    #[inline]
    fn set_in_flight(&self, _connection: &str, _lane_index: usize, _value: i32) {}

    #[inline]
    fn cas_retry(&self, _connection: &str, _strategy_name: &str) {}

    #[inline]
    fn slow_operation(&self, _connection: &str, _command_name: &str, _millis: u64) {}

    #[inline]
    fn close(&self, _connection: &str) {}
}
