//! `MetricsSink` implementation backed by the `metrics` facade crate, so a
//! caller can wire lane activity into whatever recorder they've installed
//! (Prometheus, statsd, or anything else `metrics` has an exporter for).

use std::collections::HashMap;
use std::sync::Mutex;

use laned_core::MetricsSink;
use metrics::{counter, gauge};
use tracing::warn;

/// Upper bound on how many distinct `(connection, lane_index)` tag strings
/// this sink will cache before it stops growing the cache and starts
/// reusing an "overflow" tag. Guards against an unbounded number of
/// connection names turning into an unbounded amount of cached label
/// strings.
const MAX_CACHED_TAGS: usize = 1000;

/// `MetricsSink` that forwards every emission to the globally installed
/// `metrics` recorder.
///
/// The `lane.index` label value is just `lane_index` formatted as a string;
/// that formatted string is cached in a bounded `Mutex<HashMap>` keyed by
/// `(connection, lane_index)` rather than reformatted on every call, since
/// the `metrics` macros take `&'static str` or owned `String` labels and
/// lane indices repeat on every acquire/release.
pub struct MetricsRecorderSink {
    metric_prefix: &'static str,
    lane_index_tags: Mutex<HashMap<(String, usize), String>>,
    overflowed: std::sync::atomic::AtomicBool,
}

impl MetricsRecorderSink {
    pub fn new(metric_prefix: &'static str) -> Self {
        Self {
            metric_prefix,
            lane_index_tags: Mutex::new(HashMap::new()),
            overflowed: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Formatted `lane_index` value for the `lane.index` label, cached per
    /// `(connection, lane_index)` pair.
    fn lane_index_tag(&self, connection: &str, lane_index: usize) -> String {
        let key = (connection.to_string(), lane_index);
        let mut cache = self.lane_index_tags.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(tag) = cache.get(&key) {
            return tag.clone();
        }
        if cache.len() >= MAX_CACHED_TAGS {
            if !self.overflowed.swap(true, std::sync::atomic::Ordering::Relaxed) {
                warn!(
                    connection,
                    lane_index,
                    cache_size = cache.len(),
                    "lane tag cache exhausted, degrading to uncached formatting"
                );
            }
            return lane_index.to_string();
        }
        let tag = lane_index.to_string();
        cache.insert(key, tag.clone());
        tag
    }
}

impl MetricsSink for MetricsRecorderSink {
    fn selection(&self, connection: &str, lane_index: usize, strategy_name: &str) {
        let lane_index = self.lane_index_tag(connection, lane_index);
        counter!(
            format!("{}.lane.selections", self.metric_prefix),
            "connection.name" => connection.to_string(),
            "lane.index" => lane_index,
            "strategy.name" => strategy_name.to_string(),
        )
        .increment(1);
    }

    fn set_in_flight(&self, connection: &str, lane_index: usize, value: i32) {
        let lane_index = self.lane_index_tag(connection, lane_index);
        gauge!(
            format!("{}.lane.in_flight", self.metric_prefix),
            "connection.name" => connection.to_string(),
            "lane.index" => lane_index,
        )
        .set(value as f64);
    }

    fn cas_retry(&self, connection: &str, strategy_name: &str) {
        counter!(
            format!("{}.strategy.cas.retries", self.metric_prefix),
            "connection.name" => connection.to_string(),
            "strategy.name" => strategy_name.to_string(),
        )
        .increment(1);
    }

    fn slow_operation(&self, connection: &str, command_name: &str, millis: u64) {
        counter!(
            format!("{}.slow.commands", self.metric_prefix),
            "connection.name" => connection.to_string(),
            "command" => command_name.to_string(),
        )
        .increment(1);
        let _ = millis;
    }

    fn close(&self, connection: &str) {
        let mut cache = self.lane_index_tags.lock().unwrap_or_else(|e| e.into_inner());
        cache.retain(|(conn, _), _| conn != connection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lane_index_tag_cache_reuses_formatted_strings() {
        let sink = MetricsRecorderSink::new("laned");
        let first = sink.lane_index_tag("upstream-a", 3);
        let second = sink.lane_index_tag("upstream-a", 3);
        assert_eq!(first, second);
        assert_eq!(first, "3");
    }

    #[test]
    fn close_evicts_only_the_closed_connection() {
        let sink = MetricsRecorderSink::new("laned");
        sink.lane_index_tag("upstream-a", 0);
        sink.lane_index_tag("upstream-b", 0);
        sink.close("upstream-a");
        let cache = sink.lane_index_tags.lock().unwrap();
        assert!(!cache.contains_key(&("upstream-a".to_string(), 0)));
        assert!(cache.contains_key(&("upstream-b".to_string(), 0)));
    }
}
