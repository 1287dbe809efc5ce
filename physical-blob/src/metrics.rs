/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Counters, gauges and timers
pub mod instruments;

use instruments::{Counter, Timer};

/// Receives named metrics emitted by the backend.
///
/// Metric names are given as path segments, e.g. `["blob", "put"]`.
pub trait MetricsSink: fmt::Debug + Send + Sync {
    /// Record one timing sample under `key`.
    fn add_sample(&self, key: &[&str], elapsed: Duration);

    /// Increase the counter under `key` by `value`.
    fn incr_counter(&self, key: &[&str], value: u64);

    /// Record the time elapsed since `start` under `key`.
    fn measure_since(&self, key: &[&str], start: Instant) {
        self.add_sample(key, start.elapsed());
    }
}

/// A type-erased, shareable [`MetricsSink`].
pub type SharedMetricsSink = Arc<dyn MetricsSink>;

/// Metrics sink that reports every sample as a `tracing` event at `TRACE` level.
#[derive(Debug, Clone, Default)]
pub struct TracingSink;

impl MetricsSink for TracingSink {
    fn add_sample(&self, key: &[&str], elapsed: Duration) {
        tracing::trace!(
            metric = %key.join("."),
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "timer"
        );
    }

    fn incr_counter(&self, key: &[&str], value: u64) {
        tracing::trace!(metric = %key.join("."), value, "counter");
    }
}

/// Metrics sink that keeps every metric in memory so it can be inspected later.
#[derive(Debug, Clone, Default)]
pub struct InMemorySink {
    timers: Arc<Mutex<HashMap<String, Timer>>>,
    counters: Arc<Mutex<HashMap<String, Counter>>>,
}

impl InMemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// The timer recorded under `key`, if any sample was ever recorded.
    pub fn timer(&self, key: &[&str]) -> Option<Timer> {
        self.timers.lock().ok()?.get(&key.join(".")).cloned()
    }

    /// The value of the counter under `key`, zero if it was never incremented.
    pub fn counter(&self, key: &[&str]) -> u64 {
        self.counters
            .lock()
            .ok()
            .and_then(|counters| counters.get(&key.join(".")).map(Counter::value))
            .unwrap_or(0)
    }
}

impl MetricsSink for InMemorySink {
    fn add_sample(&self, key: &[&str], elapsed: Duration) {
        if let Ok(mut timers) = self.timers.lock() {
            timers.entry(key.join(".")).or_default().record(elapsed);
        }
    }

    fn incr_counter(&self, key: &[&str], value: u64) {
        if let Ok(mut counters) = self.counters.lock() {
            counters.entry(key.join(".")).or_default().increment(value);
        }
    }
}

/// Records the time between its creation and drop under a fixed key.
#[must_use]
#[derive(Debug)]
pub(crate) struct MeasureGuard<'a> {
    sink: &'a dyn MetricsSink,
    key: [&'static str; 2],
    start: Instant,
}

impl<'a> MeasureGuard<'a> {
    pub(crate) fn new(sink: &'a dyn MetricsSink, key: [&'static str; 2]) -> Self {
        Self {
            sink,
            key,
            start: Instant::now(),
        }
    }
}

impl Drop for MeasureGuard<'_> {
    fn drop(&mut self) {
        self.sink.measure_since(&self.key, self.start);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{InMemorySink, MeasureGuard, MetricsSink};

    #[test]
    fn test_in_memory_sink() {
        let sink = InMemorySink::new();
        sink.add_sample(&["blob", "get"], Duration::from_millis(3));
        sink.add_sample(&["blob", "get"], Duration::from_millis(4));
        sink.incr_counter(&["blob", "get", "error"], 1);

        assert_eq!(2, sink.timer(&["blob", "get"]).unwrap().count());
        assert!(sink.timer(&["blob", "put"]).is_none());
        assert_eq!(1, sink.counter(&["blob", "get", "error"]));
        assert_eq!(0, sink.counter(&["blob", "put", "error"]));
    }

    #[test]
    fn test_measure_guard_records_on_drop() {
        let sink = InMemorySink::new();
        {
            let _guard = MeasureGuard::new(&sink, ["blob", "list"]);
        }
        assert_eq!(1, sink.timer(&["blob", "list"]).unwrap().count());
    }
}
