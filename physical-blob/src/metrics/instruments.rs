/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

/// A monotonically increasing count.
#[derive(Debug, Clone, Default)]
pub struct Counter {
    value: Arc<AtomicU64>,
}

impl Counter {
    /// Create a new counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` and return the new value.
    pub fn increment(&self, amount: u64) -> u64 {
        self.value.fetch_add(amount, Ordering::Relaxed) + amount
    }

    /// Current value.
    pub fn value(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Number of currently held resources, e.g. in-flight requests.
///
/// Also remembers the highest value it has ever reached.
#[derive(Debug, Clone, Default)]
pub struct Gauge {
    inner: Arc<GaugeInner>,
}

#[derive(Debug, Default)]
struct GaugeInner {
    value: AtomicUsize,
    high_water_mark: AtomicUsize,
}

impl Gauge {
    /// Create a new gauge at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one and return the new value.
    pub fn increment(&self) -> usize {
        let value = self.inner.value.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner
            .high_water_mark
            .fetch_max(value, Ordering::SeqCst);
        value
    }

    /// Subtract one and return the new value.
    ///
    /// Every decrement must pair with a previous increment.
    pub fn decrement(&self) -> usize {
        let prev = self.inner.value.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(prev > 0, "gauge decremented below zero");
        prev - 1
    }

    /// Current value.
    pub fn value(&self) -> usize {
        self.inner.value.load(Ordering::SeqCst)
    }

    /// Highest value observed since creation.
    pub fn high_water_mark(&self) -> usize {
        self.inner.high_water_mark.load(Ordering::SeqCst)
    }
}

/// Summary of recorded durations.
#[derive(Debug, Clone, Default)]
pub struct Timer {
    inner: Arc<Mutex<TimerInner>>,
}

#[derive(Debug, Default)]
struct TimerInner {
    count: u64,
    total: Duration,
    max: Duration,
}

impl Timer {
    /// Create an empty timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one sample.
    pub fn record(&self, elapsed: Duration) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.count += 1;
            inner.total += elapsed;
            inner.max = inner.max.max(elapsed);
        }
    }

    /// Number of recorded samples.
    pub fn count(&self) -> u64 {
        self.inner.lock().map(|inner| inner.count).unwrap_or(0)
    }

    /// Sum of all recorded samples.
    pub fn total(&self) -> Duration {
        self.inner.lock().map(|inner| inner.total).unwrap_or_default()
    }

    /// Longest recorded sample.
    pub fn max(&self) -> Duration {
        self.inner.lock().map(|inner| inner.max).unwrap_or_default()
    }
}
