/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error;
use crate::metrics::instruments::Gauge;
use crate::types::ConcurrencySetting;

/// Admission control for remote operations.
///
/// Scheduler is internally reference-counted and can be freely cloned. All clones share the
/// same capacity.
#[derive(Debug, Clone)]
pub(crate) struct Scheduler {
    // `None` when unbounded
    semaphore: Option<Arc<Semaphore>>,
    in_flight: Gauge,
}

impl Scheduler {
    /// Create a new scheduler admitting at most `concurrency` remote operations at once.
    pub(crate) fn new(concurrency: ConcurrencySetting) -> Self {
        let semaphore = concurrency
            .limit()
            .map(|limit| Arc::new(Semaphore::new(limit.min(Semaphore::MAX_PERMITS))));
        Self {
            semaphore,
            in_flight: Gauge::new(),
        }
    }

    /// Acquire a permit to perform one remote operation.
    ///
    /// Waits until a slot is free. The slot is returned when the permit is dropped.
    pub(crate) async fn acquire_permit(&self) -> Result<OwnedWorkPermit, error::Error> {
        let inner = match &self.semaphore {
            Some(semaphore) => Some(semaphore.clone().acquire_owned().await?),
            None => None,
        };
        let in_flight = self.in_flight.clone();
        let current = in_flight.increment();
        tracing::trace!("acquired work permit, {current} in flight");
        Ok(OwnedWorkPermit {
            _inner: inner,
            in_flight,
        })
    }

    /// Number of permits currently held.
    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.value()
    }

    /// Highest number of permits ever held at once.
    pub(crate) fn high_water_mark(&self) -> usize {
        self.in_flight.high_water_mark()
    }
}

/// An owned permit from the scheduler to perform one remote operation.
#[must_use]
#[clippy::has_significant_drop]
#[derive(Debug)]
pub(crate) struct OwnedWorkPermit {
    _inner: Option<OwnedSemaphorePermit>,
    in_flight: Gauge,
}

impl Drop for OwnedWorkPermit {
    fn drop(&mut self) {
        self.in_flight.decrement();
    }
}
