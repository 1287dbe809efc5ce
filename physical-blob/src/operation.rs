/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::future::Future;

use crate::client::Handle;
use crate::error;
use crate::metrics::MeasureGuard;

/// Store a single entry
pub(crate) mod put;

/// Fetch a single entry
pub(crate) mod get;

/// Delete a single entry
pub(crate) mod delete;

/// List keys below a prefix
pub(crate) mod list;

/// Prefix of every metric emitted by backend operations.
pub(crate) const METRIC_PREFIX: &str = "blob";

/// The backend operations, used to name metrics and annotate errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OperationKind {
    Put,
    Get,
    Delete,
    List,
}

impl OperationKind {
    pub(crate) const fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Put => "put",
            OperationKind::Get => "get",
            OperationKind::Delete => "delete",
            OperationKind::List => "list",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drive `operation` to completion, recording its latency and failures.
///
/// The latency is recorded on every exit path, including when the future is dropped early.
pub(crate) async fn instrumented<T, F>(
    handle: &Handle,
    kind: OperationKind,
    operation: F,
) -> Result<T, error::Error>
where
    F: Future<Output = Result<T, error::Error>>,
{
    let _timer = MeasureGuard::new(handle.metrics.as_ref(), [METRIC_PREFIX, kind.as_str()]);
    let result = operation.await;
    if let Err(err) = &result {
        tracing::debug!("{kind} failed: {err}");
        handle
            .metrics
            .incr_counter(&[METRIC_PREFIX, kind.as_str(), "error"], 1);
    }
    result
}
