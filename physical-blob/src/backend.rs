/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use async_trait::async_trait;
use std::fmt;

use crate::error::Error;
use crate::types::Entry;

/// The uniform storage interface consumed by the rest of the platform.
///
/// Implementations must be safe to call from any number of tasks concurrently. Cancelling an
/// operation is done by dropping its future.
#[async_trait]
pub trait Backend: fmt::Debug + Send + Sync {
    /// Insert or overwrite an entry.
    async fn put(&self, entry: Entry) -> Result<(), Error>;

    /// Fetch the entry stored under `key`, `None` if there is no such entry.
    async fn get(&self, key: &str) -> Result<Option<Entry>, Error>;

    /// Permanently remove the entry stored under `key`.
    ///
    /// Removing a key that does not exist succeeds.
    async fn delete(&self, key: &str) -> Result<(), Error>;

    /// List the keys one level below `prefix`, sorted lexicographically.
    ///
    /// Keys with further path segments are collapsed into a single directory key that ends
    /// with `/`.
    ///
    /// An object whose name equals `prefix` itself is not listed.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, Error>;
}
