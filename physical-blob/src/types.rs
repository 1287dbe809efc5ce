/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use bytes::Bytes;
use std::fmt;

/// A single key/value pair persisted by the backend.
///
/// `key` is a `/`-delimited path without a leading slash. It uniquely identifies one object
/// in the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The hierarchical key of the entry
    pub key: String,
    /// The opaque value of the entry
    pub value: Bytes,
}

impl Entry {
    /// Create a new entry
    pub fn new(key: impl Into<String>, value: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The key of this entry
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The value of this entry
    pub fn value(&self) -> &Bytes {
        &self.value
    }
}

/// Identity of the remote namespace a backend is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerHandle {
    account: String,
    name: String,
}

impl ContainerHandle {
    /// Create a new handle for the container `name` owned by `account`
    pub fn new(account: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            name: name.into(),
        }
    }

    /// The storage account owning the container
    pub fn account(&self) -> &str {
        &self.account
    }

    /// The container name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.account, self.name)
    }
}

/// The number of remote operations a backend may have in flight at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConcurrencySetting {
    /// No limit on in-flight remote operations.
    #[default]
    Unbounded,

    /// At most the given number of remote operations in flight.
    ///
    /// NOTE: `Explicit(0)` is treated as [`ConcurrencySetting::Unbounded`].
    Explicit(usize),
}

impl ConcurrencySetting {
    /// The concrete limit, `None` when unbounded
    pub fn limit(&self) -> Option<usize> {
        match self {
            ConcurrencySetting::Explicit(0) | ConcurrencySetting::Unbounded => None,
            ConcurrencySetting::Explicit(n) => Some(*n),
        }
    }
}

impl From<usize> for ConcurrencySetting {
    fn from(value: usize) -> Self {
        match value {
            0 => ConcurrencySetting::Unbounded,
            n => ConcurrencySetting::Explicit(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ConcurrencySetting;

    #[test]
    fn test_zero_is_unbounded() {
        assert_eq!(None, ConcurrencySetting::Explicit(0).limit());
        assert_eq!(None, ConcurrencySetting::Unbounded.limit());
        assert_eq!(ConcurrencySetting::Unbounded, ConcurrencySetting::from(0));
        assert_eq!(Some(4), ConcurrencySetting::from(4).limit());
    }
}
