/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/* Automatically managed default lints */
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
/* End of automatically managed default lints */
#![warn(
    missing_debug_implementations,
    missing_docs,
    rustdoc::missing_crate_level_docs,
    unreachable_pub,
    rust_2018_idioms
)]

//! A hierarchical key/value storage backend on top of a remote blob container.
//!
//! The remote store only knows a flat namespace of object names. This crate maps the
//! `/`-delimited key convention used by callers onto it, bounds the number of in-flight
//! remote operations, translates remote "not found" failures into absent results and makes
//! sure the container exists before the backend is handed out.
//!
//! # Examples
//!
//! Construct a backend from a configuration map (missing values are taken from the
//! environment) against an S3 compatible endpoint and store an entry:
//!
//! ```no_run
//! # async fn example() -> Result<(), physical_blob::error::Error> {
//! use std::collections::HashMap;
//! use physical_blob::{Backend, BlobBackend, Entry};
//!
//! let mut conf = HashMap::new();
//! conf.insert("container".to_owned(), "secrets".to_owned());
//! conf.insert("arm_endpoint".to_owned(), "http://127.0.0.1:9000".to_owned());
//! conf.insert("max_parallel".to_owned(), "32".to_owned());
//!
//! let backend = BlobBackend::new(&conf).await?;
//! backend.put(Entry::new("sys/token/id", "value")).await?;
//!
//! let keys = backend.list("sys/").await?;
//! assert_eq!(keys, vec!["token/".to_owned()]);
//! # Ok(())
//! # }
//! ```
//!
//! See the documentation for each backend operation for more information:
//!
//! * [`put`](crate::Backend::put) - store or overwrite a single entry
//! * [`get`](crate::Backend::get) - fetch a single entry
//! * [`delete`](crate::Backend::delete) - remove a single entry
//! * [`list`](crate::Backend::list) - list keys one level below a prefix

/// Largest value (exclusive) a single entry may carry by default.
pub const MAX_BLOB_SIZE: usize = 4 * MEBIBYTE;

/// Number of object names requested per list page.
pub(crate) const MAX_LIST_RESULTS: i32 = 5000;

pub(crate) const MEBIBYTE: usize = 1024 * 1024;

/// Error types emitted by `physical-blob`
pub mod error;

/// Common types used by `physical-blob`
pub mod types;

/// The storage interface implemented by the blob backend
pub mod backend;

/// Blob backend client
pub mod client;

/// Backend configuration
pub mod config;

/// Translation between hierarchical keys and flat object names
pub mod key;

/// Metrics sinks and instruments
pub mod metrics;

/// Remote blob store abstraction and adapters
pub mod remote;

/// Backend operations
pub(crate) mod operation;

/// Container provisioning
pub(crate) mod provision;

/// Internal runtime components
pub(crate) mod runtime;

pub use self::backend::Backend;
pub use self::client::BlobBackend;
pub use self::config::Config;
pub use self::types::Entry;

use self::config::loader::ConfigLoader;

/// Create a config loader
pub fn from_env() -> ConfigLoader {
    ConfigLoader::default()
}
