/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::backend::Backend;
use crate::error;
use crate::metrics::{SharedMetricsSink, TracingSink};
use crate::operation::{
    delete::Delete, get::Get, instrumented, list::List, put::Put, OperationKind,
};
use crate::provision;
use crate::remote::s3::S3BlobStore;
use crate::remote::BlobStore;
use crate::runtime::scheduler::Scheduler;
use crate::types::{ContainerHandle, Entry};
use crate::Config;

/// Storage backend keeping every entry as one object in a remote blob container.
///
/// The backend is internally reference-counted and can be freely cloned; clones share the
/// remote client and the limit on in-flight operations.
#[derive(Debug, Clone)]
pub struct BlobBackend {
    pub(crate) handle: Arc<Handle>,
}

/// Whatever is needed to carry out operations: config, remote store, scheduler and metrics
#[derive(Debug)]
pub(crate) struct Handle {
    pub(crate) config: Config,
    pub(crate) store: Arc<dyn BlobStore>,
    pub(crate) scheduler: Scheduler,
    pub(crate) metrics: SharedMetricsSink,
}

impl Handle {
    /// Name of the container used to annotate errors
    pub(crate) fn container_name(&self) -> &str {
        self.store.container().name()
    }
}

impl BlobBackend {
    /// Create a backend from a settings map, falling back to the process environment.
    ///
    /// The backend talks to the S3 compatible service at `arm_endpoint`, which must be set.
    /// The container is created if it does not exist yet. See
    /// [`ConfigLoader`](crate::config::loader::ConfigLoader) for the recognized settings.
    pub async fn new(conf: &HashMap<String, String>) -> Result<BlobBackend, error::Error> {
        let config = crate::from_env().load(conf)?;
        Self::builder(config).build().await
    }

    /// Create a backend talking to the endpoint given by an already resolved config.
    ///
    /// Fails with [`ErrorKind::ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid) if the
    /// endpoint was derived from the cloud environment instead of set explicitly.
    pub async fn from_config(config: Config) -> Result<BlobBackend, error::Error> {
        Self::builder(config).build().await
    }

    /// Create a backend on top of an explicit remote store.
    pub async fn with_store(
        config: Config,
        store: Arc<dyn BlobStore>,
    ) -> Result<BlobBackend, error::Error> {
        Self::builder(config).store(store).build().await
    }

    /// Create a [`Builder`] to customize the remote store or metrics sink.
    pub fn builder(config: Config) -> Builder {
        Builder {
            config,
            store: None,
            metrics: None,
        }
    }

    /// Returns the backend's configuration
    pub fn config(&self) -> &Config {
        &self.handle.config
    }

    /// Returns the container this backend is bound to
    pub fn container(&self) -> &ContainerHandle {
        self.handle.store.container()
    }

    /// Number of remote operations currently in flight
    pub fn in_flight(&self) -> usize {
        self.handle.scheduler.in_flight()
    }

    /// Highest number of remote operations that were in flight at the same time
    pub fn max_in_flight(&self) -> usize {
        self.handle.scheduler.high_water_mark()
    }
}

#[async_trait]
impl Backend for BlobBackend {
    async fn put(&self, entry: Entry) -> Result<(), error::Error> {
        let handle = &self.handle;
        instrumented(handle, OperationKind::Put, Put::orchestrate(handle, entry)).await
    }

    async fn get(&self, key: &str) -> Result<Option<Entry>, error::Error> {
        let handle = &self.handle;
        instrumented(handle, OperationKind::Get, Get::orchestrate(handle, key)).await
    }

    async fn delete(&self, key: &str) -> Result<(), error::Error> {
        let handle = &self.handle;
        instrumented(handle, OperationKind::Delete, Delete::orchestrate(handle, key)).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, error::Error> {
        let handle = &self.handle;
        instrumented(handle, OperationKind::List, List::orchestrate(handle, prefix)).await
    }
}

/// Fluent style builder for [`BlobBackend`]
#[derive(Debug)]
pub struct Builder {
    config: Config,
    store: Option<Arc<dyn BlobStore>>,
    metrics: Option<SharedMetricsSink>,
}

impl Builder {
    /// Use an explicit remote store instead of the S3 client derived from the config.
    pub fn store(mut self, store: Arc<dyn BlobStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Send operation metrics to `metrics`.
    ///
    /// Default is [`TracingSink`].
    pub fn metrics(mut self, metrics: SharedMetricsSink) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Provision the container and construct the backend.
    ///
    /// Fails without returning a backend if the container can neither be found nor created.
    pub async fn build(self) -> Result<BlobBackend, error::Error> {
        let store = match self.store {
            Some(store) => store,
            None => Arc::new(S3BlobStore::from_config(&self.config).await?),
        };
        provision::ensure_container(store.as_ref(), self.config.provision_timeout()).await?;

        let scheduler = Scheduler::new(*self.config.concurrency());
        tracing::debug!(
            "blob backend ready for container {}, max in-flight operations: {:?}",
            store.container(),
            self.config.concurrency().limit()
        );
        let handle = Arc::new(Handle {
            config: self.config,
            store,
            scheduler,
            metrics: self.metrics.unwrap_or_else(|| Arc::new(TracingSink)),
        });
        Ok(BlobBackend { handle })
    }
}
