/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! In-memory implementation of the [`BlobStore`] trait.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::{
    BlobStore, ContainerProperties, ListPage, Marker, PublicAccess, RemoteError, RemoteErrorKind,
};
use crate::metrics::instruments::{Counter, Gauge};
use crate::types::ContainerHandle;

/// Remote operations that can be made to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    /// [`BlobStore::upload`]
    Upload,
    /// [`BlobStore::download`]
    Download,
    /// [`BlobStore::delete`]
    Delete,
    /// [`BlobStore::container_properties`]
    ContainerProperties,
    /// [`BlobStore::create_container`]
    CreateContainer,
    /// [`BlobStore::list_page`]
    ListPage,
}

/// A blob store that keeps one container in memory.
///
/// Objects are kept sorted by name so listing pages behave like the real service. The
/// container may start out missing to exercise provisioning. Useful for tests.
#[derive(Debug)]
pub struct InMemoryBlobStore {
    handle: ContainerHandle,
    state: RwLock<State>,
    latency: Option<Duration>,
    injected: Mutex<Vec<(StoreOperation, RemoteErrorKind)>>,
    calls: Counter,
    in_flight: Gauge,
}

#[derive(Debug, Default)]
struct State {
    container: Option<ContainerProperties>,
    objects: BTreeMap<String, Bytes>,
}

impl InMemoryBlobStore {
    /// Create a store whose container already exists.
    pub fn new(handle: ContainerHandle) -> Self {
        let mut store = Self::without_container(handle);
        store.state.get_mut().container = Some(ContainerProperties::default());
        store
    }

    /// Create a store whose container does not exist yet.
    pub fn without_container(handle: ContainerHandle) -> Self {
        Self {
            handle,
            state: RwLock::new(State::default()),
            latency: None,
            injected: Mutex::new(Vec::new()),
            calls: Counter::new(),
            in_flight: Gauge::new(),
        }
    }

    /// Delay every operation by `latency`, making concurrent calls overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail the next call of `operation` with an error of the given kind.
    ///
    /// Injected failures are consumed in the order they were added.
    pub fn fail_next(&self, operation: StoreOperation, kind: RemoteErrorKind) {
        if let Ok(mut injected) = self.injected.lock() {
            injected.push((operation, kind));
        }
    }

    /// Total number of remote operations invoked so far.
    pub fn calls(&self) -> u64 {
        self.calls.value()
    }

    /// Highest number of operations that were ever running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.in_flight.high_water_mark()
    }

    /// Names of all stored objects, sorted.
    pub async fn object_names(&self) -> Vec<String> {
        self.state.read().await.objects.keys().cloned().collect()
    }

    /// Whether the container currently exists.
    pub async fn container_exists(&self) -> bool {
        self.state.read().await.container.is_some()
    }

    async fn enter(&self, operation: StoreOperation) -> Result<InFlight<'_>, RemoteError> {
        self.calls.increment(1);
        let guard = InFlight::new(&self.in_flight);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let injected = self.injected.lock().ok().and_then(|mut injected| {
            let idx = injected.iter().position(|(op, _)| *op == operation)?;
            Some(injected.remove(idx).1)
        });
        match injected {
            Some(kind) => Err(RemoteError::new(
                kind,
                format!("injected failure for {operation:?}"),
            )),
            None => Ok(guard),
        }
    }

    fn container_not_found(&self) -> RemoteError {
        RemoteError::new(
            RemoteErrorKind::ContainerNotFound,
            format!("container {} does not exist", self.handle),
        )
    }
}

/// Marks one operation as running for the lifetime of the value.
struct InFlight<'a> {
    gauge: &'a Gauge,
}

impl<'a> InFlight<'a> {
    fn new(gauge: &'a Gauge) -> Self {
        gauge.increment();
        Self { gauge }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.gauge.decrement();
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    fn container(&self) -> &ContainerHandle {
        &self.handle
    }

    async fn upload(&self, name: &str, data: Bytes) -> Result<(), RemoteError> {
        let _running = self.enter(StoreOperation::Upload).await?;
        let mut state = self.state.write().await;
        if state.container.is_none() {
            return Err(self.container_not_found());
        }
        state.objects.insert(name.to_owned(), data);
        Ok(())
    }

    async fn download(&self, name: &str) -> Result<ByteStream, RemoteError> {
        let _running = self.enter(StoreOperation::Download).await?;
        let state = self.state.read().await;
        if state.container.is_none() {
            return Err(self.container_not_found());
        }
        let data = state.objects.get(name).cloned().ok_or_else(|| {
            RemoteError::new(
                RemoteErrorKind::BlobNotFound,
                format!("blob {name:?} does not exist"),
            )
        })?;
        Ok(ByteStream::from(data))
    }

    async fn delete(&self, name: &str) -> Result<(), RemoteError> {
        let _running = self.enter(StoreOperation::Delete).await?;
        let mut state = self.state.write().await;
        if state.container.is_none() {
            return Err(self.container_not_found());
        }
        match state.objects.remove(name) {
            Some(_) => Ok(()),
            None => Err(RemoteError::new(
                RemoteErrorKind::BlobNotFound,
                format!("blob {name:?} does not exist"),
            )),
        }
    }

    async fn container_properties(&self) -> Result<ContainerProperties, RemoteError> {
        let _running = self.enter(StoreOperation::ContainerProperties).await?;
        let state = self.state.read().await;
        state
            .container
            .clone()
            .ok_or_else(|| self.container_not_found())
    }

    async fn create_container(
        &self,
        access: PublicAccess,
        metadata: HashMap<String, String>,
    ) -> Result<(), RemoteError> {
        let _running = self.enter(StoreOperation::CreateContainer).await?;
        let mut state = self.state.write().await;
        if state.container.is_some() {
            return Err(RemoteError::new(
                RemoteErrorKind::ContainerAlreadyExists,
                format!("container {} already exists", self.handle),
            ));
        }
        state.container = Some(ContainerProperties {
            public_access: access,
            metadata,
        });
        Ok(())
    }

    async fn list_page(
        &self,
        prefix: &str,
        marker: Marker,
        max_results: i32,
    ) -> Result<ListPage, RemoteError> {
        let _running = self.enter(StoreOperation::ListPage).await?;
        let state = self.state.read().await;
        if state.container.is_none() {
            return Err(self.container_not_found());
        }

        let lower = match &marker {
            Marker::Start => Bound::Included(prefix),
            Marker::Token(after) => Bound::Excluded(after.as_str()),
            Marker::Done => return Ok(ListPage::default()),
        };
        let page_size = max_results.max(1) as usize;

        let mut names: Vec<String> = state
            .objects
            .range::<str, _>((lower, Bound::Unbounded))
            .map(|(name, _)| name)
            .take_while(|name| name.starts_with(prefix))
            .take(page_size + 1)
            .cloned()
            .collect();

        let next_marker = if names.len() > page_size {
            names.truncate(page_size);
            Marker::Token(names[page_size - 1].clone())
        } else {
            Marker::Done
        };

        Ok(ListPage { names, next_marker })
    }
}

#[cfg(test)]
mod tests {
    use super::{InMemoryBlobStore, StoreOperation};
    use crate::remote::{BlobStore, Marker, PublicAccess, RemoteErrorKind};
    use crate::types::ContainerHandle;
    use std::collections::HashMap;

    fn store() -> InMemoryBlobStore {
        InMemoryBlobStore::new(ContainerHandle::new("account", "container"))
    }

    #[tokio::test]
    async fn test_upload_and_download() {
        let store = store();
        store.upload("a/b", "hello".into()).await.unwrap();
        let body = store.download("a/b").await.unwrap();
        assert_eq!(&b"hello"[..], &body.collect().await.unwrap().into_bytes()[..]);

        let err = store.download("a/c").await.unwrap_err();
        assert_eq!(&RemoteErrorKind::BlobNotFound, err.kind());
    }

    #[tokio::test]
    async fn test_list_pages() {
        let store = store();
        for name in ["p/1", "p/2", "p/3", "q/1"] {
            store.upload(name, "x".into()).await.unwrap();
        }

        let page1 = store.list_page("p/", Marker::Start, 2).await.unwrap();
        assert_eq!(vec!["p/1", "p/2"], page1.names);
        assert_eq!(Marker::Token("p/2".to_owned()), page1.next_marker);

        let page2 = store.list_page("p/", page1.next_marker, 2).await.unwrap();
        assert_eq!(vec!["p/3"], page2.names);
        assert_eq!(Marker::Done, page2.next_marker);
    }

    #[tokio::test]
    async fn test_missing_container() {
        let store = InMemoryBlobStore::without_container(ContainerHandle::new("a", "c"));
        let err = store.container_properties().await.unwrap_err();
        assert_eq!(&RemoteErrorKind::ContainerNotFound, err.kind());

        store
            .create_container(PublicAccess::None, HashMap::new())
            .await
            .unwrap();
        assert!(store.container_exists().await);

        let err = store
            .create_container(PublicAccess::None, HashMap::new())
            .await
            .unwrap_err();
        assert_eq!(&RemoteErrorKind::ContainerAlreadyExists, err.kind());
    }

    #[tokio::test]
    async fn test_injected_failure_is_consumed_once() {
        let store = store();
        store.fail_next(
            StoreOperation::Upload,
            RemoteErrorKind::Service("ServerBusy".to_owned()),
        );
        assert!(store.upload("k", "v".into()).await.is_err());
        store.upload("k", "v".into()).await.unwrap();
        assert_eq!(2, store.calls());
    }
}
