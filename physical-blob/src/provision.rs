/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::error::{self, ErrorKind};
use crate::remote::{BlobStore, PublicAccess, RemoteError, RemoteErrorKind};
use crate::types::ContainerHandle;

/// Make sure the container of `store` exists, creating it if needed.
///
/// The container is created without public access and with empty metadata. Losing a creation
/// race against another backend instance is not an error. Probe and creation together must
/// finish within `timeout`.
pub(crate) async fn ensure_container(
    store: &dyn BlobStore,
    timeout: Duration,
) -> Result<(), error::Error> {
    let container = store.container().clone();
    match tokio::time::timeout(timeout, probe_or_create(store)).await {
        Ok(result) => result,
        Err(_) => Err(error::Error::new(
            ErrorKind::Transport,
            format!("provisioning container {container} timed out after {timeout:?}"),
        )),
    }
}

async fn probe_or_create(store: &dyn BlobStore) -> Result<(), error::Error> {
    let container = store.container();
    let err = match store.container_properties().await {
        Ok(_) => {
            tracing::debug!("container {container} exists");
            return Ok(());
        }
        Err(err) => err,
    };

    if *err.kind() != RemoteErrorKind::ContainerNotFound {
        return Err(ProvisionFailed::new(Step::Probe, container, err).into());
    }

    tracing::info!("container {container} not found, creating it");
    match store
        .create_container(PublicAccess::None, HashMap::new())
        .await
    {
        Ok(()) => Ok(()),
        Err(err) if *err.kind() == RemoteErrorKind::ContainerAlreadyExists => {
            tracing::debug!("container {container} was created concurrently");
            Ok(())
        }
        Err(err) => Err(ProvisionFailed::new(Step::Create, container, err).into()),
    }
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Probe,
    Create,
}

/// Remote failure while provisioning the container.
#[derive(Debug)]
struct ProvisionFailed {
    step: Step,
    container: ContainerHandle,
    source: RemoteError,
}

impl ProvisionFailed {
    fn new(step: Step, container: &ContainerHandle, source: RemoteError) -> Self {
        Self {
            step,
            container: container.clone(),
            source,
        }
    }
}

impl fmt::Display for ProvisionFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.step {
            Step::Probe => write!(f, "failed to get properties for container {}", self.container),
            Step::Create => write!(f, "failed to create container {}", self.container),
        }
    }
}

impl std::error::Error for ProvisionFailed {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl From<ProvisionFailed> for error::Error {
    fn from(value: ProvisionFailed) -> Self {
        let kind = match value.source.kind() {
            RemoteErrorKind::Transport => ErrorKind::Transport,
            _ => ErrorKind::RemoteService,
        };
        error::Error::new(kind, value)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::ensure_container;
    use crate::error::ErrorKind;
    use crate::remote::memory::{InMemoryBlobStore, StoreOperation};
    use crate::remote::{BlobStore, PublicAccess, RemoteErrorKind};
    use crate::types::ContainerHandle;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn handle() -> ContainerHandle {
        ContainerHandle::new("account", "vault")
    }

    #[tokio::test]
    async fn test_existing_container() {
        let store = InMemoryBlobStore::new(handle());
        ensure_container(&store, TIMEOUT).await.unwrap();
        // probe only
        assert_eq!(1, store.calls());
    }

    #[tokio::test]
    async fn test_creates_missing_container() {
        let store = InMemoryBlobStore::without_container(handle());
        ensure_container(&store, TIMEOUT).await.unwrap();

        let properties = store.container_properties().await.unwrap();
        assert_eq!(PublicAccess::None, properties.public_access);
        assert!(properties.metadata.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_creator() {
        // the probe misses the container but creation finds it already there
        let store = InMemoryBlobStore::new(handle());
        store.fail_next(
            StoreOperation::ContainerProperties,
            RemoteErrorKind::ContainerNotFound,
        );
        ensure_container(&store, TIMEOUT).await.unwrap();
        assert_eq!(2, store.calls());
    }

    #[tokio::test]
    async fn test_probe_failure_is_fatal() {
        let store = InMemoryBlobStore::without_container(handle());
        store.fail_next(
            StoreOperation::ContainerProperties,
            RemoteErrorKind::Service("AuthenticationFailed".to_owned()),
        );
        let err = ensure_container(&store, TIMEOUT).await.unwrap_err();
        assert_eq!(&ErrorKind::RemoteService, err.kind());
        assert!(!store.container_exists().await);
    }

    #[tokio::test]
    async fn test_create_failure_is_fatal() {
        let store = InMemoryBlobStore::without_container(handle());
        store.fail_next(StoreOperation::CreateContainer, RemoteErrorKind::Transport);
        let err = ensure_container(&store, TIMEOUT).await.unwrap_err();
        assert_eq!(&ErrorKind::Transport, err.kind());
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_timeout() {
        let store = InMemoryBlobStore::new(handle()).with_latency(Duration::from_secs(10));
        let err = ensure_container(&store, TIMEOUT).await.unwrap_err();
        assert_eq!(&ErrorKind::Transport, err.kind());
    }
}
