/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::client::Handle;
use crate::error;
use crate::operation::OperationKind;
use crate::remote::RemoteError;
use crate::types::Entry;

/// Operation struct for fetching a single entry
#[derive(Clone, Default, Debug)]
pub(crate) struct Get;

impl Get {
    /// Download the object stored under `key` into memory.
    ///
    /// A missing object is `Ok(None)`. The permit is held until the whole body has been read.
    pub(crate) async fn orchestrate(
        handle: &Handle,
        key: &str,
    ) -> Result<Option<Entry>, error::Error> {
        let container = handle.container_name();
        let _permit = handle.scheduler.acquire_permit().await?;

        let downloaded = handle.store.download(key).await;
        let body = match error::translate_not_found(OperationKind::Get, key, container, downloaded)? {
            Some(body) => body,
            None => return Ok(None),
        };

        let data = body
            .collect()
            .await
            .map_err(|err| {
                error::remote_failure(OperationKind::Get, key, container, RemoteError::from(err))
            })?
            .into_bytes();
        tracing::trace!("downloaded {} bytes from {key:?}", data.len());

        Ok(Some(Entry::new(key, data)))
    }
}
