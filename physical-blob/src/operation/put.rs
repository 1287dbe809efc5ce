/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::client::Handle;
use crate::error;
use crate::operation::OperationKind;
use crate::types::Entry;

/// Operation struct for storing a single entry
#[derive(Clone, Default, Debug)]
pub(crate) struct Put;

impl Put {
    /// Upload `entry`, replacing any object stored under the same key.
    ///
    /// Values that are too large are rejected before a permit is requested.
    pub(crate) async fn orchestrate(handle: &Handle, entry: Entry) -> Result<(), error::Error> {
        let Entry { key, value } = entry;
        let max_blob_size = handle.config.max_blob_size();
        if value.len() >= max_blob_size {
            return Err(error::size_limit_exceeded(value.len(), max_blob_size));
        }

        let _permit = handle.scheduler.acquire_permit().await?;
        tracing::trace!("uploading {} bytes to {key:?}", value.len());
        handle.store.upload(&key, value).await.map_err(|err| {
            error::remote_failure(OperationKind::Put, &key, handle.container_name(), err)
        })
    }
}
