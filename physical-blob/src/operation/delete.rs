/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::client::Handle;
use crate::error;
use crate::operation::OperationKind;

/// Operation struct for deleting a single entry
#[derive(Clone, Default, Debug)]
pub(crate) struct Delete;

impl Delete {
    /// Delete the object stored under `key` along with its snapshots.
    ///
    /// Deleting a missing object succeeds.
    pub(crate) async fn orchestrate(handle: &Handle, key: &str) -> Result<(), error::Error> {
        let _permit = handle.scheduler.acquire_permit().await?;
        let deleted = handle.store.delete(key).await;
        error::translate_not_found(OperationKind::Delete, key, handle.container_name(), deleted)?;
        Ok(())
    }
}
