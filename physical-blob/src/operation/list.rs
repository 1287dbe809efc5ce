/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::BTreeSet;
use std::pin::pin;

use futures_util::{Stream, TryStreamExt};

use crate::client::Handle;
use crate::error;
use crate::key;
use crate::operation::OperationKind;
use crate::remote::{BlobStore, ListPage, Marker, RemoteError};
use crate::MAX_LIST_RESULTS;

/// Operation struct for listing the keys one level below a prefix
#[derive(Clone, Default, Debug)]
pub(crate) struct List;

impl List {
    /// Walk every page of object names under `prefix` and collapse them into one level of
    /// leaf and directory keys.
    ///
    /// A single permit covers the whole walk. If any page fails nothing is returned but the
    /// error.
    pub(crate) async fn orchestrate(
        handle: &Handle,
        prefix: &str,
    ) -> Result<Vec<String>, error::Error> {
        let _permit = handle.scheduler.acquire_permit().await?;

        let mut keys = BTreeSet::new();
        let mut num_pages = 0;
        let mut pages = pin!(pages(handle.store.as_ref(), prefix, MAX_LIST_RESULTS));
        while let Some(page) = pages.try_next().await.map_err(|err| {
            error::remote_failure(OperationKind::List, prefix, handle.container_name(), err)
        })? {
            num_pages += 1;
            keys.extend(
                page.names
                    .iter()
                    .filter_map(|name| key::list_key(prefix, name))
                    .map(|k| k.as_str().to_owned()),
            );
        }

        tracing::trace!(
            "listed {} keys under {prefix:?} from {num_pages} pages",
            keys.len()
        );
        Ok(keys.into_iter().collect())
    }
}

/// Lazily fetch pages of object names under `prefix` until the cursor is exhausted.
fn pages<'a>(
    store: &'a dyn BlobStore,
    prefix: &'a str,
    page_size: i32,
) -> impl Stream<Item = Result<ListPage, RemoteError>> + 'a {
    futures_util::stream::try_unfold(Marker::Start, move |marker| async move {
        if !marker.not_done() {
            return Ok(None);
        }
        let page = store.list_page(prefix, marker, page_size).await?;
        let next_marker = page.next_marker.clone();
        Ok(Some((page, next_marker)))
    })
}
