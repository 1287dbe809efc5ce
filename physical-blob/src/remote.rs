/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use async_trait::async_trait;
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;

use crate::error::BoxError;
use crate::types::ContainerHandle;

/// In-memory blob store
#[cfg(any(test, feature = "test-util"))]
pub mod memory;

/// S3 compatible blob store
pub mod s3;

/// Operations of the remote object store a backend is built on.
///
/// An implementation is bound to exactly one container. It must classify every failure into a
/// [`RemoteErrorKind`] so that callers never need to inspect the underlying client's errors.
#[async_trait]
pub trait BlobStore: fmt::Debug + Send + Sync {
    /// The container this store is bound to
    fn container(&self) -> &ContainerHandle;

    /// Replace the object `name` with `data`.
    async fn upload(&self, name: &str, data: Bytes) -> Result<(), RemoteError>;

    /// Open the body of the object `name`.
    async fn download(&self, name: &str) -> Result<ByteStream, RemoteError>;

    /// Delete the object `name` together with any snapshots of it.
    async fn delete(&self, name: &str) -> Result<(), RemoteError>;

    /// Fetch the properties of the container, fails with
    /// [`RemoteErrorKind::ContainerNotFound`] if it does not exist.
    async fn container_properties(&self) -> Result<ContainerProperties, RemoteError>;

    /// Create the container.
    async fn create_container(
        &self,
        access: PublicAccess,
        metadata: HashMap<String, String>,
    ) -> Result<(), RemoteError>;

    /// Fetch one page of object names starting with `prefix`.
    async fn list_page(
        &self,
        prefix: &str,
        marker: Marker,
        max_results: i32,
    ) -> Result<ListPage, RemoteError>;
}

/// Pagination cursor of a list operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Marker {
    /// Start from the first object
    #[default]
    Start,
    /// Continue after a previous page
    Token(String),
    /// No further pages
    Done,
}

impl Marker {
    /// Whether there are more pages to fetch
    pub fn not_done(&self) -> bool {
        !matches!(self, Marker::Done)
    }

    /// Continuation token to send with the next request
    pub fn token(&self) -> Option<&str> {
        match self {
            Marker::Token(token) => Some(token),
            _ => None,
        }
    }
}

/// One page of object names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListPage {
    /// Full names of the objects in this page
    pub names: Vec<String>,
    /// Where the next page starts
    pub next_marker: Marker,
}

/// Anonymous read access granted on a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublicAccess {
    /// No anonymous access
    #[default]
    None,
    /// Anonymous read access to objects
    Blob,
    /// Anonymous read access to objects and listing
    Container,
}

/// Properties of an existing container.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContainerProperties {
    /// Anonymous access level
    pub public_access: PublicAccess,
    /// User defined metadata
    pub metadata: HashMap<String, String>,
}

/// Classified failure of a remote operation.
#[derive(Debug)]
pub struct RemoteError {
    kind: RemoteErrorKind,
    source: BoxError,
}

/// The reasons a remote operation can fail, as far as the backend cares.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum RemoteErrorKind {
    /// The object does not exist
    BlobNotFound,
    /// The container does not exist
    ContainerNotFound,
    /// The container was created by someone else first
    ContainerAlreadyExists,
    /// Any other service failure, with its machine readable reason code
    Service(String),
    /// The request never produced a service response (network, timeout, body read)
    Transport,
}

impl RemoteError {
    /// Create a new remote error of the given kind
    pub fn new<E>(kind: RemoteErrorKind, err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self {
            kind,
            source: err.into(),
        }
    }

    /// The classified reason for this failure
    pub fn kind(&self) -> &RemoteErrorKind {
        &self.kind
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            RemoteErrorKind::BlobNotFound => write!(f, "blob not found"),
            RemoteErrorKind::ContainerNotFound => write!(f, "container not found"),
            RemoteErrorKind::ContainerAlreadyExists => write!(f, "container already exists"),
            RemoteErrorKind::Service(code) => write!(f, "service error ({code})"),
            RemoteErrorKind::Transport => write!(f, "transport failure"),
        }
    }
}

impl std::error::Error for RemoteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

impl From<aws_smithy_types::byte_stream::error::Error> for RemoteError {
    fn from(value: aws_smithy_types::byte_stream::error::Error) -> Self {
        Self::new(RemoteErrorKind::Transport, value)
    }
}
