/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;

use crate::operation::OperationKind;
use crate::remote::{RemoteError, RemoteErrorKind};

/// A boxed error that is `Send` and `Sync`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by this library
///
/// NOTE: Walk [`std::error::Error::source`] to display the entire cause chain, the remote
/// failure is always kept as the innermost source.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: BoxError,
}

/// General categories of backend errors.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A required setting is missing or a setting could not be parsed
    ConfigInvalid,

    /// The value of an entry is larger than the supported maximum object size
    SizeLimitExceeded,

    /// The remote store rejected the operation
    RemoteService,

    /// Network, timeout or body read failure talking to the remote store
    Transport,

    /// Some kind of internal runtime issue (e.g. closed semaphore)
    RuntimeError,
}

impl Error {
    /// Creates a new backend [`Error`] from a known kind of error as well as an arbitrary error
    /// source.
    pub fn new<E>(kind: ErrorKind, err: E) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            kind,
            source: err.into(),
        }
    }

    /// Returns the corresponding [`ErrorKind`] for this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::ConfigInvalid => write!(f, "invalid configuration"),
            ErrorKind::SizeLimitExceeded => write!(f, "size limit exceeded"),
            ErrorKind::RemoteService => write!(f, "remote service error"),
            ErrorKind::Transport => write!(f, "transport error"),
            ErrorKind::RuntimeError => write!(f, "runtime error"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

impl From<tokio::sync::AcquireError> for Error {
    fn from(value: tokio::sync::AcquireError) -> Self {
        Self::new(ErrorKind::RuntimeError, value)
    }
}

pub(crate) fn invalid_config<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::ConfigInvalid, err)
}

pub(crate) fn size_limit_exceeded(len: usize, max: usize) -> Error {
    Error::new(
        ErrorKind::SizeLimitExceeded,
        format!("value of {len} bytes is not smaller than the supported limit of {max} bytes"),
    )
}

/// Remote failure annotated with the operation, key and container it happened on.
#[derive(Debug)]
pub(crate) struct OperationFailed {
    operation: OperationKind,
    key: String,
    container: String,
    source: RemoteError,
}

impl fmt::Display for OperationFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed for {:?} in container {:?}",
            self.operation, self.key, self.container
        )
    }
}

impl std::error::Error for OperationFailed {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Wrap a remote failure that is not translated into a value.
pub(crate) fn remote_failure(
    operation: OperationKind,
    key: &str,
    container: &str,
    err: RemoteError,
) -> Error {
    let kind = match err.kind() {
        RemoteErrorKind::Transport => ErrorKind::Transport,
        _ => ErrorKind::RemoteService,
    };
    Error::new(
        kind,
        OperationFailed {
            operation,
            key: key.to_owned(),
            container: container.to_owned(),
            source: err,
        },
    )
}

/// Translate the result of a remote call for operations where a missing object is not an error.
///
/// `BlobNotFound` becomes `Ok(None)`, every other failure is wrapped with context.
pub(crate) fn translate_not_found<T>(
    operation: OperationKind,
    key: &str,
    container: &str,
    result: Result<T, RemoteError>,
) -> Result<Option<T>, Error> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if *err.kind() == RemoteErrorKind::BlobNotFound => {
            tracing::trace!("{operation} of {key:?} found no object");
            Ok(None)
        }
        Err(err) => Err(remote_failure(operation, key, container, err)),
    }
}
