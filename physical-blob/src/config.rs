/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::time::Duration;

use crate::error;
use crate::types::{ConcurrencySetting, ContainerHandle};
use crate::MAX_BLOB_SIZE;

/// Known cloud environments
pub mod environment;

/// Configuration resolution from a settings map and the environment
pub mod loader;

pub use environment::CloudEnvironment;

/// Default time allowed for probing and creating the container at startup.
const DEFAULT_PROVISION_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolved configuration for a [`BlobBackend`](crate::client::BlobBackend).
///
/// Immutable once built.
#[derive(Clone)]
pub struct Config {
    container: ContainerHandle,
    account_key: String,
    environment: CloudEnvironment,
    endpoint: String,
    explicit_endpoint: bool,
    concurrency: ConcurrencySetting,
    max_blob_size: usize,
    provision_timeout: Duration,
}

impl Config {
    /// Create a new `Config` builder
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// The container (and owning account) the backend is bound to
    pub fn container(&self) -> &ContainerHandle {
        &self.container
    }

    /// The shared key of the storage account
    pub fn account_key(&self) -> &str {
        &self.account_key
    }

    /// The cloud environment the account lives in
    pub fn environment(&self) -> CloudEnvironment {
        self.environment
    }

    /// The blob service endpoint requests are sent to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether the endpoint was set explicitly rather than derived from the environment
    pub fn has_explicit_endpoint(&self) -> bool {
        self.explicit_endpoint
    }

    /// The maximum number of concurrent remote operations
    pub fn concurrency(&self) -> &ConcurrencySetting {
        &self.concurrency
    }

    /// Values must be strictly smaller than this many bytes
    pub fn max_blob_size(&self) -> usize {
        self.max_blob_size
    }

    /// Time allowed for probing and creating the container at startup
    pub fn provision_timeout(&self) -> Duration {
        self.provision_timeout
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("container", &self.container)
            .field("account_key", &"** redacted **")
            .field("environment", &self.environment)
            .field("endpoint", &self.endpoint)
            .field("explicit_endpoint", &self.explicit_endpoint)
            .field("concurrency", &self.concurrency)
            .field("max_blob_size", &self.max_blob_size)
            .field("provision_timeout", &self.provision_timeout)
            .finish()
    }
}

/// Fluent style builder for [Config]
#[derive(Clone, Default)]
pub struct Builder {
    container: Option<String>,
    account_name: Option<String>,
    account_key: Option<String>,
    environment: CloudEnvironment,
    endpoint: Option<String>,
    concurrency: ConcurrencySetting,
    max_blob_size: Option<usize>,
    provision_timeout: Option<Duration>,
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("container", &self.container)
            .field("account_name", &self.account_name)
            .field("account_key", &self.account_key.as_ref().map(|_| "** redacted **"))
            .field("environment", &self.environment)
            .field("endpoint", &self.endpoint)
            .field("concurrency", &self.concurrency)
            .field("max_blob_size", &self.max_blob_size)
            .field("provision_timeout", &self.provision_timeout)
            .finish()
    }
}

impl Builder {
    /// Name of the container to store entries in. Required.
    pub fn container(mut self, name: impl Into<String>) -> Self {
        self.container = Some(name.into());
        self
    }

    /// Name of the storage account owning the container. Required.
    pub fn account_name(mut self, name: impl Into<String>) -> Self {
        self.account_name = Some(name.into());
        self
    }

    /// Shared key of the storage account. Required.
    pub fn account_key(mut self, key: impl Into<String>) -> Self {
        self.account_key = Some(key.into());
        self
    }

    /// The cloud environment used to derive the service endpoint.
    ///
    /// Default is [`CloudEnvironment::PublicCloud`].
    pub fn environment(mut self, environment: CloudEnvironment) -> Self {
        self.environment = environment;
        self
    }

    /// Explicit service endpoint, overrides the one derived from the environment.
    ///
    /// Must be an `http://` or `https://` URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the maximum number of concurrent remote operations.
    ///
    /// Default is [`ConcurrencySetting::Unbounded`].
    pub fn concurrency(mut self, concurrency: ConcurrencySetting) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Values of this many bytes or more are rejected.
    ///
    /// Default is 4 MiB.
    pub fn max_blob_size(mut self, max_blob_size: usize) -> Self {
        self.max_blob_size = Some(max_blob_size);
        self
    }

    /// Time allowed for probing and creating the container at startup.
    ///
    /// Default is 5 seconds.
    pub fn provision_timeout(mut self, timeout: Duration) -> Self {
        self.provision_timeout = Some(timeout);
        self
    }

    /// Consumes the builder and constructs a [`Config`](crate::config::Config)
    ///
    /// Fails if a required setting is missing or the endpoint is not a URL.
    pub fn build(self) -> Result<Config, error::Error> {
        let container = required(self.container, "container")?;
        let account_name = required(self.account_name, "accountName")?;
        let account_key = required(self.account_key, "accountKey")?;

        let (endpoint, explicit_endpoint) = match self.endpoint.filter(|e| !e.is_empty()) {
            Some(endpoint) => (validate_endpoint(endpoint)?, true),
            None => (self.environment.blob_endpoint(&account_name), false),
        };

        Ok(Config {
            container: ContainerHandle::new(account_name, container),
            account_key,
            environment: self.environment,
            endpoint,
            explicit_endpoint,
            concurrency: self.concurrency,
            max_blob_size: self.max_blob_size.unwrap_or(MAX_BLOB_SIZE),
            provision_timeout: self.provision_timeout.unwrap_or(DEFAULT_PROVISION_TIMEOUT),
        })
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, error::Error> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| error::invalid_config(format!("'{name}' must be set")))
}

fn validate_endpoint(endpoint: String) -> Result<String, error::Error> {
    let has_host = ["https://", "http://"]
        .iter()
        .filter_map(|scheme| endpoint.strip_prefix(scheme))
        .any(|rest| !rest.trim_matches('/').is_empty());
    if !has_host {
        return Err(error::invalid_config(format!(
            "endpoint {endpoint:?} is not an http(s) URL"
        )));
    }
    Ok(endpoint.trim_end_matches('/').to_owned())
}
