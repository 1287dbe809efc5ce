/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::config::{Builder, CloudEnvironment, Config};
use crate::error;
use crate::types::ConcurrencySetting;

/// Environment variable holding the container name
pub const ENV_CONTAINER: &str = "AZURE_BLOB_CONTAINER";
/// Environment variable holding the storage account name
pub const ENV_ACCOUNT_NAME: &str = "AZURE_ACCOUNT_NAME";
/// Environment variable holding the storage account key
pub const ENV_ACCOUNT_KEY: &str = "AZURE_ACCOUNT_KEY";
/// Environment variable holding the cloud environment name
pub const ENV_ENVIRONMENT: &str = "AZURE_ENVIRONMENT";
/// Environment variable holding an explicit service endpoint
pub const ENV_ARM_ENDPOINT: &str = "AZURE_ARM_ENDPOINT";

/// Load backend [`Config`] from a settings map and the environment.
///
/// For every setting a non-empty environment variable takes precedence over the value in the
/// map. Empty values count as unset. `max_parallel` is only read from the map.
///
/// | key            | environment variable   |
/// |----------------|------------------------|
/// | `container`    | `AZURE_BLOB_CONTAINER` |
/// | `accountName`  | `AZURE_ACCOUNT_NAME`   |
/// | `accountKey`   | `AZURE_ACCOUNT_KEY`    |
/// | `environment`  | `AZURE_ENVIRONMENT`    |
/// | `arm_endpoint` | `AZURE_ARM_ENDPOINT`   |
/// | `max_parallel` |                        |
#[derive(Default, Debug)]
pub struct ConfigLoader {
    builder: Builder,
}

impl ConfigLoader {
    /// Values of this many bytes or more are rejected.
    ///
    /// Default is 4 MiB.
    pub fn max_blob_size(mut self, max_blob_size: usize) -> Self {
        self.builder = self.builder.max_blob_size(max_blob_size);
        self
    }

    /// Time allowed for probing and creating the container at startup.
    ///
    /// Default is 5 seconds.
    pub fn provision_timeout(mut self, timeout: Duration) -> Self {
        self.builder = self.builder.provision_timeout(timeout);
        self
    }

    /// Resolve the configuration from `conf` and the process environment.
    pub fn load(self, conf: &HashMap<String, String>) -> Result<Config, error::Error> {
        self.load_with_env(conf, |name| std::env::var(name).ok())
    }

    /// Resolve the configuration from `conf` and the given environment lookup.
    pub fn load_with_env<F>(
        self,
        conf: &HashMap<String, String>,
        env: F,
    ) -> Result<Config, error::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str, var: &str| -> Option<String> {
            env(var)
                .filter(|v| !v.is_empty())
                .or_else(|| conf.get(name).filter(|v| !v.is_empty()).cloned())
        };

        let mut builder = self.builder;
        if let Some(container) = lookup("container", ENV_CONTAINER) {
            builder = builder.container(container);
        }
        if let Some(account_name) = lookup("accountName", ENV_ACCOUNT_NAME) {
            builder = builder.account_name(account_name);
        }
        if let Some(account_key) = lookup("accountKey", ENV_ACCOUNT_KEY) {
            builder = builder.account_key(account_key);
        }
        if let Some(name) = lookup("environment", ENV_ENVIRONMENT) {
            let environment = CloudEnvironment::from_str(&name)?;
            builder = builder.environment(environment);
        }
        if let Some(endpoint) = lookup("arm_endpoint", ENV_ARM_ENDPOINT) {
            builder = builder.endpoint(endpoint);
        }
        if let Some(max_parallel) = conf.get("max_parallel") {
            let concurrency = parse_max_parallel(max_parallel)?;
            tracing::debug!("max_parallel set to {max_parallel}");
            builder = builder.concurrency(concurrency);
        }

        builder.build()
    }
}

fn parse_max_parallel(value: &str) -> Result<ConcurrencySetting, error::Error> {
    value
        .trim()
        .parse::<usize>()
        .map(ConcurrencySetting::from)
        .map_err(|err| {
            error::invalid_config(format!(
                "failed parsing max_parallel parameter {value:?}: {err}"
            ))
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{ConfigLoader, ENV_ACCOUNT_KEY, ENV_CONTAINER, ENV_ENVIRONMENT};
    use crate::config::CloudEnvironment;
    use crate::error::ErrorKind;
    use crate::types::ConcurrencySetting;

    fn conf(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn base() -> HashMap<String, String> {
        conf(&[
            ("container", "vault"),
            ("accountName", "acct"),
            ("accountKey", "key"),
        ])
    }

    #[test]
    fn test_map_only() {
        let mut conf = base();
        conf.insert("max_parallel".to_owned(), "16".to_owned());
        conf.insert("environment".to_owned(), "AzureGermanCloud".to_owned());

        let config = ConfigLoader::default().load_with_env(&conf, no_env).unwrap();
        assert_eq!("vault", config.container().name());
        assert_eq!(CloudEnvironment::GermanCloud, config.environment());
        assert_eq!("https://acct.blob.core.cloudapi.de", config.endpoint());
        assert_eq!(&ConcurrencySetting::Explicit(16), config.concurrency());
    }

    #[test]
    fn test_environment_takes_precedence() {
        let env = |name: &str| match name {
            ENV_CONTAINER => Some("from-env".to_owned()),
            // empty values are ignored
            ENV_ACCOUNT_KEY => Some(String::new()),
            ENV_ENVIRONMENT => Some("AzureChinaCloud".to_owned()),
            _ => None,
        };
        let config = ConfigLoader::default().load_with_env(&base(), env).unwrap();
        assert_eq!("from-env", config.container().name());
        assert_eq!("key", config.account_key());
        assert_eq!(CloudEnvironment::ChinaCloud, config.environment());
    }

    #[test]
    fn test_environment_fills_missing() {
        let env = |name: &str| (name == ENV_CONTAINER).then(|| "from-env".to_owned());
        let conf = conf(&[("accountName", "acct"), ("accountKey", "key")]);
        let config = ConfigLoader::default().load_with_env(&conf, env).unwrap();
        assert_eq!("from-env", config.container().name());
    }

    #[test]
    fn test_missing_container() {
        let conf = conf(&[("accountName", "acct"), ("accountKey", "key")]);
        let err = ConfigLoader::default()
            .load_with_env(&conf, no_env)
            .unwrap_err();
        assert_eq!(&ErrorKind::ConfigInvalid, err.kind());
        assert!(std::error::Error::source(&err)
            .unwrap()
            .to_string()
            .contains("'container'"));
    }

    #[test]
    fn test_invalid_max_parallel() {
        for bad in ["abc", "-1", "1.5", ""] {
            let mut conf = base();
            conf.insert("max_parallel".to_owned(), bad.to_owned());
            let err = ConfigLoader::default()
                .load_with_env(&conf, no_env)
                .unwrap_err();
            assert_eq!(&ErrorKind::ConfigInvalid, err.kind(), "value {bad:?}");
        }
    }

    #[test]
    fn test_zero_max_parallel_is_unbounded() {
        let mut conf = base();
        conf.insert("max_parallel".to_owned(), "0".to_owned());
        let config = ConfigLoader::default().load_with_env(&conf, no_env).unwrap();
        assert_eq!(None, config.concurrency().limit());
    }

    #[test]
    fn test_unknown_environment() {
        let mut conf = base();
        conf.insert("environment".to_owned(), "Nowhere".to_owned());
        let err = ConfigLoader::default()
            .load_with_env(&conf, no_env)
            .unwrap_err();
        assert_eq!(&ErrorKind::ConfigInvalid, err.kind());
    }
}
