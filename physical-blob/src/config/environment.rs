/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::str::FromStr;

use crate::error;

/// A known cloud environment, determining the default storage service endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloudEnvironment {
    /// The global public cloud
    #[default]
    PublicCloud,
    /// US government cloud
    UsGovernmentCloud,
    /// China cloud
    ChinaCloud,
    /// German cloud
    GermanCloud,
}

impl CloudEnvironment {
    /// The configuration name of this environment
    pub const fn name(&self) -> &'static str {
        match self {
            CloudEnvironment::PublicCloud => "AzurePublicCloud",
            CloudEnvironment::UsGovernmentCloud => "AzureUSGovernmentCloud",
            CloudEnvironment::ChinaCloud => "AzureChinaCloud",
            CloudEnvironment::GermanCloud => "AzureGermanCloud",
        }
    }

    /// DNS suffix of the storage service in this environment
    pub const fn storage_endpoint_suffix(&self) -> &'static str {
        match self {
            CloudEnvironment::PublicCloud => "core.windows.net",
            CloudEnvironment::UsGovernmentCloud => "core.usgovcloudapi.net",
            CloudEnvironment::ChinaCloud => "core.chinacloudapi.cn",
            CloudEnvironment::GermanCloud => "core.cloudapi.de",
        }
    }

    /// The blob service endpoint of `account` in this environment
    pub fn blob_endpoint(&self, account: &str) -> String {
        format!("https://{account}.blob.{}", self.storage_endpoint_suffix())
    }
}

impl fmt::Display for CloudEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CloudEnvironment {
    type Err = error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let known = [
            CloudEnvironment::PublicCloud,
            CloudEnvironment::UsGovernmentCloud,
            CloudEnvironment::ChinaCloud,
            CloudEnvironment::GermanCloud,
        ];
        known
            .into_iter()
            .find(|env| env.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                error::invalid_config(format!("unknown cloud environment name {s:?}"))
            })
    }
}
