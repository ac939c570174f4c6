// Copyright (c) 2026 RBB S.r.l
// opensource@mintlayer.org
// SPDX-License-Identifier: MIT
// Licensed under the MIT License;
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://github.com/mintlayer/mintlayer-core/blob/master/LICENSE
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The daemon configuration file.
//!
//! Every field is optional in the file; command line options take precedence over the file,
//! and the file over built-in defaults.

use std::{fs, net::SocketAddr, path::Path};

use anyhow::{Context, Result};
use middleware::MiddlewareConfig;
use rpc::RpcConfig;
use serde::{Deserialize, Serialize};

use crate::options::RunOptions;

#[must_use]
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MiddlewareConfigFile {
    pub max_retained_jobs: Option<usize>,
    pub event_channel_capacity: Option<usize>,
    /// In seconds.
    pub default_lock_timeout: Option<u64>,
}

impl MiddlewareConfigFile {
    pub fn with_run_options(config: MiddlewareConfigFile, options: &RunOptions) -> Self {
        let MiddlewareConfigFile {
            max_retained_jobs,
            event_channel_capacity,
            default_lock_timeout,
        } = config;

        let defaults = MiddlewareConfig::default();
        let max_retained_jobs = options
            .max_retained_jobs
            .unwrap_or_else(|| max_retained_jobs.unwrap_or(defaults.max_retained_jobs));
        let event_channel_capacity = options
            .event_channel_capacity
            .unwrap_or_else(|| event_channel_capacity.unwrap_or(defaults.event_channel_capacity));
        let default_lock_timeout = options
            .default_lock_timeout
            .or(default_lock_timeout)
            .or(defaults.default_lock_timeout);

        Self {
            max_retained_jobs: Some(max_retained_jobs),
            event_channel_capacity: Some(event_channel_capacity),
            default_lock_timeout,
        }
    }
}

impl From<MiddlewareConfigFile> for MiddlewareConfig {
    fn from(config: MiddlewareConfigFile) -> Self {
        let defaults = MiddlewareConfig::default();
        MiddlewareConfig {
            max_retained_jobs: config.max_retained_jobs.unwrap_or(defaults.max_retained_jobs),
            event_channel_capacity: config
                .event_channel_capacity
                .unwrap_or(defaults.event_channel_capacity),
            default_lock_timeout: config.default_lock_timeout,
        }
    }
}

/// The rpc server configuration.
#[must_use]
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RpcConfigFile {
    /// Address to bind the HTTP and WebSocket listener to.
    pub bind_address: Option<SocketAddr>,

    /// Whether the RPC server is started.
    pub enabled: Option<bool>,
}

impl RpcConfigFile {
    pub fn with_run_options(config: RpcConfigFile, options: &RunOptions) -> Self {
        let RpcConfigFile {
            bind_address,
            enabled,
        } = config;

        let defaults = RpcConfig::default();
        let bind_address = options
            .rpc_bind_address
            .unwrap_or_else(|| bind_address.unwrap_or(defaults.bind_address));
        let enabled = options.rpc_enabled.unwrap_or_else(|| enabled.unwrap_or(defaults.enabled));

        Self {
            bind_address: Some(bind_address),
            enabled: Some(enabled),
        }
    }
}

impl From<RpcConfigFile> for RpcConfig {
    fn from(config: RpcConfigFile) -> Self {
        let defaults = RpcConfig::default();
        RpcConfig {
            bind_address: config.bind_address.unwrap_or(defaults.bind_address),
            enabled: config.enabled.unwrap_or(defaults.enabled),
        }
    }
}

/// The daemon configuration.
#[must_use]
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfigFile {
    pub middleware: Option<MiddlewareConfigFile>,
    pub rpc: Option<RpcConfigFile>,
}

impl DaemonConfigFile {
    fn read_to_string_with_policy(config_path: &Path) -> Result<String> {
        let config_as_str = if config_path.exists() {
            fs::read_to_string(config_path).context(format!(
                "Unable to read config file in {}",
                config_path.display()
            ))?
        } else {
            "".into()
        };
        Ok(config_as_str)
    }

    /// Reads a configuration from the specified path and overrides the provided parameters.
    pub fn read(config_path: &Path, options: &RunOptions) -> Result<Self> {
        let config_as_str = Self::read_to_string_with_policy(config_path)?;

        let DaemonConfigFile { middleware, rpc } =
            toml::from_str(&config_as_str).context("Failed to parse config")?;

        let middleware =
            MiddlewareConfigFile::with_run_options(middleware.unwrap_or_default(), options);
        let rpc = RpcConfigFile::with_run_options(rpc.unwrap_or_default(), options);

        Ok(Self {
            middleware: Some(middleware),
            rpc: Some(rpc),
        })
    }

    pub fn middleware_config(&self) -> MiddlewareConfig {
        self.middleware.clone().unwrap_or_default().into()
    }

    pub fn rpc_config(&self) -> RpcConfig {
        self.rpc.clone().unwrap_or_default().into()
    }
}
