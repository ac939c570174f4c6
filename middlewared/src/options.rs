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

//! The daemon command line options.

use std::{ffi::OsString, net::SocketAddr, path::PathBuf};

use clap::{Args, Parser};
use utils::clap_utils;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/middlewared.toml";

/// Storage appliance management middleware daemon
#[derive(Parser, Debug)]
#[clap(mut_args(clap_utils::env_adder("MIDDLEWARED")))]
#[clap(author, version, about)]
pub struct Options {
    /// The path to the configuration file. A missing file means built-in defaults.
    #[clap(short, long = "config", value_name = "PATH")]
    pub config_path: Option<PathBuf>,

    #[clap(flatten)]
    pub run_options: RunOptions,
}

#[derive(Args, Clone, Debug, Default)]
pub struct RunOptions {
    /// Address to bind the RPC server to.
    #[clap(long, value_name = "ADDR")]
    pub rpc_bind_address: Option<SocketAddr>,

    /// Whether the RPC server is started.
    #[clap(long, value_name = "VAL")]
    pub rpc_enabled: Option<bool>,

    /// How many finished jobs are kept for inspection.
    #[clap(long, value_name = "COUNT")]
    pub max_retained_jobs: Option<usize>,

    /// Events buffered per subscription before the event source waits for the client.
    #[clap(long, value_name = "COUNT")]
    pub event_channel_capacity: Option<usize>,

    /// How long a job may wait for its lock when its method sets no limit, in seconds.
    #[clap(long, value_name = "SECS")]
    pub default_lock_timeout: Option<u64>,
}

impl Options {
    /// Constructs an instance by parsing the given arguments.
    ///
    /// Process is terminated on error.
    pub fn from_args<A: Into<OsString> + Clone>(args: impl IntoIterator<Item = A>) -> Self {
        Parser::parse_from(args)
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_path.clone().unwrap_or_else(|| DEFAULT_CONFIG_PATH.into())
    }
}
