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

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:6000";

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6000))
}

fn default_enabled() -> bool {
    true
}

/// The rpc configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RpcConfig {
    /// Address to bind the HTTP and WebSocket listener to.
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Whether the RPC server is started at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            enabled: default_enabled(),
        }
    }
}
