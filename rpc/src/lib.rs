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

//! JSON-RPC transport for the middleware: one listener serving HTTP and WebSocket clients.

mod config;
mod error;
mod server;

use std::net::SocketAddr;

use jsonrpsee::server::{RegisterMethodError, Server, ServerHandle};
use logging::log;
use middleware::Middleware;

pub use config::{RpcConfig, DEFAULT_BIND_ADDRESS};
pub use error::{error_code, handle_result, to_rpc_error, RpcResult, SubscriptionResult};
pub use jsonrpsee::server::{Methods, RpcModule};
pub use server::{CoreRpcImpl, CoreRpcServer};

/// The `core_*` methods for `middleware`, without a server around them.
pub fn core_module(middleware: Middleware) -> RpcModule<CoreRpcImpl> {
    CoreRpcImpl::new(middleware).into_rpc()
}

/// The RPC server builder. Used to populate the RPC server with method handlers.
pub struct Builder {
    bind_address: Option<SocketAddr>,
    methods: Methods,
}

impl Builder {
    /// New builder with no methods. `None` disables the server.
    pub fn new_empty(bind_address: Option<SocketAddr>) -> Self {
        Self {
            bind_address,
            methods: Methods::new(),
        }
    }

    /// New builder pre-populated with the `core_*` methods.
    pub fn new(config: &RpcConfig, middleware: Middleware) -> Result<Self, RegisterMethodError> {
        let bind_address = config.enabled.then_some(config.bind_address);
        Self::new_empty(bind_address).register(core_module(middleware))
    }

    /// Add method handlers to the RPC server.
    pub fn register(mut self, methods: impl Into<Methods>) -> Result<Self, RegisterMethodError> {
        self.methods.merge(methods)?;
        Ok(self)
    }

    /// Start listening.
    pub async fn build(self) -> anyhow::Result<Rpc> {
        Rpc::new(self.bind_address.as_ref(), self.methods).await
    }
}

/// A running RPC server, or a disabled one.
pub struct Rpc {
    server: Option<(SocketAddr, ServerHandle)>,
}

impl Rpc {
    async fn new(bind_address: Option<&SocketAddr>, methods: Methods) -> anyhow::Result<Self> {
        let server = match bind_address {
            Some(bind_address) => {
                let server = Server::builder().build(bind_address).await?;
                let address = server.local_addr()?;
                let handle = server.start(methods);
                log::info!("RPC server listening on {address}");
                Some((address, handle))
            }
            None => {
                log::info!("RPC server disabled");
                None
            }
        };

        Ok(Self { server })
    }

    pub fn address(&self) -> Option<&SocketAddr> {
        self.server.as_ref().map(|(address, _)| address)
    }

    /// Stop accepting requests and wait for the server to wind down.
    pub async fn shutdown(self) {
        if let Some((address, handle)) = self.server {
            match handle.stop() {
                Ok(()) => handle.stopped().await,
                Err(e) => log::error!("RPC server on {address} was already stopped: {e}"),
            }
        }
    }
}
