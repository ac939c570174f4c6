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

//! The middleware daemon: configuration, built-in plugins and the RPC front end.

pub mod config_file;
pub mod options;
pub mod plugins;
pub mod shutdown;

use std::{future::Future, net::SocketAddr};

use anyhow::Context;
use logging::log;
use middleware::{Middleware, MiddlewareBuilder, MiddlewareConfig};
use serde_json::json;
use utils::tap_log::TapLog;

use config_file::DaemonConfigFile;
use options::Options;
use shutdown::ShutdownReason;

/// Hook fired once every plugin is registered and the RPC server listens.
pub const READY_EVENT: &str = "system.ready";

/// Hook fired before the daemon stops serving.
pub const SHUTDOWN_EVENT: &str = "system.shutdown";

/// Middleware with every built-in plugin registered.
pub fn build_middleware(config: MiddlewareConfig) -> anyhow::Result<Middleware> {
    let mut builder = MiddlewareBuilder::new(config);
    plugins::register(&mut builder).context("Registering built-in plugins")?;
    Ok(builder.build())
}

/// A started daemon.
pub struct Daemon {
    middleware: Middleware,
    rpc: rpc::Rpc,
}

impl Daemon {
    pub async fn start(config: &DaemonConfigFile) -> anyhow::Result<Self> {
        let middleware = build_middleware(config.middleware_config())?;
        let rpc = rpc::Builder::new(&config.rpc_config(), middleware.clone())
            .context("Registering RPC methods")?
            .build()
            .await
            .context("Starting the RPC server")?;

        let report = middleware.fire_hook(READY_EVENT, json!({})).await;
        log::info!(
            "Daemon ready; {} {READY_EVENT} handlers ran, {} failed",
            report.ran,
            report.failed
        );

        Ok(Self { middleware, rpc })
    }

    pub fn middleware(&self) -> &Middleware {
        &self.middleware
    }

    pub fn rpc_address(&self) -> Option<&SocketAddr> {
        self.rpc.address()
    }

    /// Serve until `shutdown` resolves, then stop the RPC server and the job manager.
    pub async fn run_until(
        self,
        shutdown: impl Future<Output = anyhow::Result<ShutdownReason>>,
    ) -> anyhow::Result<()> {
        let reason = shutdown.await?;
        log::info!("Shutting down: {reason}");

        self.middleware.fire_hook(SHUTDOWN_EVENT, json!({"reason": reason.to_string()})).await;
        self.rpc.shutdown().await;

        let unfinished = self
            .middleware
            .jobs()
            .shutdown()
            .await
            .log_warn_pfx("Job manager shutdown")
            .unwrap_or_default();
        if unfinished > 0 {
            log::warn!("{unfinished} jobs were still pending at shutdown");
        }

        Ok(())
    }
}

/// Read the configuration, start the daemon and serve until Ctrl-C or SIGTERM.
pub async fn run(options: Options) -> anyhow::Result<()> {
    let config_path = options.config_path();
    let config = DaemonConfigFile::read(&config_path, &options.run_options)
        .with_context(|| format!("Reading config file {}", config_path.display()))?;

    Daemon::start(&config).await?.run_until(shutdown::external_shutdown()).await
}
