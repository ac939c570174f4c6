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

//! Signals that stop the daemon.

use std::fmt;

/// Why is the daemon shutting down
#[derive(Debug, PartialEq, Eq)]
pub enum ShutdownReason {
    CtrlC,
    Term,
    Internal,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShutdownReason::CtrlC => "Ctrl-C signal received",
            ShutdownReason::Term => "Terminate signal received",
            ShutdownReason::Internal => "Shutdown requested",
        })
    }
}

/// Resolves once Ctrl-C or SIGTERM is received.
pub async fn external_shutdown() -> anyhow::Result<ShutdownReason> {
    #[cfg(unix)]
    let terminate = {
        use tokio::signal::unix;
        let mut sig = unix::signal(unix::SignalKind::terminate())?;
        async move { sig.recv().await }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<Option<()>>();

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.map(|()| ShutdownReason::CtrlC).map_err(Into::into)
        }
        result = terminate => {
            result
                .map(|()| ShutdownReason::Term)
                .ok_or_else(|| anyhow::anyhow!("Signal handler blocked"))
        }
    }
}
