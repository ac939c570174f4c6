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

use logging::log;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use utils::tokio_utils::tokio_spawn;

use super::{Event, EventSource};
use crate::Middleware;

/// A running event-source loop. Dropping it cancels the loop.
pub struct Subscription {
    source: String,
    receiver: mpsc::Receiver<Event>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn start(
        source_name: &str,
        source: Box<dyn EventSource>,
        middleware: Middleware,
        capacity: usize,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let cancel = CancellationToken::new();

        let task = tokio_spawn(
            run(
                source_name.to_owned(),
                source,
                middleware,
                sender,
                cancel.clone(),
            ),
            &format!("event source {source_name}"),
        );

        Self {
            source: source_name.to_owned(),
            receiver,
            cancel,
            task: Some(task),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Next event, or `None` once the loop has ended and everything sent was received.
    pub async fn recv(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Ask the loop to stop. An iteration already in progress still completes.
    pub fn cancel(&self) {
        self.cancel.cancel()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token that stops the loop when cancelled, for tying it to a connection's lifetime.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the loop task to terminate.
    pub async fn finished(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::error!("Event source {} loop failed: {e}", self.source);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    name: String,
    mut source: Box<dyn EventSource>,
    middleware: Middleware,
    sender: mpsc::Sender<Event>,
    cancel: CancellationToken,
) {
    log::debug!("Event source {name} started");

    loop {
        if cancel.is_cancelled() {
            break;
        }

        match source.iterate(&middleware).await {
            Ok(Some(fields)) => {
                let event = Event {
                    event_type: source.event_type(),
                    collection: name.clone(),
                    id: None,
                    fields,
                };
                tokio::select! {
                    sent = sender.send(event) => if sent.is_err() {
                        break;
                    },
                    _ = cancel.cancelled() => break,
                }
            }
            Ok(None) => {}
            Err(e) => {
                log::error!("Event source {name} failed: {e}");
                break;
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(source.interval()) => {}
            _ = cancel.cancelled() => break,
        }
    }

    log::debug!("Event source {name} stopped");
}
