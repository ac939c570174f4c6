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

use std::time::Duration;

use futures::{Stream, StreamExt};
use jsonrpsee::{
    proc_macros::rpc,
    server::{PendingSubscriptionSink, SubscriptionMessage, SubscriptionSink},
};
use logging::log;
use middleware::{job::JOBS_COLLECTION, Event, JobId, JobSnapshot, Middleware};
use serde_json::Value;

use crate::error::{handle_result, to_rpc_error, RpcResult, SubscriptionResult};

#[rpc(server, namespace = "core")]
trait CoreRpc {
    /// Call a middleware method with positional parameters.
    ///
    /// Job-backed methods return the id of the submitted job.
    #[method(name = "call")]
    async fn call(&self, method: String, params: Option<Vec<Value>>) -> RpcResult<Value>;

    /// Wait for a job to finish and return its final state.
    #[method(name = "job_wait")]
    async fn job_wait(&self, id: JobId, timeout_secs: Option<u64>) -> RpcResult<JobSnapshot>;

    #[method(name = "job_abort")]
    async fn job_abort(&self, id: JobId) -> RpcResult<()>;

    /// Stream events of an event source, or job changes for `core.get_jobs`.
    #[subscription(name = "subscribe", unsubscribe = "unsubscribe", item = Event)]
    async fn subscribe(&self, source: String, args: Option<Value>) -> SubscriptionResult;
}

pub struct CoreRpcImpl {
    middleware: Middleware,
}

impl CoreRpcImpl {
    pub fn new(middleware: Middleware) -> Self {
        Self { middleware }
    }

    async fn event_stream(
        &self,
        source: &str,
        args: Option<Value>,
    ) -> Result<impl Stream<Item = Event> + Send, middleware::Error> {
        if source == JOBS_COLLECTION {
            let events = self.middleware.jobs().subscribe().await?;
            return Ok(events.into_stream().left_stream());
        }

        let subscription = self.middleware.subscribe(source, args.unwrap_or(Value::Null))?;
        // The subscription lives inside the stream and is cancelled when the stream is dropped.
        let events = futures::stream::unfold(subscription, |mut subscription| async move {
            let event = subscription.recv().await?;
            Some((event, subscription))
        });
        Ok(events.right_stream())
    }
}

#[async_trait::async_trait]
impl CoreRpcServer for CoreRpcImpl {
    async fn call(&self, method: String, params: Option<Vec<Value>>) -> RpcResult<Value> {
        handle_result(self.middleware.call(&method, params.unwrap_or_default()).await)
    }

    async fn job_wait(&self, id: JobId, timeout_secs: Option<u64>) -> RpcResult<JobSnapshot> {
        let timeout = timeout_secs.map(Duration::from_secs);
        handle_result(self.middleware.wait_job(id, timeout).await)
    }

    async fn job_abort(&self, id: JobId) -> RpcResult<()> {
        handle_result(self.middleware.abort_job(id).await)
    }

    async fn subscribe(
        &self,
        pending: PendingSubscriptionSink,
        source: String,
        args: Option<Value>,
    ) -> SubscriptionResult {
        let events = match self.event_stream(&source, args).await {
            Ok(events) => events,
            Err(e) => {
                log::debug!("Rejected subscription to {source}: {e}");
                pending.reject(to_rpc_error(e)).await;
                return Ok(());
            }
        };

        let sink = pending.accept().await?;
        log::debug!("Subscription {:?} to {source} accepted", sink.subscription_id());
        forward(events, sink).await
    }
}

/// Send events until the stream ends or the client goes away.
async fn forward(events: impl Stream<Item = Event>, sink: SubscriptionSink) -> SubscriptionResult {
    let mut events = std::pin::pin!(events);
    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(event) => sink.send(SubscriptionMessage::from_json(&event)?).await?,
                None => break,
            },
            _ = sink.closed() => break,
        }
    }
    log::debug!("Subscription {:?} ended", sink.subscription_id());
    Ok(())
}
