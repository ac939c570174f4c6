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

//! Task-launching wrappers that attach the task name to a tracing span, so that log records
//! emitted by a job or an event loop can be told apart.

use std::future::Future;

use tokio::task::JoinHandle;
use tracing::Instrument;

#[track_caller]
pub fn tokio_spawn<Fut>(future: Fut, task_name: &str) -> JoinHandle<Fut::Output>
where
    Fut: Future + Send + 'static,
    Fut::Output: Send + 'static,
{
    let span = tracing::info_span!("task", name = task_name);
    tokio::spawn(future.instrument(span))
}

#[track_caller]
pub fn tokio_spawn_blocking<Func, Output>(func: Func, task_name: &str) -> JoinHandle<Output>
where
    Func: FnOnce() -> Output + Send + 'static,
    Output: Send + 'static,
{
    let span = tracing::info_span!("blocking_task", name = task_name);
    tokio::task::spawn_blocking(move || span.in_scope(func))
}
