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

//! Service, job and event core of the management middleware.
//!
//! Plugins register [Method]s, [CrudService]s, hooks and event sources with a
//! [MiddlewareBuilder]. The resulting [Middleware] validates and dispatches calls by name,
//! runs job-backed methods under per-lock mutual exclusion, fires hooks in registration order
//! and runs one loop per event-source subscription.

pub mod crud;
pub mod event;
pub mod filters;
pub mod job;

mod config;
mod dispatcher;
mod error;
mod hook;
mod method;
mod registry;

pub use config::MiddlewareConfig;
pub use crud::CrudService;
pub use dispatcher::{CallContext, Middleware};
pub use error::{Error, ErrorKind, RegistryError};
pub use event::{Event, EventSource, EventType, Subscription};
pub use hook::{FireReport, Hook, HookRegistry};
pub use job::{JobHandle, JobId, JobManager, JobSnapshot, JobState, JobWatch};
pub use method::{Handler, JobConfig, Method, MethodInfo, MethodKind};
pub use registry::{EventSourceEntry, MiddlewareBuilder, Registry};

pub use schema;
