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

use std::{fmt, future::Future, sync::Arc, time::Duration};

use futures::future::BoxFuture;
use schema::{Accepts, Param};
use serde::Serialize;
use serde_json::Value;

use crate::{error::Error, CallContext};

pub type AsyncHandler =
    Arc<dyn Fn(CallContext, Vec<Value>) -> BoxFuture<'static, Result<Value, Error>> + Send + Sync>;
pub type BlockingHandler =
    Arc<dyn Fn(CallContext, Vec<Value>) -> Result<Value, Error> + Send + Sync>;

/// How a method body runs.
#[derive(Clone)]
pub enum Handler {
    /// Cooperatively on the runtime; suspends only at await points.
    Async(AsyncHandler),
    /// On a dedicated blocking thread, so it cannot stall the dispatcher.
    Blocking(BlockingHandler),
}

impl Handler {
    pub fn is_blocking(&self) -> bool {
        matches!(self, Handler::Blocking(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    Plain,
    CrudQuery,
    CrudGetInstance,
    CrudCreate,
    CrudUpdate,
    CrudDelete,
}

type ArgsFn<T> = Arc<dyn Fn(&[Value]) -> T + Send + Sync>;

#[derive(Clone)]
enum LockSpec {
    Static(String),
    Dynamic(ArgsFn<Option<String>>),
}

/// Makes a method job-backed.
///
/// The lock and description callbacks see the raw arguments given by the caller, before
/// validation fills in defaults.
#[derive(Clone, Default)]
pub struct JobConfig {
    lock: Option<LockSpec>,
    lock_queue_size: Option<usize>,
    lock_timeout: Option<Duration>,
    abortable: bool,
    transient: bool,
    description: Option<ArgsFn<String>>,
}

impl JobConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize with every other job holding the same lock name.
    pub fn lock(mut self, name: impl Into<String>) -> Self {
        self.lock = Some(LockSpec::Static(name.into()));
        self
    }

    /// Derive the lock name from the call arguments, e.g. `scrub:{pool}`.
    pub fn lock_with(
        mut self,
        lock: impl Fn(&[Value]) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.lock = Some(LockSpec::Dynamic(Arc::new(lock)));
        self
    }

    /// How many jobs may wait for the lock. When the queue is full new calls are folded into
    /// the last queued job.
    pub fn lock_queue_size(mut self, size: usize) -> Self {
        self.lock_queue_size = Some(size);
        self
    }

    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    pub fn abortable(mut self) -> Self {
        self.abortable = true;
        self
    }

    /// Transient jobs publish no events and are forgotten once finished.
    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    pub fn description_with(
        mut self,
        description: impl Fn(&[Value]) -> String + Send + Sync + 'static,
    ) -> Self {
        self.description = Some(Arc::new(description));
        self
    }

    pub fn lock_name(&self, args: &[Value]) -> Option<String> {
        match self.lock.as_ref()? {
            LockSpec::Static(name) => Some(name.clone()),
            LockSpec::Dynamic(lock) => lock(args),
        }
    }

    pub fn description(&self, args: &[Value]) -> Option<String> {
        self.description.as_ref().map(|describe| describe(args))
    }

    pub fn get_lock_queue_size(&self) -> Option<usize> {
        self.lock_queue_size
    }

    pub fn get_lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout
    }

    pub fn is_abortable(&self) -> bool {
        self.abortable
    }

    pub fn is_transient(&self) -> bool {
        self.transient
    }
}

impl fmt::Debug for JobConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lock = match &self.lock {
            None => None,
            Some(LockSpec::Static(name)) => Some(name.as_str()),
            Some(LockSpec::Dynamic(_)) => Some("<dynamic>"),
        };
        f.debug_struct("JobConfig")
            .field("lock", &lock)
            .field("lock_queue_size", &self.lock_queue_size)
            .field("lock_timeout", &self.lock_timeout)
            .field("abortable", &self.abortable)
            .field("transient", &self.transient)
            .finish()
    }
}

/// A registered, callable method. Immutable once the registry is built.
#[derive(Clone)]
pub struct Method {
    name: String,
    kind: MethodKind,
    accepts: Accepts,
    handler: Handler,
    job: Option<JobConfig>,
    private: bool,
    description: Option<String>,
}

impl Method {
    pub fn new(name: impl Into<String>, handler: Handler) -> Self {
        Self {
            name: name.into(),
            kind: MethodKind::Plain,
            accepts: Accepts::none(),
            handler,
            job: None,
            private: false,
            description: None,
        }
    }

    pub fn new_async<F, Fut>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(CallContext, Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, Error>> + Send + 'static,
    {
        Self::new(
            name,
            Handler::Async(Arc::new(
                move |ctx: CallContext, args: Vec<Value>| -> BoxFuture<'static, _> {
                    Box::pin(handler(ctx, args))
                },
            )),
        )
    }

    pub fn new_blocking<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(CallContext, Vec<Value>) -> Result<Value, Error> + Send + Sync + 'static,
    {
        Self::new(name, Handler::Blocking(Arc::new(handler)))
    }

    pub fn accepts(mut self, params: impl IntoIterator<Item = Param>) -> Self {
        self.accepts = Accepts::new(params);
        self
    }

    pub fn job(mut self, config: JobConfig) -> Self {
        self.job = Some(config);
        self
    }

    /// Hidden from introspection; still callable.
    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub(crate) fn with_kind(mut self, kind: MethodKind) -> Self {
        self.kind = kind;
        self
    }

    pub(crate) fn with_name(mut self, name: String) -> Self {
        self.name = name;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MethodKind {
        self.kind
    }

    pub fn get_accepts(&self) -> &Accepts {
        &self.accepts
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn job_config(&self) -> Option<&JobConfig> {
        self.job.as_ref()
    }

    pub fn is_private(&self) -> bool {
        self.private
    }

    /// Introspection record of this method.
    pub fn info(&self) -> MethodInfo {
        MethodInfo {
            name: self.name.clone(),
            kind: self.kind,
            accepts: self.accepts.params().iter().map(Param::describe).collect(),
            job: self.job.is_some(),
            abortable: self.job.as_ref().is_some_and(JobConfig::is_abortable),
            blocking: self.handler.is_blocking(),
            description: self.description.clone(),
        }
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("blocking", &self.handler.is_blocking())
            .field("job", &self.job)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodInfo {
    pub name: String,
    pub kind: MethodKind,
    pub accepts: Vec<Value>,
    pub job: bool,
    pub abortable: bool,
    pub blocking: bool,
    pub description: Option<String>,
}
