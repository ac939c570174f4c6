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

use std::{any::Any, panic::AssertUnwindSafe, sync::Arc, time::Duration};

use futures::FutureExt;
use logging::log;
use schema::ValidationErrors;
use serde_json::Value;
use tokio::{runtime::Handle, task::JoinHandle};
use tokio_util::sync::{CancellationToken, DropGuard};
use utils::{
    tap_log::TapLog,
    tokio_utils::{tokio_spawn, tokio_spawn_blocking},
};

use crate::{
    config::MiddlewareConfig,
    error::Error,
    event::Subscription,
    hook::FireReport,
    job::{JobBody, JobHandle, JobId, JobManager, JobSnapshot, JobWatch, NewJob},
    method::{Handler, JobConfig, Method},
    registry::Registry,
};

/// Longest argument summary attached to failure logs.
const MAX_ARGS_SUMMARY_LEN: usize = 256;

struct Inner {
    config: MiddlewareConfig,
    registry: Registry,
    jobs: JobManager,
}

/// The process-wide call interface. Cheap to clone; every clone shares one registry.
#[derive(Clone)]
pub struct Middleware {
    inner: Arc<Inner>,
}

/// What a method body gets besides its arguments.
#[derive(Clone)]
pub struct CallContext {
    middleware: Middleware,
    job: Option<JobHandle>,
    cancel: CancellationToken,
}

impl CallContext {
    fn new(middleware: Middleware, cancel: CancellationToken) -> Self {
        Self {
            middleware,
            job: None,
            cancel,
        }
    }

    fn for_job(middleware: Middleware, job: JobHandle) -> Self {
        let cancel = job.cancellation_token().clone();
        Self {
            middleware,
            job: Some(job),
            cancel,
        }
    }

    pub fn middleware(&self) -> &Middleware {
        &self.middleware
    }

    /// Set when the method runs as a job.
    pub fn job(&self) -> Option<&JobHandle> {
        self.job.as_ref()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Call another method as a child of this call: job-backed methods are waited for and
    /// aborted if this call is cancelled first.
    pub async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, Error> {
        self.middleware.call_wait_with(method, args, Some(&self.cancel)).await
    }

    /// [CallContext::call] for blocking method bodies.
    pub fn call_sync(&self, method: &str, args: Vec<Value>) -> Result<Value, Error> {
        current_runtime()?.block_on(self.call(method, args))
    }
}

impl Middleware {
    pub(crate) fn new(config: MiddlewareConfig, registry: Registry) -> Self {
        let jobs = JobManager::new(config.max_retained_jobs);
        Self {
            inner: Arc::new(Inner {
                config,
                registry,
                jobs,
            }),
        }
    }

    pub fn config(&self) -> &MiddlewareConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn jobs(&self) -> &JobManager {
        &self.inner.jobs
    }

    pub fn method(&self, name: &str) -> Result<&Arc<Method>, Error> {
        self.inner
            .registry
            .method(name)
            .ok_or_else(|| Error::MethodNotFound(name.to_owned()))
    }

    /// Call a method by name.
    ///
    /// Job-backed methods are submitted and the call returns the job id right away; use
    /// [Middleware::call_wait] to get their result instead.
    pub async fn call(&self, name: &str, args: Vec<Value>) -> Result<Value, Error> {
        let method = self.method(name)?;
        match method.job_config() {
            Some(config) => Ok(self.submit(method, config, args).await?.id().into()),
            None => {
                let ctx = CallContext::new(self.clone(), CancellationToken::new());
                self.invoke(method, args, ctx).await
            }
        }
    }

    /// Call a method and return its result, waiting for the job if it is job-backed.
    pub async fn call_wait(&self, name: &str, args: Vec<Value>) -> Result<Value, Error> {
        self.call_wait_with(name, args, None).await
    }

    /// Submit a job-backed method.
    pub async fn call_job(&self, name: &str, args: Vec<Value>) -> Result<JobId, Error> {
        let method = self.method(name)?;
        let config = method
            .job_config()
            .ok_or_else(|| Error::failed(format!("Method {name} is not a job")))?;
        Ok(self.submit(method, config, args).await?.id())
    }

    /// [Middleware::call_wait] for code running on a blocking thread.
    ///
    /// Must not be used from an async task: it blocks the thread until the call is done.
    pub fn call_sync(&self, name: &str, args: Vec<Value>) -> Result<Value, Error> {
        current_runtime()?.block_on(self.call_wait(name, args))
    }

    pub async fn wait_job(&self, id: JobId, timeout: Option<Duration>) -> Result<JobSnapshot, Error> {
        self.inner.jobs.wait(id, timeout).await
    }

    pub async fn abort_job(&self, id: JobId) -> Result<(), Error> {
        self.inner.jobs.abort(id).await
    }

    pub(crate) async fn call_wait_with(
        &self,
        name: &str,
        args: Vec<Value>,
        parent: Option<&CancellationToken>,
    ) -> Result<Value, Error> {
        let method = self.method(name)?;

        let Some(config) = method.job_config() else {
            let cancel = parent.map_or_else(CancellationToken::new, CancellationToken::child_token);
            return self.invoke(method, args, CallContext::new(self.clone(), cancel)).await;
        };

        let watch = self.submit(method, config, args).await?;
        let _guard = parent.map(|parent| self.abort_on_cancel(watch.id(), parent.clone()));
        watch.finished(None).await?.into_result()
    }

    /// Abort job `id` once `parent` is cancelled, until the returned guard is dropped.
    ///
    /// The watch runs on its own task: an abortable parent job body is dropped as soon as it
    /// is cancelled, so it cannot clean up after itself.
    fn abort_on_cancel(&self, id: JobId, parent: CancellationToken) -> DropGuard {
        let done = CancellationToken::new();
        let guard = done.clone().drop_guard();
        let jobs = self.inner.jobs.clone();
        tokio_spawn(
            async move {
                tokio::select! {
                    biased;
                    _ = parent.cancelled() => {
                        _ = jobs.abort(id).await.log_warn_pfx("Error aborting child job");
                    }
                    _ = done.cancelled() => {}
                }
            },
            &format!("job {id} parent watch"),
        );
        guard
    }

    async fn invoke(
        &self,
        method: &Arc<Method>,
        args: Vec<Value>,
        ctx: CallContext,
    ) -> Result<Value, Error> {
        let cleaned = method.get_accepts().clean(&args)?;
        log::debug!("Calling {}", method.name());

        execute(Arc::clone(method), cleaned, ctx)
            .await
            .map_err(|e| wrap_failure(method.name(), &args, e))
    }

    async fn submit(
        &self,
        method: &Arc<Method>,
        config: &JobConfig,
        args: Vec<Value>,
    ) -> Result<JobWatch, Error> {
        let cleaned = method.get_accepts().clean(&args)?;

        let middleware = self.clone();
        let job_method = Arc::clone(method);
        let job_args = cleaned.clone();
        let raw_args = args.clone();
        let body: JobBody = Box::new(move |handle| {
            Box::pin(async move {
                let name = job_method.name().to_owned();
                let ctx = CallContext::for_job(middleware, handle);
                execute(job_method, job_args, ctx)
                    .await
                    .map_err(|e| wrap_failure(&name, &raw_args, e))
            })
        });

        let job = NewJob::new(method.name(), config, &args, cleaned, body)
            .blocking(method.handler().is_blocking())
            .default_lock_timeout(self.inner.config.default_lock_timeout());
        self.inner.jobs.submit_watched(job).await
    }

    /// Run every handler registered for `event`, in registration order, one after another.
    ///
    /// A failing handler is logged and does not stop the ones after it.
    pub async fn fire_hook(&self, event: &str, payload: Value) -> FireReport {
        let mut report = FireReport::default();

        for hook in self.inner.registry.hooks().handlers(event) {
            report.ran += 1;
            let run = (hook.handler())(self.clone(), payload.clone());
            let error = match AssertUnwindSafe(run).catch_unwind().await {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e.to_string(),
                Err(panic) => format!("panicked: {}", panic_message(&*panic)),
            };
            report.failed += 1;
            log::error!("Hook {} for {event} failed: {error}", hook.name());
        }

        log::debug!("Fired {event}: {report:?}");
        report
    }

    /// [Middleware::fire_hook] on a separate task.
    pub fn fire_hook_in_background(&self, event: &str, payload: Value) -> JoinHandle<FireReport> {
        let middleware = self.clone();
        let task_name = format!("hook {event}");
        let event = event.to_owned();
        tokio_spawn(
            async move { middleware.fire_hook(&event, payload).await },
            &task_name,
        )
    }

    /// Start a new loop of the named event source.
    pub fn subscribe(&self, source: &str, args: Value) -> Result<Subscription, Error> {
        let entry = self
            .inner
            .registry
            .event_source(source)
            .ok_or_else(|| Error::EventSourceNotFound(source.to_owned()))?;

        let mut errors = ValidationErrors::new();
        let supplied = (!args.is_null()).then_some(&args);
        let args = entry.accepts().clean(supplied, entry.accepts().name(), &mut errors);
        errors.check()?;

        let event_source = (entry.factory())(args.unwrap_or(Value::Null))?;
        log::debug!("New subscription to {source}");
        Ok(Subscription::start(
            source,
            event_source,
            self.clone(),
            self.inner.config.event_channel_capacity,
        ))
    }
}

async fn execute(method: Arc<Method>, args: Vec<Value>, ctx: CallContext) -> Result<Value, Error> {
    match method.handler() {
        Handler::Async(handler) => AssertUnwindSafe(handler(ctx, args))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(Error::failed(panic_message(&*panic)))),
        Handler::Blocking(handler) => {
            let handler = Arc::clone(handler);
            tokio_spawn_blocking(move || handler(ctx, args), method.name())
                .await
                .unwrap_or_else(|e| Err(Error::failed(e)))
        }
    }
}

/// Attach the method name to implementation failures and log them with the arguments.
fn wrap_failure(method: &str, args: &[Value], error: Error) -> Error {
    match error {
        Error::Failed(message) => {
            log::error!(
                "Method {method} failed: {message}; arguments: {}",
                summarize_args(args)
            );
            Error::Call {
                method: method.to_owned(),
                message,
            }
        }
        other => {
            log::debug!("Method {method} returned {other}");
            other
        }
    }
}

fn summarize_args(args: &[Value]) -> String {
    let full = Value::Array(args.to_vec()).to_string();
    if full.chars().count() <= MAX_ARGS_SUMMARY_LEN {
        full
    } else {
        let mut summary: String = full.chars().take(MAX_ARGS_SUMMARY_LEN).collect();
        summary.push_str("...");
        summary
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    // `&str` for `panic!("foo")`, `String` for `panic!("{}", foo)`.
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}

fn current_runtime() -> Result<Handle, Error> {
    Handle::try_current().map_err(|e| Error::failed(format!("No runtime to run the call on: {e}")))
}
