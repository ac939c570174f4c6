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

//! Job manager: tracks long-running calls and serializes the ones sharing a lock.
//!
//! A single actor task owns every job record and lock queue. Public handles talk to it over an
//! unbounded command channel, running jobs report back over a second channel. Each record
//! publishes its current [JobSnapshot] through a watch channel, which is what waiters observe.

mod jobs_container;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures::future::BoxFuture;
use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};
use serde_json::Value;
use tokio::sync::{
    mpsc::{self, UnboundedReceiver, UnboundedSender},
    oneshot, watch,
};
use tokio_util::sync::CancellationToken;
use utils::{broadcaster, ensure, tap_log::TapLog, tokio_utils::tokio_spawn};

use crate::{
    error::{Error, ErrorKind},
    event::Event,
    method::JobConfig,
};

/// Process-lifetime unique, starting at 1.
pub type JobId = u64;

/// Collection name of job events.
pub const JOBS_COLLECTION: &str = "core.get_jobs";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Waiting,
    Running,
    Success,
    Failed,
    Aborted,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Success | JobState::Failed | JobState::Aborted)
    }

    /// Transitions only go forward. A waiting job may end without running (abort, lock timeout).
    pub fn can_become(self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Waiting, Running) | (Waiting, Failed | Aborted) | (Running, Success | Failed | Aborted)
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobProgress {
    pub percent: u8,
    pub description: Option<String>,
}

/// The failure stored on a finished job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobError(Error);

impl JobError {
    pub fn kind(&self) -> ErrorKind {
        self.0.kind()
    }

    pub fn error(&self) -> &Error {
        &self.0
    }

    pub fn into_error(self) -> Error {
        self.0
    }
}

impl Serialize for JobError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let errors = self.0.validation_errors();
        let mut map = serializer.serialize_map(Some(if errors.is_some() { 3 } else { 2 }))?;
        map.serialize_entry("kind", &self.kind())?;
        map.serialize_entry("message", &self.0.to_string())?;
        if let Some(errors) = errors {
            map.serialize_entry("errors", errors)?;
        }
        map.end()
    }
}

/// Point-in-time view of a job. Times are milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSnapshot {
    pub id: JobId,
    pub method: String,
    pub arguments: Vec<Value>,
    pub lock: Option<String>,
    pub description: Option<String>,
    pub abortable: bool,
    pub transient: bool,
    pub state: JobState,
    pub progress: JobProgress,
    pub result: Option<Value>,
    pub error: Option<JobError>,
    pub time_created: u64,
    pub time_started: Option<u64>,
    pub time_finished: Option<u64>,
}

impl JobSnapshot {
    /// The outcome of a finished job as a call result.
    pub fn into_result(self) -> Result<Value, Error> {
        match self.state {
            JobState::Success => Ok(self.result.unwrap_or(Value::Null)),
            JobState::Failed | JobState::Aborted => {
                Err(self.error.map_or(Error::Aborted, JobError::into_error))
            }
            JobState::Waiting | JobState::Running => {
                Err(Error::failed(format!("Job {} has not finished", self.id)))
            }
        }
    }
}

pub type JobBody = Box<dyn FnOnce(JobHandle) -> BoxFuture<'static, Result<Value, Error>> + Send>;

/// Everything the manager needs to track and eventually run a job.
pub struct NewJob {
    method: String,
    arguments: Vec<Value>,
    lock: Option<String>,
    description: Option<String>,
    lock_queue_size: Option<usize>,
    lock_timeout: Option<Duration>,
    abortable: bool,
    transient: bool,
    blocking: bool,
    body: JobBody,
}

impl NewJob {
    /// `raw_args` feed the lock and description callbacks, `arguments` are what the body gets.
    pub fn new(
        method: impl Into<String>,
        config: &JobConfig,
        raw_args: &[Value],
        arguments: Vec<Value>,
        body: JobBody,
    ) -> Self {
        Self {
            method: method.into(),
            lock: config.lock_name(raw_args),
            description: config.description(raw_args),
            arguments,
            lock_queue_size: config.get_lock_queue_size(),
            lock_timeout: config.get_lock_timeout(),
            abortable: config.is_abortable(),
            transient: config.is_transient(),
            blocking: false,
            body,
        }
    }

    /// Blocking bodies cannot be dropped mid-flight, so abort waits for them to return.
    pub fn blocking(mut self, blocking: bool) -> Self {
        self.blocking = blocking;
        self
    }

    /// Fallback lock deadline when the method sets none.
    pub fn default_lock_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lock_timeout = self.lock_timeout.or(timeout);
        self
    }
}

/// Given to a running job body.
#[derive(Clone)]
pub struct JobHandle {
    id: JobId,
    cancel: CancellationToken,
    event_sender: UnboundedSender<RunnerEvent>,
}

impl JobHandle {
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Progress never goes backwards; smaller values only update the description.
    pub fn set_progress(&self, percent: u8, description: Option<&str>) {
        _ = self
            .event_sender
            .send(RunnerEvent::Progressed {
                id: self.id,
                percent,
                description: description.map(str::to_owned),
            })
            .log_warn_pfx("Job manager is gone, progress dropped");
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// `Err(Error::Aborted)` once an abort was requested; for blocking bodies to bail out early.
    pub fn check_cancelled(&self) -> Result<(), Error> {
        ensure!(!self.is_cancelled(), Error::Aborted);
        Ok(())
    }

    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    pub(crate) fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

/// Follows the state of one job.
#[derive(Debug)]
pub struct JobWatch {
    id: JobId,
    receiver: watch::Receiver<JobSnapshot>,
}

impl JobWatch {
    pub(crate) fn new(id: JobId, receiver: watch::Receiver<JobSnapshot>) -> Self {
        Self { id, receiver }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    /// The final snapshot, once the job is terminal.
    pub async fn finished(mut self, timeout: Option<Duration>) -> Result<JobSnapshot, Error> {
        let id = self.id;
        let finished = async move {
            loop {
                let snapshot = self.receiver.borrow_and_update().clone();
                if snapshot.state.is_terminal() {
                    return Ok(snapshot);
                }
                if self.receiver.changed().await.is_err() {
                    // The job was dropped from the table, which only happens once it is done.
                    let snapshot = self.receiver.borrow().clone();
                    return if snapshot.state.is_terminal() {
                        Ok(snapshot)
                    } else {
                        Err(Error::JobManagerUnavailable)
                    };
                }
            }
        };

        match timeout {
            Some(timeout) => tokio::time::timeout(timeout, finished)
                .await
                .map_err(|_| Error::WaitTimeout(id))?,
            None => finished.await,
        }
    }
}

pub(crate) enum RunnerEvent {
    Progressed {
        id: JobId,
        percent: u8,
        description: Option<String>,
    },
    Finished {
        id: JobId,
        outcome: Result<Value, Error>,
    },
    LockTimedOut {
        id: JobId,
    },
}

enum JobCommand {
    Submit {
        job: NewJob,
        result_sender: oneshot::Sender<JobWatch>,
    },
    Abort {
        id: JobId,
        result_sender: oneshot::Sender<Result<(), Error>>,
    },
    Get {
        id: JobId,
        result_sender: oneshot::Sender<Option<JobSnapshot>>,
    },
    Watch {
        id: JobId,
        result_sender: oneshot::Sender<Option<JobWatch>>,
    },
    List {
        result_sender: oneshot::Sender<Vec<JobSnapshot>>,
    },
    Subscribe {
        result_sender: oneshot::Sender<broadcaster::Receiver<Event>>,
    },
    Shutdown {
        result_sender: oneshot::Sender<usize>,
    },
}

/// Helper function that calls a closure if the event is `Some`.
fn event_then<T>(ev: Option<T>, f: impl FnOnce(T)) {
    if let Some(ev) = ev {
        f(ev)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as u64)
}

#[derive(Clone)]
pub struct JobManager {
    command_sender: UnboundedSender<JobCommand>,
}

impl JobManager {
    /// Start the manager actor. Must be called from within a tokio runtime.
    pub fn new(max_retained_jobs: usize) -> Self {
        let (command_sender, command_receiver) = mpsc::unbounded_channel();
        Self::run(command_receiver, max_retained_jobs);
        Self { command_sender }
    }

    fn run(mut command_receiver: UnboundedReceiver<JobCommand>, max_retained_jobs: usize) {
        let (event_sender, mut event_receiver) = mpsc::unbounded_channel();

        tokio_spawn(
            async move {
                let mut jobs = jobs_container::JobsContainer::new(max_retained_jobs, event_sender);

                loop {
                    tokio::select! {
                        command = command_receiver.recv() => match command {
                            Some(JobCommand::Shutdown { result_sender }) => {
                                return jobs.handle_shutdown(result_sender);
                            }
                            Some(command) => jobs.handle_command(command),
                            None => return jobs.handle_shutdown_silently(),
                        },

                        event = event_receiver.recv()
                            => event_then(event, |ev| jobs.handle_runner_event(ev)),
                    }
                }
            },
            "job_manager",
        );
    }

    async fn request<T>(
        &self,
        make_command: impl FnOnce(oneshot::Sender<T>) -> JobCommand,
    ) -> Result<T, Error> {
        let (result_sender, result_receiver) = oneshot::channel();

        ensure!(
            self.command_sender.send(make_command(result_sender)).is_ok(),
            Error::JobManagerUnavailable
        );

        result_receiver.await.map_err(|_| Error::JobManagerUnavailable)
    }

    /// Queue a job. If its lock queue is full, the id of the already queued job is returned
    /// instead and `job` is dropped.
    pub async fn submit(&self, job: NewJob) -> Result<JobId, Error> {
        self.submit_watched(job).await.map(|watch| watch.id())
    }

    /// [JobManager::submit], also returning a watch on the job that ends up running.
    ///
    /// Unlike a later [JobManager::wait], the watch cannot miss a transient job.
    pub async fn submit_watched(&self, job: NewJob) -> Result<JobWatch, Error> {
        self.request(|result_sender| JobCommand::Submit { job, result_sender }).await
    }

    pub async fn abort(&self, id: JobId) -> Result<(), Error> {
        self.request(|result_sender| JobCommand::Abort { id, result_sender }).await?
    }

    pub async fn get(&self, id: JobId) -> Result<JobSnapshot, Error> {
        self.request(|result_sender| JobCommand::Get { id, result_sender })
            .await?
            .ok_or(Error::JobNotFound(id))
    }

    pub async fn list(&self) -> Result<Vec<JobSnapshot>, Error> {
        self.request(|result_sender| JobCommand::List { result_sender }).await
    }

    /// ADDED, CHANGED and REMOVED events for every non-transient job.
    pub async fn subscribe(&self) -> Result<broadcaster::Receiver<Event>, Error> {
        self.request(|result_sender| JobCommand::Subscribe { result_sender }).await
    }

    /// Wait until the job reaches a terminal state and return its final snapshot.
    pub async fn wait(&self, id: JobId, timeout: Option<Duration>) -> Result<JobSnapshot, Error> {
        self.request(|result_sender| JobCommand::Watch { id, result_sender })
            .await?
            .ok_or(Error::JobNotFound(id))?
            .finished(timeout)
            .await
    }

    /// Abort waiting jobs, signal running ones and stop the manager.
    ///
    /// Returns the number of jobs that were signalled.
    pub async fn shutdown(&self) -> Result<usize, Error> {
        self.request(|result_sender| JobCommand::Shutdown { result_sender }).await
    }
}
