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

use std::{
    collections::{BTreeMap, VecDeque},
    time::Duration,
};

use logging::log;
use serde_json::Value;
use tokio::sync::{mpsc::UnboundedSender, oneshot, watch};
use tokio_util::sync::CancellationToken;
use utils::{broadcaster::Broadcaster, tap_log::TapLog, tokio_utils::tokio_spawn};

use super::{
    now_millis, JobBody, JobCommand, JobError, JobHandle, JobId, JobProgress, JobSnapshot,
    JobState, JobWatch, NewJob, RunnerEvent, JOBS_COLLECTION,
};
use crate::{
    error::Error,
    event::{Event, EventType},
};

struct JobEntry {
    snapshot: watch::Sender<JobSnapshot>,
    cancel: CancellationToken,
    /// Cancelled once the job stops waiting for its lock.
    lock_wait: CancellationToken,
    blocking: bool,
    /// Taken when the job starts.
    body: Option<JobBody>,
}

impl JobEntry {
    fn state(&self) -> JobState {
        self.snapshot.borrow().state
    }
}

/// At most one running job per lock; the rest wait in submission order.
#[derive(Default)]
struct LockQueue {
    running: Option<JobId>,
    waiting: VecDeque<JobId>,
}

pub struct JobsContainer {
    next_id: JobId,
    jobs: BTreeMap<JobId, JobEntry>,
    locks: BTreeMap<String, LockQueue>,
    /// Terminal jobs, oldest first.
    finished: VecDeque<JobId>,
    max_retained_jobs: usize,
    events: Broadcaster<Event>,
    event_sender: UnboundedSender<RunnerEvent>,
}

impl JobsContainer {
    pub fn new(max_retained_jobs: usize, event_sender: UnboundedSender<RunnerEvent>) -> Self {
        Self {
            next_id: 1,
            jobs: BTreeMap::new(),
            locks: BTreeMap::new(),
            finished: VecDeque::new(),
            max_retained_jobs,
            events: Broadcaster::new(),
            event_sender,
        }
    }

    pub fn handle_command(&mut self, command: JobCommand) {
        match command {
            JobCommand::Submit { job, result_sender } => {
                let id = self.handle_submit(job);
                match self.watch(id) {
                    Some(watch) => {
                        _ = result_sender.send(watch).log_err_pfx("Error sending new job id");
                    }
                    None => log::error!("Job {id} vanished right after submission"),
                }
            }
            JobCommand::Abort { id, result_sender } => {
                let result = self.handle_abort(id);
                _ = result_sender.send(result).log_err_pfx("Error sending job abort result");
            }
            JobCommand::Get { id, result_sender } => {
                let snapshot = self.jobs.get(&id).map(|entry| entry.snapshot.borrow().clone());
                _ = result_sender.send(snapshot).log_err_pfx("Error sending job snapshot");
            }
            JobCommand::Watch { id, result_sender } => {
                _ = result_sender.send(self.watch(id)).log_err_pfx("Error sending job watcher");
            }
            JobCommand::List { result_sender } => {
                let snapshots =
                    self.jobs.values().map(|entry| entry.snapshot.borrow().clone()).collect();
                _ = result_sender.send(snapshots).log_err_pfx("Error sending job list");
            }
            JobCommand::Subscribe { result_sender } => {
                _ = result_sender
                    .send(self.events.subscribe())
                    .log_err_pfx("Error sending job event receiver");
            }
            JobCommand::Shutdown { result_sender } => self.handle_shutdown(result_sender),
        }
    }

    fn watch(&self, id: JobId) -> Option<JobWatch> {
        self.jobs.get(&id).map(|entry| JobWatch::new(id, entry.snapshot.subscribe()))
    }

    pub fn handle_runner_event(&mut self, event: RunnerEvent) {
        match event {
            RunnerEvent::Progressed {
                id,
                percent,
                description,
            } => self.handle_progress(id, percent, description),
            RunnerEvent::Finished { id, outcome } => self.handle_finished(id, outcome),
            RunnerEvent::LockTimedOut { id } => self.handle_lock_timeout(id),
        }
    }

    fn handle_submit(&mut self, job: NewJob) -> JobId {
        let NewJob {
            method,
            arguments,
            lock,
            description,
            lock_queue_size,
            lock_timeout,
            abortable,
            transient,
            blocking,
            body,
        } = job;

        if let (Some(lock), Some(size)) = (&lock, lock_queue_size) {
            if let Some(queue) = self.locks.get(lock) {
                let existing = queue.waiting.back().copied().or(queue.running);
                if let (true, Some(existing)) = (queue.waiting.len() >= size, existing) {
                    log::debug!("Lock {lock} queue is full, {method} folded into job {existing}");
                    return existing;
                }
            }
        }

        let id = self.next_id;
        self.next_id += 1;

        let snapshot = JobSnapshot {
            id,
            method,
            arguments,
            lock: lock.clone(),
            description,
            abortable,
            transient,
            state: JobState::Waiting,
            progress: JobProgress::default(),
            result: None,
            error: None,
            time_created: now_millis(),
            time_started: None,
            time_finished: None,
        };
        log::debug!("Job {id} ({}) submitted", snapshot.method);

        let (snapshot, _) = watch::channel(snapshot);
        let cancel = CancellationToken::new();
        let lock_wait = cancel.child_token();
        self.jobs.insert(
            id,
            JobEntry {
                snapshot,
                cancel,
                lock_wait,
                blocking,
                body: Some(body),
            },
        );
        self.publish(id, EventType::Added);

        match lock {
            Some(lock) => {
                let queue = self.locks.entry(lock.clone()).or_default();
                if queue.running.is_none() {
                    queue.running = Some(id);
                    self.start(id);
                } else {
                    queue.waiting.push_back(id);
                    log::debug!("Job {id} is waiting for lock {lock}");
                    if let Some(timeout) = lock_timeout {
                        self.arm_lock_timeout(id, timeout);
                    }
                }
            }
            None => self.start(id),
        }

        id
    }

    fn start(&mut self, id: JobId) {
        let Some(entry) = self.jobs.get_mut(&id) else {
            return;
        };
        let Some(body) = entry.body.take() else {
            log::error!("Job {id} was already started");
            return;
        };
        let (method, abortable) = {
            let snapshot = entry.snapshot.borrow();
            (snapshot.method.clone(), snapshot.abortable)
        };
        entry.lock_wait.cancel();
        let cancel = entry.cancel.clone();
        let blocking = entry.blocking;

        if !self.transition(id, JobState::Running, |snapshot| {
            snapshot.time_started = Some(now_millis())
        }) {
            return;
        }
        log::info!("Job {id} ({method}) started");

        let handle = JobHandle {
            id,
            cancel: cancel.clone(),
            event_sender: self.event_sender.clone(),
        };
        let event_sender = self.event_sender.clone();

        tokio_spawn(
            async move {
                let run = body(handle);
                // Async bodies are dropped at their next await point, blocking ones run to the end.
                let outcome = if abortable && !blocking {
                    tokio::select! {
                        outcome = run => outcome,
                        _ = cancel.cancelled() => Err(Error::Aborted),
                    }
                } else {
                    run.await
                };
                _ = event_sender
                    .send(RunnerEvent::Finished { id, outcome })
                    .log_warn_pfx("Job manager is gone, job outcome dropped");
            },
            &format!("job {id} {method}"),
        );
    }

    fn arm_lock_timeout(&self, id: JobId, timeout: Duration) {
        let Some(lock_wait) = self.jobs.get(&id).map(|entry| entry.lock_wait.clone()) else {
            return;
        };
        let event_sender = self.event_sender.clone();
        tokio_spawn(
            async move {
                tokio::select! {
                    () = tokio::time::sleep(timeout) => {
                        _ = event_sender.send(RunnerEvent::LockTimedOut { id });
                    }
                    () = lock_wait.cancelled() => {}
                }
            },
            &format!("job {id} lock timeout"),
        );
    }

    /// Apply a state change plus extra edits, refusing transitions that go backwards.
    fn transition(
        &mut self,
        id: JobId,
        next: JobState,
        edit: impl FnOnce(&mut JobSnapshot),
    ) -> bool {
        let Some(entry) = self.jobs.get(&id) else {
            return false;
        };
        let current = entry.state();
        if !current.can_become(next) {
            log::error!("Job {id}: refusing transition {current:?} -> {next:?}");
            return false;
        }

        entry.snapshot.send_modify(|snapshot| {
            snapshot.state = next;
            edit(snapshot);
        });
        self.publish(id, EventType::Changed);
        true
    }

    fn publish(&mut self, id: JobId, event_type: EventType) {
        let Some(entry) = self.jobs.get(&id) else {
            return;
        };
        let snapshot = entry.snapshot.borrow().clone();
        if snapshot.transient {
            return;
        }
        match serde_json::to_value(&snapshot) {
            Ok(fields) => self.events.broadcast(&Event {
                event_type,
                collection: JOBS_COLLECTION.to_owned(),
                id: Some(Value::from(id)),
                fields,
            }),
            Err(e) => log::error!("Error serializing job {id}: {e}"),
        }
    }

    fn handle_progress(&mut self, id: JobId, percent: u8, description: Option<String>) {
        let Some(entry) = self.jobs.get(&id) else {
            return;
        };
        if entry.state() != JobState::Running {
            return;
        }

        let changed = entry.snapshot.send_if_modified(|snapshot| {
            let progress = JobProgress {
                percent: snapshot.progress.percent.max(percent.min(100)),
                description: description.or_else(|| snapshot.progress.description.clone()),
            };
            let changed = progress != snapshot.progress;
            snapshot.progress = progress;
            changed
        });
        if changed {
            self.publish(id, EventType::Changed);
        }
    }

    fn handle_finished(&mut self, id: JobId, outcome: Result<Value, Error>) {
        let Some(entry) = self.jobs.get(&id) else {
            return;
        };
        let cancelled = entry.cancel.is_cancelled();

        let (state, result, error) = match outcome {
            Ok(value) => (JobState::Success, Some(value), None),
            Err(Error::Aborted) => (JobState::Aborted, None, Some(Error::Aborted)),
            Err(_) if cancelled => (JobState::Aborted, None, Some(Error::Aborted)),
            Err(error) => (JobState::Failed, None, Some(error)),
        };

        match &error {
            None => log::info!("Job {id} succeeded"),
            Some(Error::Aborted) => log::info!("Job {id} aborted"),
            Some(error) => log::warn!("Job {id} failed: {error}"),
        }

        self.transition(id, state, |snapshot| {
            if state == JobState::Success {
                snapshot.progress.percent = 100;
            }
            snapshot.result = result;
            snapshot.error = error.map(JobError);
            snapshot.time_finished = Some(now_millis());
        });
        self.release_lock(id);
        self.retire(id);
    }

    fn handle_abort(&mut self, id: JobId) -> Result<(), Error> {
        let entry = self.jobs.get(&id).ok_or(Error::JobNotFound(id))?;
        let abortable = entry.snapshot.borrow().abortable;

        match entry.state() {
            JobState::Waiting => {
                self.release_lock(id);
                self.finish_unstarted(id, JobState::Aborted, Error::Aborted);
                log::info!("Job {id} aborted before it started");
                Ok(())
            }
            JobState::Running if abortable => {
                entry.cancel.cancel();
                log::info!("Abort requested for job {id}");
                Ok(())
            }
            JobState::Running => Err(Error::NotAbortable(id)),
            JobState::Success | JobState::Failed | JobState::Aborted => Ok(()),
        }
    }

    fn handle_lock_timeout(&mut self, id: JobId) {
        let Some(entry) = self.jobs.get(&id) else {
            return;
        };
        if entry.state() != JobState::Waiting {
            return;
        }
        let lock = entry.snapshot.borrow().lock.clone().unwrap_or_default();

        log::warn!("Job {id} timed out waiting for lock {lock}");
        self.release_lock(id);
        self.finish_unstarted(id, JobState::Failed, Error::LockTimeout(lock));
    }

    fn finish_unstarted(&mut self, id: JobId, state: JobState, error: Error) {
        if let Some(entry) = self.jobs.get_mut(&id) {
            entry.lock_wait.cancel();
            entry.body = None;
        }
        self.transition(id, state, |snapshot| {
            snapshot.error = Some(JobError(error));
            snapshot.time_finished = Some(now_millis());
        });
        self.retire(id);
    }

    /// Drop `id` from its lock queue and hand the lock to the next waiting job.
    fn release_lock(&mut self, id: JobId) {
        let Some(lock) = self.jobs.get(&id).and_then(|entry| entry.snapshot.borrow().lock.clone())
        else {
            return;
        };
        let Some(queue) = self.locks.get_mut(&lock) else {
            return;
        };

        if queue.running == Some(id) {
            queue.running = None;
        } else {
            queue.waiting.retain(|waiting| *waiting != id);
        }

        if queue.running.is_some() {
            return;
        }
        match queue.waiting.pop_front() {
            Some(next) => {
                queue.running = Some(next);
                log::debug!("Lock {lock} passed from job {id} to job {next}");
                self.start(next);
            }
            None => {
                self.locks.remove(&lock);
            }
        }
    }

    fn retire(&mut self, id: JobId) {
        let transient = self
            .jobs
            .get(&id)
            .is_some_and(|entry| entry.snapshot.borrow().transient);
        if transient {
            self.jobs.remove(&id);
            return;
        }

        self.finished.push_back(id);
        while self.finished.len() > self.max_retained_jobs {
            if let Some(evicted) = self.finished.pop_front() {
                self.publish(evicted, EventType::Removed);
                self.jobs.remove(&evicted);
            }
        }
    }

    pub fn handle_shutdown(&mut self, result_sender: oneshot::Sender<usize>) {
        log::info!("Stopping job manager");
        let signalled = self.stop_all();
        _ = result_sender.send(signalled).log_err_pfx("Error sending stopped jobs count");
    }

    pub fn handle_shutdown_silently(&mut self) {
        log::debug!("Job manager handles dropped, stopping");
        self.stop_all();
    }

    fn stop_all(&mut self) -> usize {
        let mut waiting = Vec::new();
        let mut signalled = 0;

        for (id, entry) in &self.jobs {
            match entry.state() {
                JobState::Waiting => waiting.push(*id),
                JobState::Running => {
                    entry.cancel.cancel();
                    signalled += 1;
                }
                JobState::Success | JobState::Failed | JobState::Aborted => {}
            }
        }

        signalled += waiting.len();
        for id in waiting {
            self.finish_unstarted(id, JobState::Aborted, Error::Aborted);
        }
        self.locks.clear();
        signalled
    }
}
