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
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use middleware::{
    schema::Param, CallContext, CrudService, Error, EventType, JobConfig, JobId, JobState, Method,
    Middleware, MiddlewareBuilder, MiddlewareConfig,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::Semaphore;

const TIMEOUT: Duration = Duration::from_secs(10);

async fn wait_state(middleware: &Middleware, id: JobId, state: JobState) {
    let reached = async {
        loop {
            if middleware.jobs().get(id).await.unwrap().state == state {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };
    tokio::time::timeout(TIMEOUT, reached).await.unwrap_or_else(|_| {
        panic!("job {id} never reached {state:?}");
    });
}

/// A CRUD service whose `create` holds lock `L` until the test hands out a permit.
struct GatedShares {
    gate: Arc<Semaphore>,
    records: Mutex<Vec<Value>>,
}

#[async_trait]
impl CrudService for GatedShares {
    fn namespace(&self) -> &str {
        "sharing.nfs"
    }

    fn create_schema(&self) -> Param {
        Param::dict("sharingnfs_create", [Param::str("path").required()])
    }

    fn job_config(&self) -> Option<JobConfig> {
        Some(JobConfig::new().lock("L"))
    }

    async fn entries(&self, _ctx: &CallContext) -> Result<Vec<Value>, Error> {
        Ok(self.records.lock().clone())
    }

    async fn do_create(&self, _ctx: &CallContext, data: Value) -> Result<Value, Error> {
        self.gate.acquire().await.map_err(Error::failed)?.forget();
        let mut records = self.records.lock();
        let record = json!({"id": records.len() + 1, "path": data["path"]});
        records.push(record.clone());
        Ok(record)
    }

    async fn do_update(&self, _ctx: &CallContext, _id: Value, _data: Value) -> Result<Value, Error> {
        Err(Error::failed("read-only"))
    }

    async fn do_delete(&self, _ctx: &CallContext, _id: Value) -> Result<Value, Error> {
        Err(Error::failed("read-only"))
    }
}

#[tokio::test]
async fn second_create_waits_for_lock() {
    let gate = Arc::new(Semaphore::new(0));
    let mut builder = MiddlewareBuilder::new(MiddlewareConfig::default());
    builder
        .register_crud(GatedShares {
            gate: Arc::clone(&gate),
            records: Mutex::new(Vec::new()),
        })
        .unwrap();
    let middleware = builder.build();

    let first = middleware
        .call_job("sharing.nfs.create", vec![json!({"path": "/mnt/tank/a"})])
        .await
        .unwrap();
    let second = middleware
        .call_job("sharing.nfs.create", vec![json!({"path": "/mnt/tank/b"})])
        .await
        .unwrap();

    wait_state(&middleware, first, JobState::Running).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(middleware.jobs().get(second).await.unwrap().state, JobState::Waiting);

    gate.add_permits(1);
    let done = middleware.wait_job(first, Some(TIMEOUT)).await.unwrap();
    assert_eq!(done.state, JobState::Success);
    assert_eq!(done.result, Some(json!({"id": 1, "path": "/mnt/tank/a"})));

    wait_state(&middleware, second, JobState::Running).await;
    gate.add_permits(1);
    let done = middleware.wait_job(second, Some(TIMEOUT)).await.unwrap();
    assert_eq!(done.result, Some(json!({"id": 2, "path": "/mnt/tank/b"})));

    let record = middleware.call("sharing.nfs.get_instance", vec![json!(2)]).await;
    assert_eq!(record, Ok(json!({"id": 2, "path": "/mnt/tank/b"})));
}

#[tokio::test]
async fn same_lock_runs_serially_in_submission_order() {
    let running = Arc::new(AtomicUsize::new(0));
    let max_running = Arc::new(AtomicUsize::new(0));
    let started = Arc::new(Mutex::new(Vec::new()));

    let method = {
        let (running, max_running, started) =
            (Arc::clone(&running), Arc::clone(&max_running), Arc::clone(&started));
        Method::new_async("pool.scrub", move |ctx, _| {
            let (running, max_running, started) =
                (Arc::clone(&running), Arc::clone(&max_running), Arc::clone(&started));
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                max_running.fetch_max(now, Ordering::SeqCst);
                started.lock().push(ctx.job().map(|job| job.id()));
                tokio::time::sleep(Duration::from_millis(10)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(Value::Null)
            }
        })
        .job(JobConfig::new().lock("scrub"))
    };

    let mut builder = MiddlewareBuilder::new(MiddlewareConfig::default());
    builder.register_method(method).unwrap();
    let middleware = builder.build();

    let mut ids = Vec::new();
    for _ in 0..5 {
        ids.push(middleware.call_job("pool.scrub", vec![]).await.unwrap());
    }
    for id in &ids {
        middleware.wait_job(*id, Some(TIMEOUT)).await.unwrap();
    }

    assert_eq!(max_running.load(Ordering::SeqCst), 1);
    let started: Vec<JobId> = started.lock().iter().flatten().copied().collect();
    assert_eq!(started, ids);
}

fn gated_job(name: &str, gate: Arc<Semaphore>, config: JobConfig) -> Method {
    Method::new_async(name, move |_, args| {
        let gate = Arc::clone(&gate);
        async move {
            gate.acquire().await.map_err(Error::failed)?.forget();
            Ok(args.into_iter().next().unwrap_or(Value::Null))
        }
    })
    .accepts([Param::any("tag")])
    .job(config)
}

#[tokio::test]
async fn full_lock_queue_folds_into_last_queued_job() {
    let gate = Arc::new(Semaphore::new(0));
    let mut builder = MiddlewareBuilder::new(MiddlewareConfig::default());
    builder
        .register_method(gated_job(
            "cloudsync.sync",
            Arc::clone(&gate),
            JobConfig::new()
                .lock_with(|args| Some(format!("cloudsync:{}", args.first()?)))
                .lock_queue_size(1),
        ))
        .unwrap();
    let middleware = builder.build();

    let running = middleware.call("cloudsync.sync", vec![json!(1)]).await.unwrap();
    let queued = middleware.call("cloudsync.sync", vec![json!(1)]).await.unwrap();
    let folded = middleware.call("cloudsync.sync", vec![json!(1)]).await.unwrap();
    let other_lock = middleware.call("cloudsync.sync", vec![json!(2)]).await.unwrap();

    assert_eq!((running, queued, folded, other_lock), (json!(1), json!(2), json!(2), json!(3)));
    assert_eq!(middleware.jobs().list().await.unwrap().len(), 3);

    gate.add_permits(3);
    for id in [1, 2, 3] {
        let done = middleware.wait_job(id, Some(TIMEOUT)).await.unwrap();
        assert_eq!(done.state, JobState::Success);
    }
}

#[tokio::test]
async fn lock_timeout_fails_waiting_job() {
    let gate = Arc::new(Semaphore::new(0));
    let mut builder = MiddlewareBuilder::new(MiddlewareConfig::default());
    builder
        .register_method(gated_job(
            "ctdb.private.ips.update_file",
            Arc::clone(&gate),
            JobConfig::new().lock("ctdb_private_ips").lock_timeout(Duration::from_millis(30)),
        ))
        .unwrap();
    let middleware = builder.build();

    let holder = middleware.call_job("ctdb.private.ips.update_file", vec![]).await.unwrap();
    let starved = middleware.call_job("ctdb.private.ips.update_file", vec![]).await.unwrap();

    let snapshot = middleware.wait_job(starved, Some(TIMEOUT)).await.unwrap();
    assert_eq!(snapshot.state, JobState::Failed);
    assert_eq!(snapshot.time_started, None);
    let error = snapshot.into_result().unwrap_err();
    assert_eq!(error, Error::LockTimeout("ctdb_private_ips".into()));

    gate.add_permits(1);
    let snapshot = middleware.wait_job(holder, Some(TIMEOUT)).await.unwrap();
    assert_eq!(snapshot.state, JobState::Success);
}

#[tokio::test]
async fn abort_waiting_and_running_jobs() {
    let gate = Arc::new(Semaphore::new(0));
    let mut builder = MiddlewareBuilder::new(MiddlewareConfig::default());
    builder
        .register_method(gated_job(
            "disk.wipe",
            Arc::clone(&gate),
            JobConfig::new().lock("disk:ada0").abortable(),
        ))
        .unwrap()
        .register_method(gated_job("disk.format", Arc::clone(&gate), JobConfig::new()))
        .unwrap();
    let middleware = builder.build();

    let running = middleware.call_job("disk.wipe", vec![]).await.unwrap();
    let waiting = middleware.call_job("disk.wipe", vec![]).await.unwrap();
    let stubborn = middleware.call_job("disk.format", vec![]).await.unwrap();
    wait_state(&middleware, running, JobState::Running).await;
    wait_state(&middleware, stubborn, JobState::Running).await;

    middleware.abort_job(waiting).await.unwrap();
    let snapshot = middleware.wait_job(waiting, Some(TIMEOUT)).await.unwrap();
    assert_eq!(snapshot.state, JobState::Aborted);

    middleware.abort_job(running).await.unwrap();
    let snapshot = middleware.wait_job(running, Some(TIMEOUT)).await.unwrap();
    assert_eq!(snapshot.state, JobState::Aborted);
    assert_eq!(snapshot.into_result(), Err(Error::Aborted));

    assert_eq!(middleware.abort_job(stubborn).await, Err(Error::NotAbortable(stubborn)));
    assert_eq!(middleware.abort_job(999).await, Err(Error::JobNotFound(999)));

    gate.add_permits(1);
    let snapshot = middleware.wait_job(stubborn, Some(TIMEOUT)).await.unwrap();
    assert_eq!(snapshot.state, JobState::Success);
    // Finished jobs ignore aborts.
    assert_eq!(middleware.abort_job(stubborn).await, Ok(()));
}

#[tokio::test]
async fn blocking_job_observes_cancellation() {
    let mut builder = MiddlewareBuilder::new(MiddlewareConfig::default());
    builder
        .register_method(
            Method::new_blocking("pool.resilver", |ctx, _| {
                let job = ctx.job().ok_or_else(|| Error::failed("not a job"))?;
                loop {
                    job.check_cancelled()?;
                    std::thread::sleep(Duration::from_millis(5));
                }
            })
            .job(JobConfig::new().abortable()),
        )
        .unwrap();
    let middleware = builder.build();

    let id = middleware.call_job("pool.resilver", vec![]).await.unwrap();
    wait_state(&middleware, id, JobState::Running).await;
    middleware.abort_job(id).await.unwrap();

    let snapshot = middleware.wait_job(id, Some(TIMEOUT)).await.unwrap();
    assert_eq!(snapshot.state, JobState::Aborted);
}

#[tokio::test]
async fn progress_is_monotonic_and_published() {
    let gate = Arc::new(Semaphore::new(0));
    let method = {
        let gate = Arc::clone(&gate);
        Method::new_async("update.download", move |ctx, _| {
            let gate = Arc::clone(&gate);
            async move {
                let job = ctx.job().ok_or_else(|| Error::failed("not a job"))?;
                job.set_progress(40, Some("Downloading"));
                job.set_progress(20, None);
                job.set_progress(250, Some("Verifying"));
                gate.acquire().await.map_err(Error::failed)?.forget();
                Ok(json!("ok"))
            }
        })
        .job(JobConfig::new().description_with(|_| "Download update".into()))
    };

    let mut builder = MiddlewareBuilder::new(MiddlewareConfig::default());
    builder.register_method(method).unwrap();
    let middleware = builder.build();
    let mut events = middleware.jobs().subscribe().await.unwrap();

    let id = middleware.call_job("update.download", vec![]).await.unwrap();
    let expected = async {
        loop {
            let snapshot = middleware.jobs().get(id).await.unwrap();
            if snapshot.progress.description.as_deref() == Some("Verifying") {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };
    let snapshot = tokio::time::timeout(TIMEOUT, expected).await.unwrap();
    assert_eq!(snapshot.progress.percent, 100);
    assert_eq!(snapshot.description.as_deref(), Some("Download update"));

    gate.add_permits(1);
    middleware.wait_job(id, Some(TIMEOUT)).await.unwrap();

    let mut percents = Vec::new();
    let mut event_types = Vec::new();
    while let Some(event) = events.try_recv() {
        assert_eq!(event.collection, "core.get_jobs");
        assert_eq!(event.id, Some(json!(id)));
        event_types.push(event.event_type);
        percents.push(event.fields["progress"]["percent"].as_u64().unwrap());
    }
    assert_eq!(event_types.first(), Some(&EventType::Added));
    assert_eq!(event_types.last(), Some(&EventType::Changed));
    assert!(percents.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test]
async fn transient_jobs_are_forgotten() {
    let mut builder = MiddlewareBuilder::new(MiddlewareConfig::default());
    builder
        .register_method(
            Method::new_async("alert.process", |_, _| async { Ok(json!(true)) })
                .job(JobConfig::new().transient()),
        )
        .unwrap();
    let middleware = builder.build();
    let mut events = middleware.jobs().subscribe().await.unwrap();

    assert_eq!(middleware.call_wait("alert.process", vec![]).await, Ok(json!(true)));
    assert!(middleware.jobs().list().await.unwrap().is_empty());
    assert!(events.try_recv().is_none());
}

#[tokio::test]
async fn aborting_parent_aborts_child_job() {
    let gate = Arc::new(Semaphore::new(0));
    let mut builder = MiddlewareBuilder::new(MiddlewareConfig::default());
    builder
        .register_method(gated_job("disk.sync", Arc::clone(&gate), JobConfig::new().abortable()))
        .unwrap()
        .register_method(
            Method::new_async("disk.sync_all", |ctx, _| async move {
                ctx.call("disk.sync", vec![json!("ada0")]).await
            })
            .job(JobConfig::new().abortable()),
        )
        .unwrap();
    let middleware = builder.build();

    let parent = middleware.call_job("disk.sync_all", vec![]).await.unwrap();
    let child = parent + 1;
    wait_state(&middleware, child, JobState::Running).await;

    middleware.abort_job(parent).await.unwrap();
    assert_eq!(
        middleware.wait_job(parent, Some(TIMEOUT)).await.unwrap().state,
        JobState::Aborted
    );
    assert_eq!(
        middleware.wait_job(child, Some(TIMEOUT)).await.unwrap().state,
        JobState::Aborted
    );
    assert_eq!(gate.available_permits(), 0);
}
