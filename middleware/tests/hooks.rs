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

use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use middleware::{
    schema::Param, Error, FireReport, Method, Middleware, MiddlewareBuilder, MiddlewareConfig,
};
use parking_lot::Mutex;
use rand::Rng;
use rstest::rstest;
use serde_json::{json, Value};
use test_utils::{
    make_seedable_rng,
    random::{make_seedable_rng, Seed},
};

type Log = Arc<Mutex<Vec<String>>>;

fn recording_hook(
    log: &Log,
    name: &'static str,
    delay: Duration,
    outcome: Result<(), Error>,
) -> impl Fn(Middleware, Value) -> BoxFuture<'static, Result<(), Error>> + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |_: Middleware, payload: Value| -> BoxFuture<'static, Result<(), Error>> {
        let log = Arc::clone(&log);
        let outcome = outcome.clone();
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            log.lock().push(format!("{name}:{}", payload["pool"].as_str().unwrap_or("?")));
            outcome
        })
    }
}

#[rstest]
#[case(Seed::from_entropy())]
#[tokio::test(start_paused = true)]
async fn handlers_run_in_registration_order(#[case] seed: Seed) {
    let mut rng = make_seedable_rng!(seed);
    let log = Log::default();
    let mut delay = || Duration::from_millis(rng.gen_range(0..100));

    let mut builder = MiddlewareBuilder::new(MiddlewareConfig::default());
    builder
        .register_hook("pool.post_import", "a", recording_hook(&log, "a", delay(), Ok(())))
        .register_hook(
            "pool.post_import",
            "b",
            recording_hook(&log, "b", delay(), Err(Error::failed("share reload failed"))),
        )
        .register_hook("pool.post_import", "c", recording_hook(&log, "c", delay(), Ok(())))
        .register_hook("pool.pre_export", "d", recording_hook(&log, "d", delay(), Ok(())));
    let middleware = builder.build();

    let report = middleware.fire_hook("pool.post_import", json!({"pool": "tank"})).await;
    assert_eq!(report, FireReport { ran: 3, failed: 1 });
    assert_eq!(*log.lock(), ["a:tank", "b:tank", "c:tank"]);

    let events: Vec<&str> = middleware.registry().hooks().events().collect();
    assert_eq!(events, ["pool.post_import", "pool.pre_export"]);
}

#[tokio::test]
async fn panicking_handler_is_isolated() {
    let log = Log::default();
    let mut builder = MiddlewareBuilder::new(MiddlewareConfig::default());
    builder
        .register_hook("system.ready", "explode", |_, _| async { panic!("hook exploded") })
        .register_hook(
            "system.ready",
            "after",
            recording_hook(&log, "after", Duration::ZERO, Ok(())),
        );
    let middleware = builder.build();

    let report = middleware.fire_hook("system.ready", json!({"pool": "boot-pool"})).await;
    assert_eq!(report, FireReport { ran: 2, failed: 1 });
    assert_eq!(*log.lock(), ["after:boot-pool"]);
}

#[tokio::test]
async fn unknown_event_runs_nothing() {
    let middleware = MiddlewareBuilder::new(MiddlewareConfig::default()).build();
    let report = middleware.fire_hook("pool.post_create", Value::Null).await;
    assert_eq!(report, FireReport::default());
}

#[tokio::test]
async fn handlers_can_call_methods_in_background() {
    let log = Log::default();
    let mut builder = MiddlewareBuilder::new(MiddlewareConfig::default());
    builder
        .register_method(Method::new_async("service.reload", {
            let log = Arc::clone(&log);
            move |_, args| {
                let log = Arc::clone(&log);
                async move {
                    log.lock().push(format!("reload:{}", args[0].as_str().unwrap_or("?")));
                    Ok(Value::Null)
                }
            }
        })
        .accepts([Param::str("service").required()]))
        .unwrap()
        .register_hook("pool.post_import", "reload_nfs", |middleware, _| async move {
            middleware.call("service.reload", vec![json!("nfs")]).await.map(|_| ())
        });
    let middleware = builder.build();

    let report = middleware
        .fire_hook_in_background("pool.post_import", json!({"pool": "tank"}))
        .await
        .unwrap();
    assert_eq!(report, FireReport { ran: 1, failed: 0 });
    assert_eq!(*log.lock(), ["reload:nfs"]);
}
