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
    schema::{validators::Range, Param, ValidationErrorKind},
    Error, EventSource, EventType, Method, Middleware, MiddlewareBuilder, MiddlewareConfig,
    Subscription,
};
use serde_json::{json, Value};
use test_utils::wait_for;

/// Counts up from `start`, one number per iteration.
struct Counter {
    next: u64,
    interval: Duration,
    iterations: Arc<AtomicUsize>,
}

#[async_trait]
impl EventSource for Counter {
    fn interval(&self) -> Duration {
        self.interval
    }

    async fn iterate(&mut self, middleware: &Middleware) -> Result<Option<Value>, Error> {
        self.iterations.fetch_add(1, Ordering::SeqCst);
        let label = middleware.call("counter.label", vec![]).await?;
        let value = self.next;
        self.next += 1;
        match value {
            13 => Err(Error::failed("unlucky")),
            _ if value % 5 == 0 => Ok(None),
            _ => Ok(Some(json!({"label": label, "value": value}))),
        }
    }
}

fn counter_params() -> Param {
    Param::dict(
        "",
        [
            Param::int("interval").default(2).validator(Range::min(2)),
            Param::int("start").default(1),
        ],
    )
}

fn middleware(iterations: &Arc<AtomicUsize>) -> Middleware {
    let iterations = Arc::clone(iterations);
    let mut builder = MiddlewareBuilder::new(MiddlewareConfig::default());
    builder
        .register_method(Method::new_async("counter.label", |_, _| async { Ok(json!("tick")) }))
        .unwrap()
        .register_event_source("counter.count", counter_params(), move |args| {
            Ok(Counter {
                next: args["start"].as_u64().unwrap_or(1),
                interval: Duration::from_secs(args["interval"].as_u64().unwrap_or(2)),
                iterations: Arc::clone(&iterations),
            })
        })
        .unwrap();
    builder.build()
}

async fn values(subscription: &mut Subscription, count: usize) -> Vec<u64> {
    let mut values = Vec::new();
    for _ in 0..count {
        let event = subscription.recv().await.unwrap();
        assert_eq!(event.event_type, EventType::Added);
        assert_eq!(event.collection, "counter.count");
        assert_eq!(event.fields["label"], "tick");
        values.push(event.fields["value"].as_u64().unwrap());
    }
    values
}

#[tokio::test(start_paused = true)]
async fn subscriptions_keep_their_own_state() {
    let middleware = middleware(&Arc::new(AtomicUsize::new(0)));

    let mut first = middleware.subscribe("counter.count", Value::Null).unwrap();
    assert_eq!(values(&mut first, 2).await, [1, 2]);

    let mut second = middleware.subscribe("counter.count", json!({"start": 100})).unwrap();
    assert_eq!(values(&mut second, 2).await, [101, 102]);
    assert_eq!(values(&mut first, 3).await, [3, 4, 6]);
}

#[tokio::test(start_paused = true)]
async fn iterations_follow_the_interval() {
    let middleware = middleware(&Arc::new(AtomicUsize::new(0)));
    let mut subscription = middleware.subscribe("counter.count", json!({"interval": 10})).unwrap();

    let started = tokio::time::Instant::now();
    values(&mut subscription, 3).await;
    assert!(started.elapsed() >= Duration::from_secs(20));
}

#[tokio::test(start_paused = true)]
async fn cancel_ends_the_loop() {
    let iterations = Arc::new(AtomicUsize::new(0));
    let middleware = middleware(&iterations);
    let mut subscription = middleware.subscribe("counter.count", Value::Null).unwrap();

    values(&mut subscription, 1).await;
    subscription.cancel();
    assert!(subscription.is_cancelled());
    subscription.finished().await;

    let after_cancel = iterations.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(iterations.load(Ordering::SeqCst), after_cancel);

    while subscription.recv().await.is_some() {}
}

#[tokio::test(start_paused = true)]
async fn dropping_the_subscription_cancels_it() {
    let iterations = Arc::new(AtomicUsize::new(0));
    let middleware = middleware(&iterations);
    let mut subscription = middleware.subscribe("counter.count", Value::Null).unwrap();
    let token = subscription.cancellation_token();

    values(&mut subscription, 1).await;
    drop(subscription);
    assert!(token.is_cancelled());

    tokio::time::sleep(Duration::from_secs(10)).await;
    let stopped_at = iterations.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(iterations.load(Ordering::SeqCst), stopped_at);
}

#[tokio::test(start_paused = true)]
async fn failing_iteration_ends_the_subscription() {
    let iterations = Arc::new(AtomicUsize::new(0));
    let middleware = middleware(&iterations);
    let mut subscription = middleware.subscribe("counter.count", json!({"start": 11})).unwrap();

    assert_eq!(values(&mut subscription, 2).await, [11, 12]);
    assert!(subscription.recv().await.is_none());
    subscription.finished().await;
    assert!(wait_for(Duration::from_secs(1), || iterations.load(Ordering::SeqCst) == 3).await);
}

#[tokio::test]
async fn subscribe_validates_arguments() {
    let middleware = middleware(&Arc::new(AtomicUsize::new(0)));

    let error = middleware.subscribe("counter.count", json!({"interval": 1})).err().unwrap();
    let errors = error.validation_errors().unwrap();
    let field = errors.find("interval").unwrap();
    assert_eq!(field.kind, ValidationErrorKind::Constraint);
    assert_eq!(field.message, "Should be greater or equal than 2");

    let error = middleware.subscribe("counter.count", json!({"step": 1})).err().unwrap();
    assert_eq!(
        error.validation_errors().unwrap().find("step").unwrap().kind,
        ValidationErrorKind::UnexpectedField
    );

    let error = middleware.subscribe("counter.squares", Value::Null).err().unwrap();
    assert_eq!(error, Error::EventSourceNotFound("counter.squares".into()));
}
