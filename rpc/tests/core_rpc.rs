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

use std::{net::SocketAddr, time::Duration};

use jsonrpsee::{
    core::{client::ClientT, ClientError},
    http_client::{HttpClient, HttpClientBuilder},
    rpc_params,
    server::MethodsError,
};
use middleware::{
    schema::{validators::Range, Param},
    Error, Event, EventSource, EventType, JobConfig, Method, Middleware, MiddlewareBuilder,
    MiddlewareConfig,
};
use rpc::{Builder, Rpc, RpcConfig};
use rstest::rstest;
use serde_json::{json, Value};

struct Uptime {
    seconds: u64,
}

#[async_trait::async_trait]
impl EventSource for Uptime {
    fn interval(&self) -> Duration {
        Duration::from_millis(10)
    }

    async fn iterate(&mut self, _middleware: &Middleware) -> Result<Option<Value>, Error> {
        self.seconds += 1;
        Ok(Some(json!({"uptime": self.seconds})))
    }
}

fn middleware() -> Middleware {
    let mut builder = MiddlewareBuilder::new(MiddlewareConfig::default());
    builder
        .register_service(
            "system",
            [
                Method::new_async("echo", |_, args| async move { Ok(args[0].clone()) })
                    .accepts([Param::str("text").required()]),
                Method::new_async("sleep", |ctx, args| async move {
                    let seconds = args[0].as_u64().unwrap_or(0);
                    tokio::time::sleep(Duration::from_secs(seconds)).await;
                    Ok(json!(ctx.job().map(|job| job.id())))
                })
                .accepts([Param::int("seconds").default(0)])
                .job(JobConfig::new().lock("sleep")),
            ],
        )
        .unwrap()
        .register_event_source(
            "system.uptime",
            Param::dict("", [Param::int("start").default(0).validator(Range::min(0))]),
            |args| {
                Ok(Uptime {
                    seconds: args["start"].as_u64().unwrap_or(0),
                })
            },
        )
        .unwrap();
    builder.build()
}

async fn start() -> (Rpc, HttpClient) {
    let config = RpcConfig {
        bind_address: "127.0.0.1:0".parse::<SocketAddr>().unwrap(),
        enabled: true,
    };
    let rpc = Builder::new(&config, middleware()).unwrap().build().await.unwrap();
    let url = format!("http://{}", rpc.address().unwrap());
    let client = HttpClientBuilder::default().build(url).unwrap();
    (rpc, client)
}

fn call_error(error: ClientError) -> (i32, Value) {
    match error {
        ClientError::Call(object) => {
            let data = object.data().map_or(Value::Null, |data| {
                serde_json::from_str(data.get()).unwrap()
            });
            (object.code(), data)
        }
        other => panic!("unexpected client error: {other}"),
    }
}

#[tokio::test]
async fn call_round_trip() {
    let (rpc, client) = start().await;

    let echoed: Value = client.request("core_call", rpc_params!["system.echo", ["hi"]]).await.unwrap();
    assert_eq!(echoed, json!("hi"));

    let error = client
        .request::<Value, _>("core_call", rpc_params!["system.echo", Vec::<Value>::new()])
        .await
        .unwrap_err();
    let (code, data) = call_error(error);
    assert_eq!(code, rpc::error_code(middleware::ErrorKind::Validation));
    assert_eq!(data["errors"][0]["attribute"], "text");

    let error = client
        .request::<Value, _>("core_call", rpc_params!["system.shutdown"])
        .await
        .unwrap_err();
    let (code, data) = call_error(error);
    assert_eq!(code, rpc::error_code(middleware::ErrorKind::NotFound));
    assert_eq!(data, json!({"kind": "NOT_FOUND"}));

    rpc.shutdown().await;
}

#[tokio::test]
async fn jobs_over_rpc() {
    let (rpc, client) = start().await;

    let id: u64 = client.request("core_call", rpc_params!["system.sleep", [0]]).await.unwrap();
    let snapshot: Value = client.request("core_job_wait", rpc_params![id, 5]).await.unwrap();
    assert_eq!(snapshot["state"], "SUCCESS");
    assert_eq!(snapshot["result"], json!(id));

    let running: u64 = client.request("core_call", rpc_params!["system.sleep", [60]]).await.unwrap();
    let error = client
        .request::<(), _>("core_job_abort", rpc_params![running])
        .await
        .unwrap_err();
    assert_eq!(call_error(error).0, rpc::error_code(middleware::ErrorKind::Call));

    let error = client
        .request::<Value, _>("core_job_wait", rpc_params![running, 0])
        .await
        .unwrap_err();
    assert_eq!(call_error(error).0, rpc::error_code(middleware::ErrorKind::Call));

    rpc.shutdown().await;
}

#[rstest]
#[case(false)]
#[case(true)]
#[tokio::test]
async fn disabled_server_does_not_listen(#[case] enabled: bool) {
    let config = RpcConfig {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        enabled,
    };
    let rpc = Builder::new(&config, middleware()).unwrap().build().await.unwrap();
    assert_eq!(rpc.address().is_some(), enabled);
    rpc.shutdown().await;
}

#[tokio::test]
async fn duplicate_methods_are_refused() {
    let middleware = middleware();
    let builder = Builder::new(&RpcConfig::default(), middleware.clone()).unwrap();
    assert!(builder.register(rpc::core_module(middleware)).is_err());
}

#[tokio::test]
async fn event_source_subscription() {
    let module = rpc::core_module(middleware());

    let mut subscription = module
        .subscribe_unbounded("core_subscribe", rpc_params!["system.uptime", json!({"start": 10})])
        .await
        .unwrap();
    for expected in 11..14 {
        let (event, _) = subscription.next::<Event>().await.unwrap().unwrap();
        assert_eq!(event.event_type, EventType::Added);
        assert_eq!(event.collection, "system.uptime");
        assert_eq!(event.fields, json!({"uptime": expected}));
    }

    let rejected = module
        .subscribe_unbounded("core_subscribe", rpc_params!["system.uptime", json!({"start": -1})])
        .await;
    match rejected {
        Err(MethodsError::JsonRpc(object)) => {
            assert_eq!(object.code(), rpc::error_code(middleware::ErrorKind::Validation))
        }
        _ => panic!("subscription with invalid arguments was accepted"),
    }

    let rejected = module.subscribe_unbounded("core_subscribe", rpc_params!["system.load"]).await;
    assert!(matches!(rejected, Err(MethodsError::JsonRpc(object)) if object.code() == 2));
}

#[tokio::test]
async fn job_event_subscription() {
    let module = rpc::core_module(middleware());

    let mut subscription = module
        .subscribe_unbounded("core_subscribe", rpc_params!["core.get_jobs"])
        .await
        .unwrap();
    let id: u64 = module.call("core_call", rpc_params!["system.sleep", [0]]).await.unwrap();

    let (added, _) = subscription.next::<Event>().await.unwrap().unwrap();
    assert_eq!(added.event_type, EventType::Added);
    assert_eq!(added.id, Some(json!(id)));
    assert_eq!(added.fields["state"], "WAITING");

    let mut last_state = Value::Null;
    while last_state != "SUCCESS" {
        let (changed, _) = subscription.next::<Event>().await.unwrap().unwrap();
        assert_eq!(changed.event_type, EventType::Changed);
        last_state = changed.fields["state"].clone();
    }
}
