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

//! Built-in methods of the `core` namespace.

use middleware::{
    filters::{filter_list, query_filters_param, query_options_param, QueryOptions},
    schema::{validators::Range, Param},
    CallContext, Error, Method, MethodInfo,
};
use serde_json::{json, Map, Value};

pub fn methods() -> Vec<Method> {
    vec![
        Method::new_async("ping", |_, _| async { Ok(json!("pong")) })
            .description("Check that the middleware answers calls."),
        Method::new_async("get_methods", |ctx, _| async move { Ok(get_methods(&ctx)) })
            .description("Describe every public method and its parameters."),
        Method::new_async("get_jobs", |ctx, args| async move { get_jobs(&ctx, args).await })
            .accepts([query_filters_param(), query_options_param()])
            .description("Query jobs like any other collection."),
        Method::new_async("job_abort", |ctx, args| async move {
            let id = args.first().and_then(Value::as_u64).unwrap_or_default();
            ctx.middleware().abort_job(id).await.map(|()| Value::Null)
        })
        .accepts([Param::int("id").required().validator(Range::min(1))])
        .description("Abort a waiting job, or a running one that allows it."),
        Method::new_async("get_event_sources", |ctx, _| async move {
            let sources: Map<String, Value> = ctx
                .middleware()
                .registry()
                .event_source_names()
                .filter_map(|name| {
                    let entry = ctx.middleware().registry().event_source(name)?;
                    Some((name.to_owned(), entry.accepts().describe()))
                })
                .collect();
            Ok(Value::Object(sources))
        }),
    ]
}

fn get_methods(ctx: &CallContext) -> Value {
    let methods: Map<String, Value> = ctx
        .middleware()
        .registry()
        .methods()
        .filter(|method| !method.is_private())
        .map(|method| (method.name().to_owned(), describe(method.info())))
        .collect();
    Value::Object(methods)
}

fn describe(info: MethodInfo) -> Value {
    json!({
        "kind": info.kind,
        "accepts": info.accepts,
        "job": info.job,
        "abortable": info.abortable,
        "blocking": info.blocking,
        "description": info.description,
    })
}

async fn get_jobs(ctx: &CallContext, args: Vec<Value>) -> Result<Value, Error> {
    let mut args = args.into_iter();
    let filters = match args.next() {
        Some(Value::Array(filters)) => filters,
        _ => Vec::new(),
    };
    let options = QueryOptions::from_value(&args.next().unwrap_or(Value::Null))?;

    let jobs = ctx
        .middleware()
        .jobs()
        .list()
        .await?
        .into_iter()
        .map(|snapshot| serde_json::to_value(snapshot).map_err(Error::failed))
        .collect::<Result<Vec<_>, _>>()?;
    filter_list(jobs, &filters, &options)
}
