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

//! CRUD-style services.
//!
//! Implementing [CrudService] yields five methods under the service namespace: `query`,
//! `get_instance`, `create`, `update` and `delete`.

use std::sync::Arc;

use async_trait::async_trait;
use schema::Param;
use serde_json::{json, Value};

use crate::{
    error::Error,
    filters::{filter_list, query_filters_param, query_options_param, QueryOptions},
    method::{JobConfig, Method, MethodKind},
    CallContext,
};

#[async_trait]
pub trait CrudService: Send + Sync + 'static {
    /// Dotted namespace, e.g. `ctdb.private.ips`.
    fn namespace(&self) -> &str;

    /// Record field that `get_instance`, `update` and `delete` identify records by.
    fn primary_key(&self) -> &str {
        "id"
    }

    fn id_param(&self) -> Param {
        Param::int("id").required()
    }

    fn create_schema(&self) -> Param;

    fn update_schema(&self) -> Param {
        self.create_schema().partial()
    }

    /// Makes `create`, `update` and `delete` job-backed.
    fn job_config(&self) -> Option<JobConfig> {
        None
    }

    /// Every record of the collection.
    async fn entries(&self, ctx: &CallContext) -> Result<Vec<Value>, Error>;

    async fn query(
        &self,
        ctx: &CallContext,
        filters: &[Value],
        options: &QueryOptions,
    ) -> Result<Value, Error> {
        filter_list(self.entries(ctx).await?, filters, options)
    }

    async fn do_create(&self, ctx: &CallContext, data: Value) -> Result<Value, Error>;

    async fn do_update(&self, ctx: &CallContext, id: Value, data: Value) -> Result<Value, Error>;

    async fn do_delete(&self, ctx: &CallContext, id: Value) -> Result<Value, Error>;
}

/// Positional arguments, padded with nulls.
fn take_args<const N: usize>(args: Vec<Value>) -> [Value; N] {
    let mut args = args.into_iter();
    std::array::from_fn(|_| args.next().unwrap_or(Value::Null))
}

fn filters_of(value: Value) -> Vec<Value> {
    match value {
        Value::Array(filters) => filters,
        _ => Vec::new(),
    }
}

pub(crate) fn methods<S: CrudService>(service: Arc<S>) -> Vec<Method> {
    let job = service.job_config();
    let with_job = |method: Method| match &job {
        Some(config) => method.job(config.clone()),
        None => method,
    };

    let query = {
        let captured = Arc::clone(&service);
        Method::new_async("query", move |ctx, args| {
            let service = Arc::clone(&captured);
            async move {
                let [filters, options] = take_args(args);
                let options = QueryOptions::from_value(&options)?;
                service.query(&ctx, &filters_of(filters), &options).await
            }
        })
        .accepts([query_filters_param(), query_options_param()])
        .with_kind(MethodKind::CrudQuery)
    };

    let get_instance = {
        let captured = Arc::clone(&service);
        Method::new_async("get_instance", move |ctx, args| {
            let service = Arc::clone(&captured);
            async move {
                let [id, options] = take_args(args);
                let options = QueryOptions {
                    get: true,
                    ..QueryOptions::from_value(&options)?
                };
                let filters = [json!([service.primary_key(), "=", id])];
                service.query(&ctx, &filters, &options).await.map_err(|e| match e {
                    Error::MatchNotFound => {
                        Error::NotFound(format!("{} {id} does not exist", service.namespace()))
                    }
                    e => e,
                })
            }
        })
        .accepts([service.id_param(), query_options_param()])
        .with_kind(MethodKind::CrudGetInstance)
    };

    let create = {
        let captured = Arc::clone(&service);
        Method::new_async("create", move |ctx, args| {
            let service = Arc::clone(&captured);
            async move {
                let [data] = take_args(args);
                service.do_create(&ctx, data).await
            }
        })
        .accepts([service.create_schema().required()])
        .with_kind(MethodKind::CrudCreate)
    };

    let update = {
        let captured = Arc::clone(&service);
        Method::new_async("update", move |ctx, args| {
            let service = Arc::clone(&captured);
            async move {
                let [id, data] = take_args(args);
                service.do_update(&ctx, id, data).await
            }
        })
        .accepts([service.id_param(), service.update_schema()])
        .with_kind(MethodKind::CrudUpdate)
    };

    let delete = {
        let captured = Arc::clone(&service);
        Method::new_async("delete", move |ctx, args| {
            let service = Arc::clone(&captured);
            async move {
                let [id] = take_args(args);
                service.do_delete(&ctx, id).await
            }
        })
        .accepts([service.id_param()])
        .with_kind(MethodKind::CrudDelete)
    };

    vec![query, get_instance, with_job(create), with_job(update), with_job(delete)]
}
