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

use std::{collections::BTreeMap, future::Future, sync::Arc};

use futures::future::BoxFuture;
use serde_json::Value;

use crate::{error::Error, Middleware};

pub type HookHandler =
    Arc<dyn Fn(Middleware, Value) -> BoxFuture<'static, Result<(), Error>> + Send + Sync>;

#[derive(Clone)]
pub struct Hook {
    name: String,
    handler: HookHandler,
}

impl Hook {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> &HookHandler {
        &self.handler
    }
}

/// Event name to handlers, in registration order.
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: BTreeMap<String, Vec<Hook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, Fut>(&mut self, event: &str, name: &str, handler: F)
    where
        F: Fn(Middleware, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), Error>> + Send + 'static,
    {
        let handler: HookHandler = Arc::new(
            move |middleware: Middleware, payload: Value| -> BoxFuture<'static, _> {
                Box::pin(handler(middleware, payload))
            },
        );
        self.hooks.entry(event.to_owned()).or_default().push(Hook {
            name: name.to_owned(),
            handler,
        });
    }

    pub fn handlers(&self, event: &str) -> &[Hook] {
        self.hooks.get(event).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.hooks.keys().map(String::as_str)
    }
}

/// What happened during one fire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FireReport {
    pub ran: usize,
    pub failed: usize,
}
