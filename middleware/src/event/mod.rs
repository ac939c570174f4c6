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

//! Interval-driven event sources.
//!
//! A source is instantiated per subscription from validated arguments, so any state carried
//! from one iteration to the next (previous counter samples and the like) belongs to that
//! subscription alone.

mod subscription;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::Error, Middleware};

pub use subscription::Subscription;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    Added,
    Changed,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: EventType,
    pub collection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub fields: Value,
}

#[async_trait]
pub trait EventSource: Send + 'static {
    /// Pause between two iterations.
    fn interval(&self) -> Duration;

    /// Type of the events this source emits.
    fn event_type(&self) -> EventType {
        EventType::Added
    }

    /// Gather one fresh payload. `None` skips this round; an error ends the subscription.
    async fn iterate(&mut self, middleware: &Middleware) -> Result<Option<Value>, Error>;
}

/// Builds a source from its cleaned subscription arguments.
pub type EventSourceFactory =
    Arc<dyn Fn(Value) -> Result<Box<dyn EventSource>, Error> + Send + Sync>;
