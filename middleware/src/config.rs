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

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_RETAINED_JOBS: usize = 1000;
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 32;

/// Runtime knobs of the middleware core.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct MiddlewareConfig {
    /// How many finished jobs are kept around for inspection.
    pub max_retained_jobs: usize,

    /// Payloads buffered per event-source subscription before the source loop waits.
    pub event_channel_capacity: usize,

    /// Lock wait deadline for jobs whose method does not set its own, in seconds.
    pub default_lock_timeout: Option<u64>,
}

impl MiddlewareConfig {
    pub fn default_lock_timeout(&self) -> Option<Duration> {
        self.default_lock_timeout.map(Duration::from_secs)
    }
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            max_retained_jobs: DEFAULT_MAX_RETAINED_JOBS,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            default_lock_timeout: None,
        }
    }
}
