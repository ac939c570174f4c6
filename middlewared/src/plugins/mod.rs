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

//! Built-in plugins of the daemon.

pub mod core;
pub mod reporting;

use middleware::{MiddlewareBuilder, RegistryError};

/// Register every built-in service and event source.
pub fn register(builder: &mut MiddlewareBuilder) -> Result<(), RegistryError> {
    builder.register_service("core", core::methods())?;
    builder.register_event_source(
        reporting::REALTIME_SOURCE,
        reporting::realtime_params(),
        reporting::RealtimeSource::from_args,
    )?;
    Ok(())
}
