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

//! Log the error of a `Result` in passing, without consuming it.
//!
//! Useful where a failure has nowhere to propagate to, e.g. a reply sent to a caller that may
//! have already gone away:
//! ```ignore
//! _ = result_sender.send(job_id).log_err_pfx("Job submitter went away");
//! ```

use std::fmt::Debug;

use logging::log;

// The module path would be the default target; a short one is just as informative.
const LOG_TARGET: &str = "TapLog";

pub trait TapLog
where
    Self: Sized,
{
    fn log_err(self) -> Self;
    fn log_err_pfx(self, prefix: &str) -> Self;
    fn log_warn(self) -> Self;
    fn log_warn_pfx(self, prefix: &str) -> Self;
    fn log_lvl_pfx(self, log_level: log::Level, prefix: &str) -> Self;
}

// Debug rather than Display: channel send errors carry no Display impl worth reading.
impl<T, E: Debug> TapLog for Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Self {
        self.log_lvl_pfx(log::Level::Error, "")
    }

    #[track_caller]
    fn log_err_pfx(self, prefix: &str) -> Self {
        self.log_lvl_pfx(log::Level::Error, prefix)
    }

    #[track_caller]
    fn log_warn(self) -> Self {
        self.log_lvl_pfx(log::Level::Warn, "")
    }

    #[track_caller]
    fn log_warn_pfx(self, prefix: &str) -> Self {
        self.log_lvl_pfx(log::Level::Warn, prefix)
    }

    #[track_caller]
    fn log_lvl_pfx(self, log_level: log::Level, prefix: &str) -> Self {
        if let Err(ref err) = self {
            let location = std::panic::Location::caller();
            if prefix.is_empty() {
                log::log!(target: LOG_TARGET, log_level, "{err:?} ({location})");
            } else {
                log::log!(target: LOG_TARGET, log_level, "{prefix}: {err:?} ({location})");
            }
        }
        self
    }
}
