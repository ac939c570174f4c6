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

use schema::ValidationErrors;
use serde::{Deserialize, Serialize};

use crate::job::JobId;

/// Coarse error category that callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    Validation,
    Call,
    LockTimeout,
    Aborted,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Method {0} not found")]
    MethodNotFound(String),
    #[error("Event source {0} not found")]
    EventSourceNotFound(String),
    #[error("Job {0} not found")]
    JobNotFound(JobId),
    #[error("{0}")]
    NotFound(String),
    #[error("No record matched the query")]
    MatchNotFound,
    #[error("Expected exactly one matching record, got {0}")]
    TooManyMatches(usize),
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("Invalid query filter: {0}")]
    InvalidFilter(String),
    /// Raised by method implementations; the dispatcher turns it into [Error::Call].
    #[error("{0}")]
    Failed(String),
    #[error("{method}: {message}")]
    Call { method: String, message: String },
    #[error("Timed out waiting for lock {0}")]
    LockTimeout(String),
    #[error("Job was aborted")]
    Aborted,
    #[error("Job {0} is running and is not abortable")]
    NotAbortable(JobId),
    #[error("Timed out waiting for job {0}")]
    WaitTimeout(JobId),
    #[error("Job manager has shut down")]
    JobManagerUnavailable,
}

impl Error {
    pub fn failed(message: impl ToString) -> Self {
        Error::Failed(message.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MethodNotFound(_)
            | Error::EventSourceNotFound(_)
            | Error::JobNotFound(_)
            | Error::NotFound(_)
            | Error::MatchNotFound
            | Error::TooManyMatches(_) => ErrorKind::NotFound,
            Error::Validation(_) | Error::InvalidFilter(_) => ErrorKind::Validation,
            Error::Failed(_)
            | Error::Call { .. }
            | Error::NotAbortable(_)
            | Error::WaitTimeout(_)
            | Error::JobManagerUnavailable => ErrorKind::Call,
            Error::LockTimeout(_) => ErrorKind::LockTimeout,
            Error::Aborted => ErrorKind::Aborted,
        }
    }

    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Error::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Problems detected while assembling the registry. These are startup-fatal.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Method {0} is already registered")]
    DuplicateMethod(String),
    #[error("Event source {0} is already registered")]
    DuplicateEventSource(String),
    #[error("Invalid name {0:?}: expected non-empty dot-separated segments")]
    InvalidName(String),
}

/// Dotted names like `ctdb.private.ips.query`: no empty segments, no whitespace.
pub(crate) fn check_name(name: &str) -> Result<(), RegistryError> {
    let valid = !name.is_empty()
        && name.split('.').all(|segment| {
            !segment.is_empty() && !segment.chars().any(char::is_whitespace)
        });
    utils::ensure!(valid, RegistryError::InvalidName(name.to_owned()));
    Ok(())
}
