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

//! Mapping of middleware errors onto JSON-RPC error objects.
//!
//! Codes follow the errno values the middleware clients already branch on. Every error
//! carries its kind as data, validation errors also carry the offending fields.

use jsonrpsee::types::{ErrorObject, ErrorObjectOwned};
use middleware::{Error, ErrorKind};
use serde_json::json;

pub use jsonrpsee::core::{RpcResult, SubscriptionResult};

pub const ENOENT: i32 = 2;
pub const EFAULT: i32 = 14;
pub const EINVAL: i32 = 22;
pub const ETIMEDOUT: i32 = 110;
pub const ECANCELED: i32 = 125;

pub fn error_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::NotFound => ENOENT,
        ErrorKind::Validation => EINVAL,
        ErrorKind::Call => EFAULT,
        ErrorKind::LockTimeout => ETIMEDOUT,
        ErrorKind::Aborted => ECANCELED,
    }
}

pub fn to_rpc_error(error: Error) -> ErrorObjectOwned {
    let kind = error.kind();
    let data = match error.validation_errors() {
        Some(errors) => json!({"kind": kind, "errors": errors}),
        None => json!({"kind": kind}),
    };
    ErrorObject::owned(error_code(kind), error.to_string(), Some(data))
}

pub fn handle_result<T>(result: Result<T, Error>) -> RpcResult<T> {
    result.map_err(to_rpc_error)
}
