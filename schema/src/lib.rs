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

//! Declarative parameter schemas.
//!
//! A method declares the shape of its positional arguments as a list of [Param]s (see
//! [Accepts]). Before a call is dispatched the raw JSON arguments are cleaned against that list:
//! defaults are filled in, loosely typed input is coerced and every violation found anywhere in
//! the argument tree is collected into [ValidationErrors].

mod accepts;
mod errors;
mod param;
pub mod validators;

pub use accepts::Accepts;
pub use errors::{join_path, FieldError, ValidationErrorKind, ValidationErrors};
pub use param::{Param, ParamKind};
pub use validators::Validator;

pub use serde_json::Value;
