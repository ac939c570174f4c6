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

use serde_json::Value;

use crate::{
    errors::{ValidationErrorKind, ValidationErrors},
    param::Param,
};

/// The ordered positional parameters of a method.
#[derive(Debug, Clone, Default)]
pub struct Accepts {
    params: Vec<Param>,
}

impl Accepts {
    pub fn new(params: impl IntoIterator<Item = Param>) -> Self {
        Self {
            params: params.into_iter().collect(),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Validate positional arguments, returning one cleaned value per declared parameter.
    ///
    /// Absent optional arguments without a default come back as `null`. Each parameter
    /// reports its errors under its own name.
    pub fn clean(&self, args: &[Value]) -> Result<Vec<Value>, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if args.len() > self.params.len() {
            errors.add(
                "args",
                ValidationErrorKind::UnexpectedField,
                format!(
                    "Too many arguments (expected at most {}, got {})",
                    self.params.len(),
                    args.len()
                ),
            );
        }

        let cleaned = self
            .params
            .iter()
            .enumerate()
            .map(|(i, param)| {
                param.clean(args.get(i), param.name(), &mut errors).unwrap_or(Value::Null)
            })
            .collect();

        errors.check()?;
        Ok(cleaned)
    }
}

impl FromIterator<Param> for Accepts {
    fn from_iter<I: IntoIterator<Item = Param>>(iter: I) -> Self {
        Self::new(iter)
    }
}
