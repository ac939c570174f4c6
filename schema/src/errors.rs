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

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    /// A required attribute was not supplied.
    Required,
    /// The supplied value has the wrong type and could not be coerced.
    InvalidType,
    /// `null` was supplied for an attribute that does not accept it.
    NullNotAllowed,
    /// A dictionary contained a key its schema does not declare.
    UnexpectedField,
    /// A validator (range, length, ...) rejected the value.
    Constraint,
    /// Raised by method implementations for domain-level checks.
    Custom,
}

/// A single invalid field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub attribute: String,
    pub kind: ValidationErrorKind,
    pub message: String,
}

/// Accumulator of field errors. A call fails iff this is non-empty once validation is done.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        attribute: impl Into<String>,
        kind: ValidationErrorKind,
        message: impl Into<String>,
    ) {
        self.errors.push(FieldError {
            attribute: attribute.into(),
            kind,
            message: message.into(),
        })
    }

    /// Record a domain-level error, e.g. "address already in use".
    pub fn add_custom(&mut self, attribute: impl Into<String>, message: impl Into<String>) {
        self.add(attribute, ValidationErrorKind::Custom, message)
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    pub fn contains(&self, attribute: &str) -> bool {
        self.find(attribute).is_some()
    }

    pub fn find(&self, attribute: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.attribute == attribute)
    }

    /// `Err(self)` if anything was recorded, for use with `?`.
    pub fn check(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "[{}] {}", error.attribute, error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Attribute path of `child` inside `parent`. Anonymous parents add no prefix.
pub fn join_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_owned()
    } else {
        format!("{parent}.{child}")
    }
}
