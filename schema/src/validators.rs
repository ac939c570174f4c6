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

//! Value constraints attached to a [crate::Param].
//!
//! Validators only see values that already passed the type check of their parameter.

use std::fmt::Debug;

use regex::Regex;
use serde_json::Value;

pub trait Validator: Debug + Send + Sync {
    /// Check the value, returning a human readable message on violation.
    fn validate(&self, value: &Value) -> Result<(), String>;
}

/// Inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    min: Option<f64>,
    max: Option<f64>,
}

impl Range {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn min(min: impl Into<f64>) -> Self {
        Self::new(Some(min.into()), None)
    }

    pub fn max(max: impl Into<f64>) -> Self {
        Self::new(None, Some(max.into()))
    }

    pub fn between(min: impl Into<f64>, max: impl Into<f64>) -> Self {
        Self::new(Some(min.into()), Some(max.into()))
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl Validator for Range {
    fn validate(&self, value: &Value) -> Result<(), String> {
        let Some(number) = value.as_f64() else {
            return Ok(());
        };
        match (self.min, self.max) {
            (Some(min), Some(max)) if number < min || number > max => Err(format!(
                "Should be between {} and {}",
                format_number(min),
                format_number(max)
            )),
            (Some(min), _) if number < min => {
                Err(format!("Should be greater or equal than {}", format_number(min)))
            }
            (_, Some(max)) if number > max => {
                Err(format!("Should be lower or equal than {}", format_number(max)))
            }
            _ => Ok(()),
        }
    }
}

/// Bounds on the length of a string (in characters) or a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Length {
    min: Option<usize>,
    max: Option<usize>,
}

impl Length {
    pub fn new(min: Option<usize>, max: Option<usize>) -> Self {
        Self { min, max }
    }

    pub fn min(min: usize) -> Self {
        Self::new(Some(min), None)
    }

    pub fn max(max: usize) -> Self {
        Self::new(None, Some(max))
    }
}

impl Validator for Length {
    fn validate(&self, value: &Value) -> Result<(), String> {
        let len = match value {
            Value::String(s) => s.chars().count(),
            Value::Array(items) => items.len(),
            _ => return Ok(()),
        };
        if let Some(min) = self.min {
            if len < min {
                return Err(format!("Length should be at least {min}"));
            }
        }
        if let Some(max) = self.max {
            if len > max {
                return Err(format!("Length should be at most {max}"));
            }
        }
        Ok(())
    }
}

/// The value must equal one of the listed choices.
#[derive(Debug, Clone, PartialEq)]
pub struct OneOf(pub Vec<Value>);

impl Validator for OneOf {
    fn validate(&self, value: &Value) -> Result<(), String> {
        if self.0.contains(value) {
            Ok(())
        } else {
            let choices: Vec<String> = self.0.iter().map(Value::to_string).collect();
            Err(format!("Should be one of: {}", choices.join(", ")))
        }
    }
}

/// String values must match the pattern.
#[derive(Debug, Clone)]
pub struct Match {
    pattern: Regex,
    explanation: Option<String>,
}

impl Match {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            explanation: None,
        })
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }
}

impl Validator for Match {
    fn validate(&self, value: &Value) -> Result<(), String> {
        match value.as_str() {
            Some(s) if !self.pattern.is_match(s) => Err(self
                .explanation
                .clone()
                .unwrap_or_else(|| format!("Value does not match {:?} pattern", self.pattern.as_str()))),
            _ => Ok(()),
        }
    }
}
