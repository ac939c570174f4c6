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

//! Generic filtering, ordering and pagination of query results.
//!
//! Filters are JSON triples `[field, operator, value]`, all of which must match. A filter of the
//! form `["OR", [branch, ...]]` matches if any branch does; a branch is either a single triple or
//! a list of triples that must all match. Fields may be dotted paths into nested mappings.

use std::cmp::Ordering;

use regex::Regex;
use schema::{validators::Range, Param};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct QueryOptions {
    /// Return the single matching record instead of a list.
    pub get: bool,
    /// Return the number of matching records instead of the records.
    pub count: bool,
    /// Sort keys; `-field` sorts descending, `nulls_first:`/`nulls_last:` prefixes place nulls.
    pub order_by: Vec<String>,
    /// Keep only these (possibly dotted) fields of every record.
    pub select: Vec<String>,
    pub offset: usize,
    /// Zero means no limit.
    pub limit: usize,
}

impl QueryOptions {
    pub fn from_value(value: &Value) -> Result<Self, Error> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value.clone())
            .map_err(|e| Error::InvalidFilter(format!("bad query options: {e}")))
    }
}

/// Schema of the first argument of query methods.
pub fn query_filters_param() -> Param {
    Param::list("query-filters", []).default(Value::Array(Vec::new()))
}

/// Schema of the second argument of query methods.
pub fn query_options_param() -> Param {
    Param::dict(
        "query-options",
        [
            Param::bool("get").default(false),
            Param::bool("count").default(false),
            Param::list("order_by", [Param::str("field")]).default(Value::Array(Vec::new())),
            Param::list("select", [Param::str("field")]).default(Value::Array(Vec::new())),
            Param::int("offset").default(0).validator(Range::min(0)),
            Param::int("limit").default(0).validator(Range::min(0)),
        ],
    )
}

#[derive(Debug)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Regex(Regex),
    In,
    NotIn,
    ReverseIn,
    ReverseNotIn,
    StartsWith,
    NotStartsWith,
    EndsWith,
    NotEndsWith,
}

impl Operator {
    fn parse(op: &str, value: &Value) -> Result<Self, Error> {
        let op = match op {
            "=" => Operator::Eq,
            "!=" => Operator::Ne,
            ">" => Operator::Gt,
            ">=" => Operator::Ge,
            "<" => Operator::Lt,
            "<=" => Operator::Le,
            "~" => {
                let pattern = value.as_str().ok_or_else(|| {
                    Error::InvalidFilter("operator ~ requires a string pattern".into())
                })?;
                let regex = Regex::new(pattern)
                    .map_err(|e| Error::InvalidFilter(format!("bad pattern {pattern:?}: {e}")))?;
                Operator::Regex(regex)
            }
            "in" | "nin" if !value.is_array() => {
                return Err(Error::InvalidFilter(format!("operator {op} requires a list")));
            }
            "in" => Operator::In,
            "nin" => Operator::NotIn,
            "rin" => Operator::ReverseIn,
            "rnin" => Operator::ReverseNotIn,
            "^" => Operator::StartsWith,
            "!^" => Operator::NotStartsWith,
            "$" => Operator::EndsWith,
            "!$" => Operator::NotEndsWith,
            other => return Err(Error::InvalidFilter(format!("unknown operator {other:?}"))),
        };
        Ok(op)
    }

    fn matches(&self, field: &Value, value: &Value) -> bool {
        let strings = || field.as_str().zip(value.as_str());
        match self {
            Operator::Eq => values_equal(field, value),
            Operator::Ne => !values_equal(field, value),
            Operator::Gt => compare_same_type(field, value) == Some(Ordering::Greater),
            Operator::Ge => matches!(
                compare_same_type(field, value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::Lt => compare_same_type(field, value) == Some(Ordering::Less),
            Operator::Le => matches!(
                compare_same_type(field, value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Operator::Regex(regex) => field.as_str().is_some_and(|s| regex.is_match(s)),
            Operator::In => contains(value, field),
            Operator::NotIn => !contains(value, field),
            Operator::ReverseIn => contains(field, value),
            Operator::ReverseNotIn => !contains(field, value),
            Operator::StartsWith => strings().is_some_and(|(f, v)| f.starts_with(v)),
            Operator::NotStartsWith => !strings().is_some_and(|(f, v)| f.starts_with(v)),
            Operator::EndsWith => strings().is_some_and(|(f, v)| f.ends_with(v)),
            Operator::NotEndsWith => !strings().is_some_and(|(f, v)| f.ends_with(v)),
        }
    }
}

#[derive(Debug)]
pub enum Filter {
    Compare {
        field: String,
        op: Operator,
        value: Value,
    },
    Or(Vec<Vec<Filter>>),
}

impl Filter {
    pub fn parse(filter: &Value) -> Result<Self, Error> {
        let invalid = || Error::InvalidFilter(format!("malformed filter {filter}"));
        let items = filter.as_array().ok_or_else(invalid)?;

        match items.as_slice() {
            [Value::String(or), Value::Array(branches)] if or == "OR" => branches
                .iter()
                .map(|branch| match branch.as_array() {
                    Some(group) if group.first().is_some_and(Value::is_array) => {
                        parse_filters(group)
                    }
                    _ => Ok(vec![Filter::parse(branch)?]),
                })
                .collect::<Result<_, _>>()
                .map(Filter::Or),
            [Value::String(field), Value::String(op), value] => Ok(Filter::Compare {
                field: field.clone(),
                op: Operator::parse(op, value)?,
                value: value.clone(),
            }),
            _ => Err(invalid()),
        }
    }

    pub fn matches(&self, record: &Value) -> bool {
        match self {
            Filter::Compare { field, op, value } => {
                op.matches(get_path(record, field).unwrap_or(&Value::Null), value)
            }
            Filter::Or(branches) => branches
                .iter()
                .any(|branch| branch.iter().all(|filter| filter.matches(record))),
        }
    }
}

pub fn parse_filters(filters: &[Value]) -> Result<Vec<Filter>, Error> {
    filters.iter().map(Filter::parse).collect()
}

/// Apply `filters` and `options` to `records`.
///
/// The result is a list of records, the record count (`count`) or one record (`get`).
pub fn filter_list(
    records: impl IntoIterator<Item = Value>,
    filters: &[Value],
    options: &QueryOptions,
) -> Result<Value, Error> {
    let filters = parse_filters(filters)?;
    let mut rows: Vec<Value> = records
        .into_iter()
        .filter(|record| filters.iter().all(|filter| filter.matches(record)))
        .collect();

    if options.count {
        return Ok(Value::from(rows.len()));
    }

    if options.get {
        // Pagination never narrows the match set of a single-record query.
        let row = match rows.len() {
            0 => return Err(Error::MatchNotFound),
            1 => rows.remove(0),
            n => return Err(Error::TooManyMatches(n)),
        };
        return Ok(if options.select.is_empty() {
            row
        } else {
            select_fields(&row, &options.select)
        });
    }

    if !options.order_by.is_empty() {
        let keys: Vec<SortKey> = options.order_by.iter().map(|key| SortKey::parse(key)).collect();
        rows.sort_by(|a, b| {
            keys.iter()
                .map(|key| key.compare(a, b))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        });
    }

    if !options.select.is_empty() {
        rows = rows.iter().map(|row| select_fields(row, &options.select)).collect();
    }

    let rows = rows.into_iter().skip(options.offset);
    let rows: Vec<Value> = if options.limit > 0 {
        rows.take(options.limit).collect()
    } else {
        rows.collect()
    };

    Ok(Value::Array(rows))
}

struct SortKey<'a> {
    field: &'a str,
    descending: bool,
    nulls: Option<Ordering>,
}

impl<'a> SortKey<'a> {
    fn parse(key: &'a str) -> Self {
        let (key, nulls) = if let Some(rest) = key.strip_prefix("nulls_first:") {
            (rest, Some(Ordering::Less))
        } else if let Some(rest) = key.strip_prefix("nulls_last:") {
            (rest, Some(Ordering::Greater))
        } else {
            (key, None)
        };
        match key.strip_prefix('-') {
            Some(field) => Self {
                field,
                descending: true,
                nulls,
            },
            None => Self {
                field: key,
                descending: false,
                nulls,
            },
        }
    }

    fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let a = get_path(a, self.field).unwrap_or(&Value::Null);
        let b = get_path(b, self.field).unwrap_or(&Value::Null);

        if let Some(nulls) = self.nulls {
            match (a.is_null(), b.is_null()) {
                (true, false) => return nulls,
                (false, true) => return nulls.reverse(),
                _ => {}
            }
        }

        let ordering = total_order(a, b);
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

fn get_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    if let Some(value) = record.get(path) {
        return Some(value);
    }
    path.split('.').try_fold(record, |value, segment| match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn select_fields(record: &Value, fields: &[String]) -> Value {
    let mut selected = Map::new();
    'fields: for field in fields {
        let Some(value) = get_path(record, field) else {
            continue;
        };
        let mut segments: Vec<&str> = field.split('.').collect();
        let Some(last) = segments.pop() else {
            continue;
        };
        let mut target = &mut selected;
        for segment in segments {
            let entry = target
                .entry(segment.to_owned())
                .or_insert_with(|| Value::Object(Map::new()));
            let Value::Object(map) = entry else {
                continue 'fields;
            };
            target = map;
        }
        target.insert(last.to_owned(), value.clone());
    }
    Value::Object(selected)
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn contains(haystack: &Value, needle: &Value) -> bool {
    match haystack {
        Value::Array(items) => items.iter().any(|item| values_equal(item, needle)),
        Value::String(s) => needle.as_str().is_some_and(|n| s.contains(n)),
        _ => false,
    }
}

fn compare_same_type(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Nulls first, then by type, then by value within a type.
fn total_order(a: &Value, b: &Value) -> Ordering {
    type_rank(a)
        .cmp(&type_rank(b))
        .then_with(|| compare_same_type(a, b).unwrap_or(Ordering::Equal))
}
