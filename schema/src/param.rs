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

use std::{net::IpAddr, sync::Arc};

use serde_json::{Map, Number, Value};

use crate::{
    errors::{join_path, ValidationErrorKind, ValidationErrors},
    validators::Validator,
};

#[derive(Debug, Clone)]
pub enum ParamKind {
    /// Anything goes, the value is passed through untouched.
    Any,
    Bool,
    Int,
    Float,
    Str,
    /// An IPv4 or IPv6 address, normalized to its canonical text form.
    IpAddr,
    /// A mapping with declared attributes.
    Dict {
        attrs: Vec<Param>,
        additional_attrs: bool,
    },
    /// A list whose items must each match one of `items` (any item if empty).
    List { items: Vec<Param> },
}

/// A named, typed argument slot.
#[derive(Debug, Clone)]
pub struct Param {
    name: String,
    kind: ParamKind,
    required: bool,
    default: Option<Value>,
    null: bool,
    validators: Vec<Arc<dyn Validator>>,
    description: Option<String>,
}

impl Param {
    fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default: None,
            null: false,
            validators: Vec::new(),
            description: None,
        }
    }

    pub fn any(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Any)
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Bool)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Int)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Float)
    }

    pub fn str(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Str)
    }

    pub fn ip_addr(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::IpAddr)
    }

    pub fn dict(name: impl Into<String>, attrs: impl IntoIterator<Item = Param>) -> Self {
        Self::new(
            name,
            ParamKind::Dict {
                attrs: attrs.into_iter().collect(),
                additional_attrs: false,
            },
        )
    }

    pub fn list(name: impl Into<String>, items: impl IntoIterator<Item = Param>) -> Self {
        Self::new(
            name,
            ParamKind::List {
                items: items.into_iter().collect(),
            },
        )
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Accept `null` in addition to values of the declared type.
    pub fn nullable(mut self) -> Self {
        self.null = true;
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Keep undeclared keys of a dictionary instead of rejecting them. No-op for other kinds.
    pub fn additional_attrs(mut self) -> Self {
        if let ParamKind::Dict {
            additional_attrs, ..
        } = &mut self.kind
        {
            *additional_attrs = true;
        }
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn get_description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The same schema with nothing required and no defaults, for partial updates.
    ///
    /// Nested dictionaries are relaxed too, so an update may touch a single leaf.
    pub fn partial(&self) -> Self {
        let kind = match &self.kind {
            ParamKind::Dict {
                attrs,
                additional_attrs,
            } => ParamKind::Dict {
                attrs: attrs.iter().map(Param::partial).collect(),
                additional_attrs: *additional_attrs,
            },
            kind => kind.clone(),
        };
        Self {
            kind,
            required: false,
            default: None,
            ..self.clone()
        }
    }

    /// JSON description of the schema, as reported to introspecting clients.
    pub fn describe(&self) -> Value {
        let mut description = Map::new();
        description.insert("_name_".into(), Value::String(self.name.clone()));
        description.insert("type".into(), Value::String(self.type_name().into()));
        description.insert("required".into(), Value::Bool(self.required));
        description.insert("null".into(), Value::Bool(self.null));
        if let Some(default) = &self.default {
            description.insert("default".into(), default.clone());
        }
        if let Some(text) = &self.description {
            description.insert("description".into(), Value::String(text.clone()));
        }
        match &self.kind {
            ParamKind::Dict {
                attrs,
                additional_attrs,
            } => {
                description.insert(
                    "properties".into(),
                    Value::Array(attrs.iter().map(Param::describe).collect()),
                );
                description.insert("additional_attrs".into(), Value::Bool(*additional_attrs));
            }
            ParamKind::List { items } => {
                description.insert(
                    "items".into(),
                    Value::Array(items.iter().map(Param::describe).collect()),
                );
            }
            _ => {}
        }
        Value::Object(description)
    }

    fn type_name(&self) -> &'static str {
        match self.kind {
            ParamKind::Any => "any",
            ParamKind::Bool => "boolean",
            ParamKind::Int => "integer",
            ParamKind::Float => "number",
            ParamKind::Str => "string",
            ParamKind::IpAddr => "ipaddr",
            ParamKind::Dict { .. } => "object",
            ParamKind::List { .. } => "array",
        }
    }

    /// Clean a possibly missing value found at `path`.
    ///
    /// Returns the normalized value, or `None` if the value is absent (and may stay absent) or
    /// invalid. Problems are appended to `errors`; nothing is ever partially applied.
    pub fn clean(
        &self,
        value: Option<&Value>,
        path: &str,
        errors: &mut ValidationErrors,
    ) -> Option<Value> {
        let value = match value {
            Some(value) => value,
            None => return self.clean_missing(path, errors),
        };

        if value.is_null() {
            if self.null {
                return Some(Value::Null);
            }
            errors.add(path, ValidationErrorKind::NullNotAllowed, "null not allowed");
            return None;
        }

        let errors_before = errors.len();
        let cleaned = self.clean_present(value, path, errors)?;

        if errors.len() == errors_before {
            for validator in &self.validators {
                if let Err(message) = validator.validate(&cleaned) {
                    errors.add(path, ValidationErrorKind::Constraint, message);
                }
            }
        }

        Some(cleaned)
    }

    fn clean_missing(&self, path: &str, errors: &mut ValidationErrors) -> Option<Value> {
        if self.required {
            errors.add(path, ValidationErrorKind::Required, "attribute required");
            return None;
        }
        if let Some(default) = &self.default {
            return Some(default.clone());
        }
        match &self.kind {
            // Missing dictionaries still get their nested defaults.
            ParamKind::Dict { .. } => self.clean_present(&Value::Object(Map::new()), path, errors),
            _ => None,
        }
    }

    fn clean_present(
        &self,
        value: &Value,
        path: &str,
        errors: &mut ValidationErrors,
    ) -> Option<Value> {
        let invalid = |errors: &mut ValidationErrors, message: &str| {
            errors.add(path, ValidationErrorKind::InvalidType, message);
            None
        };

        match &self.kind {
            ParamKind::Any => Some(value.clone()),
            ParamKind::Bool => match value {
                Value::Bool(_) => Some(value.clone()),
                _ => invalid(errors, "Not a boolean"),
            },
            ParamKind::Int => match coerce_int(value) {
                Some(number) => Some(Value::Number(number)),
                None => invalid(errors, "Not an integer"),
            },
            ParamKind::Float => match coerce_float(value) {
                Some(number) => Some(Value::Number(number)),
                None => invalid(errors, "Not a number"),
            },
            ParamKind::Str => match value {
                Value::String(_) => Some(value.clone()),
                Value::Number(n) if n.is_i64() || n.is_u64() => Some(Value::String(n.to_string())),
                _ => invalid(errors, "Not a string"),
            },
            ParamKind::IpAddr => match value.as_str().map(str::parse::<IpAddr>) {
                Some(Ok(addr)) => Some(Value::String(addr.to_string())),
                _ => invalid(errors, "Not a valid IP address"),
            },
            ParamKind::Dict {
                attrs,
                additional_attrs,
            } => match value {
                Value::Object(map) => {
                    Some(Value::Object(clean_dict(map, attrs, *additional_attrs, path, errors)))
                }
                _ => invalid(errors, "Not a dictionary"),
            },
            ParamKind::List { items } => match value {
                Value::Array(values) => Some(Value::Array(clean_list(values, items, path, errors))),
                _ => invalid(errors, "Not a list"),
            },
        }
    }
}

fn coerce_int(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.clone()),
        Value::Number(n) => n
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| Number::from(f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok().map(Number::from),
        _ => None,
    }
}

fn coerce_float(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => s.trim().parse::<f64>().ok().and_then(Number::from_f64),
        _ => None,
    }
}

fn clean_dict(
    map: &Map<String, Value>,
    attrs: &[Param],
    additional_attrs: bool,
    path: &str,
    errors: &mut ValidationErrors,
) -> Map<String, Value> {
    let mut cleaned = Map::new();

    for attr in attrs {
        let attr_path = join_path(path, attr.name());
        if let Some(value) = attr.clean(map.get(attr.name()), &attr_path, errors) {
            cleaned.insert(attr.name().to_owned(), value);
        }
    }

    for (key, value) in map {
        if attrs.iter().any(|attr| attr.name() == key) {
            continue;
        }
        if additional_attrs {
            cleaned.insert(key.clone(), value.clone());
        } else {
            errors.add(
                join_path(path, key),
                ValidationErrorKind::UnexpectedField,
                "Field was not expected",
            );
        }
    }

    cleaned
}

fn clean_list(
    values: &[Value],
    items: &[Param],
    path: &str,
    errors: &mut ValidationErrors,
) -> Vec<Value> {
    if items.is_empty() {
        return values.to_vec();
    }

    let mut cleaned = Vec::with_capacity(values.len());

    for (index, value) in values.iter().enumerate() {
        let item_path = join_path(path, &index.to_string());
        let mut first_failure = None;
        let mut accepted = None;

        for item in items {
            let mut item_errors = ValidationErrors::new();
            let result = item.clean(Some(value), &item_path, &mut item_errors);
            if item_errors.is_empty() {
                accepted = result;
                break;
            }
            first_failure.get_or_insert(item_errors);
        }

        match (accepted, first_failure) {
            (Some(value), _) => cleaned.push(value),
            (None, Some(failure)) if items.len() == 1 => errors.extend(failure),
            (None, _) => {
                let names: Vec<&str> = items.iter().map(Param::name).collect();
                errors.add(
                    item_path,
                    ValidationErrorKind::InvalidType,
                    format!("Item is not valid per list types: {}", names.join(", ")),
                );
            }
        }
    }

    cleaned
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::validators::Range;

    fn clean(param: &Param, value: Value) -> Result<Option<Value>, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let cleaned = param.clean(Some(&value), param.name(), &mut errors);
        errors.check().map(|()| cleaned)
    }

    #[rstest]
    #[case(Param::int("i"), json!("42"), json!(42))]
    #[case(Param::int("i"), json!(7.0), json!(7))]
    #[case(Param::float("f"), json!(3), json!(3))]
    #[case(Param::float("f"), json!("2.5"), json!(2.5))]
    #[case(Param::str("s"), json!(12), json!("12"))]
    #[case(Param::ip_addr("ip"), json!("::ffff:10.0.0.1"), json!("::ffff:10.0.0.1"))]
    #[case(Param::ip_addr("ip"), json!("192.168.0.10"), json!("192.168.0.10"))]
    fn coercions(#[case] param: Param, #[case] input: Value, #[case] expected: Value) {
        assert_eq!(clean(&param, input), Ok(Some(expected)));
    }

    #[rstest]
    #[case(Param::bool("b"), json!("true"), "Not a boolean")]
    #[case(Param::int("i"), json!("4x"), "Not an integer")]
    #[case(Param::int("i"), json!(1.5), "Not an integer")]
    #[case(Param::str("s"), json!(true), "Not a string")]
    #[case(Param::ip_addr("ip"), json!("300.1.1.1"), "Not a valid IP address")]
    #[case(Param::dict("d", []), json!([]), "Not a dictionary")]
    #[case(Param::list("l", []), json!({}), "Not a list")]
    fn type_mismatches(#[case] param: Param, #[case] input: Value, #[case] message: &str) {
        let errors = clean(&param, input).unwrap_err();
        let error = errors.find(param.name()).unwrap();
        assert_eq!(error.kind, ValidationErrorKind::InvalidType);
        assert_eq!(error.message, message);
    }

    #[test]
    fn null_handling() {
        assert_eq!(clean(&Param::str("s").nullable(), Value::Null), Ok(Some(Value::Null)));
        let errors = clean(&Param::str("s"), Value::Null).unwrap_err();
        assert_eq!(errors.find("s").unwrap().kind, ValidationErrorKind::NullNotAllowed);
    }

    #[test]
    fn dict_collects_every_error() {
        let param = Param::dict(
            "private_update",
            [
                Param::bool("enable").required(),
                Param::int("weight").validator(Range::between(0, 10)),
                Param::str("comment").default("none"),
            ],
        );

        let errors = clean(&param, json!({"weight": 11, "bogus": 1})).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(
            errors.find("private_update.enable").unwrap().kind,
            ValidationErrorKind::Required
        );
        assert_eq!(
            errors.find("private_update.weight").unwrap().kind,
            ValidationErrorKind::Constraint
        );
        assert_eq!(
            errors.find("private_update.bogus").unwrap().kind,
            ValidationErrorKind::UnexpectedField
        );

        let cleaned = clean(&param, json!({"enable": true})).unwrap();
        assert_eq!(cleaned, Some(json!({"enable": true, "comment": "none"})));
    }

    #[test]
    fn additional_attrs_are_kept() {
        let param = Param::dict("cpu", [Param::int("count")]).additional_attrs();
        assert_eq!(
            clean(&param, json!({"count": "2", "model": "x86"})),
            Ok(Some(json!({"count": 2, "model": "x86"})))
        );
    }

    #[test]
    fn missing_dict_gets_nested_defaults() {
        let param = Param::dict("", [Param::int("interval").default(2)]);
        let mut errors = ValidationErrors::new();
        assert_eq!(param.clean(None, "", &mut errors), Some(json!({"interval": 2})));
        assert!(errors.is_empty());
    }

    #[test]
    fn list_items() {
        let single = Param::list("ports", [Param::int("port").validator(Range::between(1, 65535))]);
        assert_eq!(clean(&single, json!(["22", 80])), Ok(Some(json!([22, 80]))));

        let errors = clean(&single, json!([22, 0, "x"])).unwrap_err();
        assert_eq!(errors.find("ports.1").unwrap().kind, ValidationErrorKind::Constraint);
        assert_eq!(errors.find("ports.2").unwrap().kind, ValidationErrorKind::InvalidType);

        let mixed = Param::list("hosts", [Param::ip_addr("ip"), Param::dict("host", [Param::str("name")])]);
        assert_eq!(
            clean(&mixed, json!(["10.0.0.1", {"name": "nas"}])),
            Ok(Some(json!(["10.0.0.1", {"name": "nas"}])))
        );
        let errors = clean(&mixed, json!([true])).unwrap_err();
        assert_eq!(errors.find("hosts.0").unwrap().kind, ValidationErrorKind::InvalidType);
    }

    #[test]
    fn partial_relaxes_nested_requirements() {
        let param = Param::dict(
            "pool_update",
            [
                Param::str("name").required(),
                Param::dict("scrub", [Param::int("threshold").default(35).required()]),
            ],
        )
        .required();

        let partial = param.partial();
        assert!(!partial.is_required());
        assert_eq!(clean(&partial, json!({"scrub": {}})), Ok(Some(json!({"scrub": {}}))));
    }

    #[test]
    fn describe_nested() {
        let param = Param::dict("options", [Param::bool("force").default(false)]).nullable();
        assert_eq!(
            param.describe(),
            json!({
                "_name_": "options",
                "type": "object",
                "required": false,
                "null": true,
                "additional_attrs": false,
                "properties": [
                    {"_name_": "force", "type": "boolean", "required": false, "null": false, "default": false},
                ],
            })
        );
    }

    #[test]
    fn validators_skip_ill_typed_values() {
        let param = Param::int("interval").validator(Range::min(2));
        let errors = clean(&param, json!("soon")).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.find("interval").unwrap().kind, ValidationErrorKind::InvalidType);
    }
}
