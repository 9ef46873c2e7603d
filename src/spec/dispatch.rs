//! Type-dispatch tables.
//!
//! An ordered list of `(runtime type check, transform)` pairs. The first check a
//! value satisfies picks the transform; a value matching nothing passes through.
//! The code compiler renders a table as a conditional cascade, the runtime
//! interprets it directly, and the documentation compiler describes it.
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::SpecError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeCheck {
    Array,
    String,
    Number,
    Boolean,
    Object,
}

impl TypeCheck {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "array" => Some(Self::Array),
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "object" => Some(Self::Object),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Array => "array",
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
        }
    }

    /// Name of the runtime helper that performs this check.
    pub fn helper(self) -> &'static str {
        match self {
            Self::Array => "isArray",
            Self::String => "isString",
            Self::Number => "isNumber",
            Self::Boolean => "isBoolean",
            Self::Object => "isObject",
        }
    }

    /// Plain-object check excludes arrays.
    pub fn matches(self, v: &Value) -> bool {
        match self {
            Self::Array => v.is_array(),
            Self::String => v.is_string(),
            Self::Number => v.is_number(),
            Self::Boolean => v.is_boolean(),
            Self::Object => v.is_object(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeRule {
    /// Wrap the value as `{key: value}` plus the fixed companion assignments.
    Key { key: String, set: IndexMap<String, Value> },
    /// Apply a sub-table to every array element.
    Map(TypeTable),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeTable {
    pub cases: Vec<(TypeCheck, TypeRule)>,
}

/// One documented dispatch case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocCase {
    pub type_name: &'static str,
    pub array: bool,
    pub key: String,
}

impl TypeTable {
    pub fn parse(method: &str, v: &Value) -> Result<Self, SpecError> {
        let Some(obj) = v.as_object() else {
            return Err(SpecError::MalformedTypeRule {
                method: method.to_owned(),
                check: "*".to_owned(),
                reason: format!("expected an object, got {v}"),
            });
        };
        let mut cases = Vec::with_capacity(obj.len());
        for (name, rule) in obj {
            let check = TypeCheck::from_name(name).ok_or_else(|| SpecError::UnknownTypeCheck {
                method: method.to_owned(),
                check: name.clone(),
            })?;
            cases.push((check, parse_rule(method, name, rule)?));
        }
        Ok(Self { cases })
    }

    /// Cases as documented: element-mapped cases first, then direct ones, each
    /// group sorted by type name. Nested maps below the first level are not listed.
    pub fn doc_cases(&self) -> Vec<DocCase> {
        let mut out = Vec::new();
        for (check, rule) in &self.cases {
            match rule {
                TypeRule::Key { key, .. } => out.push(DocCase {
                    type_name: check.name(),
                    array: false,
                    key: key.clone(),
                }),
                TypeRule::Map(sub) => {
                    for (inner, rule) in &sub.cases {
                        if let TypeRule::Key { key, .. } = rule {
                            out.push(DocCase { type_name: inner.name(), array: true, key: key.clone() });
                        }
                    }
                }
            }
        }
        out.sort_by(|a, b| b.array.cmp(&a.array).then_with(|| a.type_name.cmp(b.type_name)));
        out
    }

    /// Interpret the table against one value.
    pub fn apply(&self, v: Value) -> Value {
        for (check, rule) in &self.cases {
            if !check.matches(&v) {
                continue;
            }
            return match rule {
                TypeRule::Key { key, set } => {
                    let mut out = Map::new();
                    out.insert(key.clone(), v);
                    for (k, x) in set {
                        out.insert(k.clone(), x.clone());
                    }
                    Value::Object(out)
                }
                TypeRule::Map(sub) => match v {
                    Value::Array(xs) => Value::Array(xs.into_iter().map(|x| sub.apply(x)).collect()),
                    other => other,
                },
            };
        }
        v
    }
}

fn parse_rule(method: &str, check: &str, rule: &Value) -> Result<TypeRule, SpecError> {
    let malformed = |reason: &str| SpecError::MalformedTypeRule {
        method: method.to_owned(),
        check: check.to_owned(),
        reason: reason.to_owned(),
    };
    if let Some(map) = rule.get("map") {
        return Ok(TypeRule::Map(TypeTable::parse(method, map)?));
    }
    let key = rule
        .get("key")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("expected `key` or `map`"))?;
    let set = match rule.get("set") {
        None | Some(Value::Null) => IndexMap::new(),
        Some(Value::Object(m)) => m.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        Some(_) => return Err(malformed("`set` must be an object")),
    };
    Ok(TypeRule::Key { key: key.to_owned(), set })
}

/// Positional tables: an array holds one (nullable) table per argument position,
/// a bare object is the table for position 0.
pub fn parse_tables(method: &str, v: &Value) -> Result<Vec<Option<TypeTable>>, SpecError> {
    match v {
        Value::Null => Ok(Vec::new()),
        Value::Array(xs) => xs
            .iter()
            .map(|x| match x {
                Value::Null => Ok(None),
                other => TypeTable::parse(method, other).map(Some),
            })
            .collect(),
        other => Ok(vec![Some(TypeTable::parse(method, other)?)]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn channel_table() -> TypeTable {
        TypeTable::parse("detail", &json!({
            "array": { "map": { "string": { "key": "field", "set": { "type": "nominal" } } } },
            "string": { "key": "field", "set": { "type": "nominal" } }
        }))
        .unwrap()
    }

    #[test]
    fn first_matching_case_wins() {
        let t = channel_table();
        assert_eq!(t.apply(json!("a")), json!({ "field": "a", "type": "nominal" }));
        assert_eq!(
            t.apply(json!(["a", 1])),
            json!([{ "field": "a", "type": "nominal" }, 1])
        );
    }

    #[test]
    fn unmatched_value_passes_through() {
        let t = channel_table();
        assert_eq!(t.apply(json!({ "field": "x" })), json!({ "field": "x" }));
        assert_eq!(t.apply(json!(3)), json!(3));
    }

    #[test]
    fn object_check_excludes_arrays() {
        let t = TypeTable::parse("m", &json!({ "object": { "key": "values" } })).unwrap();
        assert_eq!(t.apply(json!([1])), json!([1]));
        assert_eq!(t.apply(json!({ "a": 1 })), json!({ "values": { "a": 1 } }));
    }

    #[test]
    fn doc_cases_list_array_cases_first() {
        let t = TypeTable::parse("m", &json!({
            "string": { "key": "url" },
            "array": { "map": { "string": { "key": "field" }, "number": { "key": "value" } } },
            "boolean": { "key": "flag" }
        }))
        .unwrap();
        let cases: Vec<(&str, bool)> = t.doc_cases().iter().map(|c| (c.type_name, c.array)).collect();
        assert_eq!(
            cases,
            vec![("number", true), ("string", true), ("boolean", false), ("string", false)]
        );
    }

    #[test]
    fn malformed_tables_are_rejected() {
        assert!(matches!(
            TypeTable::parse("m", &json!({ "date": { "key": "x" } })),
            Err(SpecError::UnknownTypeCheck { .. })
        ));
        assert!(matches!(
            TypeTable::parse("m", &json!({ "string": { "set": {} } })),
            Err(SpecError::MalformedTypeRule { .. })
        ));
    }

    #[test]
    fn positional_tables() {
        let t = parse_tables("m", &json!([null, { "string": { "key": "type" } }])).unwrap();
        assert_eq!(t.len(), 2);
        assert!(t[0].is_none() && t[1].is_some());
        let t = parse_tables("m", &json!({ "string": { "key": "type" } })).unwrap();
        assert_eq!(t.len(), 1);
    }
}
