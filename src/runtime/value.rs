//! Value primitives shared by every builder: flattening, merging, nesting and
//! type dispatch.
use serde_json::{Map, Value};

use super::Instance;
use crate::spec::{MergePolicy, TypeTable};

/// A call-time argument: plain JSON or another builder.
#[derive(Debug, Clone)]
pub enum Arg<'rt> {
    Json(Value),
    Node(Instance<'rt>),
}

impl<'rt> Arg<'rt> {
    /// Serialized form. `keyed` selects the flagged serialization variant of builders.
    pub fn to_value(&self, keyed: bool) -> Value {
        match self {
            Self::Json(v) => v.clone(),
            Self::Node(inst) => inst.to_json(keyed),
        }
    }

    pub fn into_value(self, keyed: bool) -> Value {
        match self {
            Self::Json(v) => v,
            Self::Node(inst) => inst.to_json(keyed),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(v) => Some(v),
            Self::Node(_) => None,
        }
    }

    pub fn into_node(self) -> Option<Instance<'rt>> {
        match self {
            Self::Node(inst) => Some(inst),
            Self::Json(_) => None,
        }
    }
}

impl From<Value> for Arg<'_> {
    fn from(v: Value) -> Self {
        Self::Json(v)
    }
}

impl<'rt> From<Instance<'rt>> for Arg<'rt> {
    fn from(inst: Instance<'rt>) -> Self {
        Self::Node(inst)
    }
}

/// Deep-flatten JSON arrays; builders are kept as single elements.
pub fn flat<'rt>(args: impl IntoIterator<Item = Arg<'rt>>) -> Vec<Arg<'rt>> {
    fn go<'rt>(arg: Arg<'rt>, out: &mut Vec<Arg<'rt>>) {
        match arg {
            Arg::Json(Value::Array(xs)) => {
                for x in xs {
                    go(Arg::Json(x), out);
                }
            }
            other => out.push(other),
        }
    }
    let mut out = Vec::new();
    for arg in args {
        go(arg, &mut out);
    }
    out
}

/// Combine object arguments into one object.
///
/// The input is flattened one level and nulls are skipped. Nested objects
/// combine recursively; on any other conflict the later value wins, except
/// that under [`MergePolicy::Concat`] two arrays are concatenated. Builders
/// serialize in their keyed variant under `Concat`.
pub fn merge<'rt>(policy: MergePolicy, values: impl IntoIterator<Item = Arg<'rt>>) -> Value {
    let keyed = policy == MergePolicy::Concat;
    let mut out = Map::new();
    for arg in values {
        let items = match arg {
            Arg::Json(Value::Array(xs)) => xs,
            other => vec![other.into_value(keyed)],
        };
        for item in items {
            if let Value::Object(obj) = item {
                merge_into(&mut out, obj, policy);
            }
        }
    }
    Value::Object(out)
}

fn merge_into(target: &mut Map<String, Value>, source: Map<String, Value>, policy: MergePolicy) {
    for (key, value) in source {
        if value.is_null() {
            continue;
        }
        match target.get_mut(&key) {
            Some(Value::Object(a)) if value.is_object() => {
                if let Value::Object(b) = value {
                    merge_into(a, b, policy);
                }
            }
            Some(Value::Array(a)) if policy == MergePolicy::Concat && value.is_array() => {
                if let Value::Array(b) = value {
                    a.extend(b);
                }
            }
            _ => {
                target.insert(key, value);
            }
        }
    }
}

/// Keep `keys` at the top level and regroup the remaining fields under
/// `rest`, omitted when empty.
pub fn nest(value: Value, keys: &[String], rest: &str) -> Value {
    let Value::Object(obj) = value else {
        return value;
    };
    let mut top = Map::new();
    let mut remainder = Map::new();
    for (k, v) in obj {
        if keys.iter().any(|key| *key == k) {
            top.insert(k, v);
        } else {
            remainder.insert(k, v);
        }
    }
    if !remainder.is_empty() {
        top.insert(rest.to_owned(), Value::Object(remainder));
    }
    Value::Object(top)
}

/// JavaScript truthiness: `null`, `false`, `0` and `""` are falsy.
pub fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Apply an optional dispatch table to a JSON argument. Builders pass through.
pub fn dispatch<'rt>(table: Option<&TypeTable>, arg: Arg<'rt>) -> Arg<'rt> {
    match (table, arg) {
        (Some(t), Arg::Json(v)) => Arg::Json(t.apply(v)),
        (_, arg) => arg,
    }
}
