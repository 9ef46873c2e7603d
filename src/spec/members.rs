//! The member plan: which accessors a builder carries.
//!
//! Code compiler, documentation compiler and runtime all read this one list, so
//! the generated module and its reference page always agree on the property set.
//! Later kinds override earlier same-named ones:
//! schema property < extension < delegation < invocation.
use indexmap::IndexMap;
use serde_json::Value;

use super::{Delegation, Extension, Invocation, MethodSpec};
use crate::schema::{Properties, is_array_type};

#[derive(Debug, Clone, Copy)]
pub enum MemberKind<'a> {
    Property { schema: &'a Value, array: bool },
    Extension(&'a Extension),
    Delegation(&'a Delegation),
    Invocation(&'a Invocation),
}

#[derive(Debug, Clone, Copy)]
pub struct Member<'a> {
    pub name: &'a str,
    pub kind: MemberKind<'a>,
}

impl<'a> Member<'a> {
    pub fn desc(&self) -> Option<&'a str> {
        match self.kind {
            MemberKind::Property { schema, .. } => schema.get("description").and_then(Value::as_str),
            MemberKind::Extension(e) => e.desc.as_deref(),
            MemberKind::Delegation(d) => d.desc.as_deref(),
            MemberKind::Invocation(i) => i.desc.as_deref(),
        }
    }
}

/// Members in generation order. Proxies carry none.
pub fn plan<'a>(spec: &'a MethodSpec, shape: &'a Properties) -> Vec<Member<'a>> {
    if spec.is_proxy() {
        return Vec::new();
    }
    let mut out: IndexMap<&'a str, MemberKind<'a>> = IndexMap::new();
    let mut put = |name: &'a str, kind: MemberKind<'a>| {
        out.shift_remove(name);
        out.insert(name, kind);
    };

    for (name, schema) in shape {
        if spec.ext.contains_key(name) {
            continue;
        }
        put(name, MemberKind::Property { schema, array: is_array_type(schema) });
    }
    for (name, e) in &spec.ext {
        if let Some(e) = e {
            put(name, MemberKind::Extension(e));
        }
    }
    for (name, d) in &spec.pass {
        if let Some(d) = d {
            put(name, MemberKind::Delegation(d));
        }
    }
    for (name, i) in &spec.call {
        if let Some(i) = i {
            put(name, MemberKind::Invocation(i));
        }
    }

    out.into_iter().map(|(name, kind)| Member { name, kind }).collect()
}

/// Members in documentation order (by name).
pub fn sorted<'a>(spec: &'a MethodSpec, shape: &'a Properties) -> Vec<Member<'a>> {
    let mut members = plan(spec, shape);
    members.sort_by(|a, b| a.name.cmp(b.name));
    members
}

pub fn find<'a>(spec: &'a MethodSpec, shape: &'a Properties, name: &str) -> Option<Member<'a>> {
    plan(spec, shape).into_iter().find(|m| m.name == name)
}
