//! Declarative (JSON) form of the specification table, and its validation into
//! the typed model.
//!
//! ```json
//! { "mark": { "desc": "...", "doc": "Chart Constructors", "def": "TopLevelUnitSpec",
//!             "arg": [":::mark"], "type": [{"string": {"key": "type"}}],
//!             "ext": {"encode": {"arg": ["+::encoding"], "flag": 1}},
//!             "call": {"render": {"call": "render", "from": "__view__"}} } }
//! ```
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use super::binding::{ArgDecl, ExtBinding, parse_bindings};
use super::dispatch::parse_tables;
use super::{
    Api, Delegation, Entry, Extension, ExternalSpec, Invocation, KeyRef, KeyShape, MergePolicy,
    MethodSpec, Nest, Proxy, Serialization, Visibility,
};
use crate::error::SpecError;

pub type ApiDecl = IndexMap<String, MethodDecl>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodDecl {
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub def: Option<String>,
    #[serde(default)]
    pub arg: Option<Vec<ArgDecl>>,
    #[serde(default)]
    pub set: Option<IndexMap<String, Value>>,
    #[serde(default, rename = "type")]
    pub types: Option<Value>,
    #[serde(default)]
    pub ext: Option<IndexMap<String, Option<ExtensionDecl>>>,
    #[serde(default)]
    pub pass: Option<IndexMap<String, Option<DelegationDecl>>>,
    #[serde(default)]
    pub call: Option<IndexMap<String, Option<InvocationDecl>>>,
    #[serde(default)]
    pub key: Option<Value>,
    #[serde(default)]
    pub nest: Option<Nest>,
    #[serde(default)]
    pub ctr: Option<ProxyDecl>,
    /// External entries: source module.
    #[serde(default)]
    pub src: Option<String>,
    /// External entries: exported name in the source module.
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionDecl {
    #[serde(default)]
    pub arg: Option<Vec<String>>,
    #[serde(default)]
    pub pre: Option<Vec<Value>>,
    #[serde(default, rename = "type")]
    pub types: Option<Value>,
    #[serde(default)]
    pub flag: Option<u8>,
    #[serde(default)]
    pub set: Option<IndexMap<String, Value>>,
    #[serde(default)]
    pub desc: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DelegationDecl {
    pub call: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub args: Option<usize>,
    #[serde(default)]
    pub prop: Option<String>,
    #[serde(default, rename = "self")]
    pub merge_method: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InvocationDecl {
    pub call: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub args: Option<usize>,
    #[serde(default)]
    pub desc: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProxyDecl {
    pub call: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub arg: Option<Value>,
}

// ------------------------------ Validation -------------------------------- //

pub trait IntoApi {
    fn into_api(self) -> Result<Api, SpecError>;
}

impl IntoApi for ApiDecl {
    fn into_api(self) -> Result<Api, SpecError> {
        let mut entries = IndexMap::with_capacity(self.len());
        for (name, decl) in self {
            let entry = decl.into_entry(&name)?;
            entries.insert(name, entry);
        }
        Ok(Api { entries })
    }
}

impl MethodDecl {
    pub fn into_entry(self, name: &str) -> Result<Entry, SpecError> {
        let args = self
            .arg
            .as_deref()
            .map(|decls| parse_bindings(name, decls))
            .transpose()?;

        if Visibility::of(name) == Visibility::External {
            return Ok(Entry::External(ExternalSpec {
                desc: self.desc,
                doc: self.doc,
                src: self.src.unwrap_or_else(|| super::public_name(name).to_owned()),
                name: self.name,
                args,
            }));
        }

        let types = match &self.types {
            Some(v) => parse_tables(name, v)?,
            None => Vec::new(),
        };

        let mut ext = IndexMap::new();
        for (ext_name, decl) in self.ext.unwrap_or_default() {
            let value = decl.map(|d| d.into_extension(name, &ext_name)).transpose()?;
            ext.insert(ext_name, value);
        }

        let pass = self
            .pass
            .unwrap_or_default()
            .into_iter()
            .map(|(k, d)| {
                let d = d.map(|d| Delegation {
                    call: d.call,
                    from: d.from,
                    args: d.args,
                    prop: d.prop,
                    merge_method: d.merge_method,
                    desc: d.desc,
                });
                (k, d)
            })
            .collect();

        let call = self
            .call
            .unwrap_or_default()
            .into_iter()
            .map(|(k, d)| {
                let d = d.map(|d| Invocation { call: d.call, from: d.from, args: d.args, desc: d.desc });
                (k, d)
            })
            .collect();

        let key = self.key.as_ref().map(|k| parse_key(name, k)).transpose()?;
        let serial = match (key, self.nest) {
            (None, None) => None,
            (key, nest) => Some(Serialization { key: key.unwrap_or(KeyShape::Default), nest }),
        };

        let ctr = self.ctr.map(|p| Proxy { call: p.call, from: p.from, arg: p.arg });

        Ok(Entry::Method(MethodSpec {
            desc: self.desc,
            doc: self.doc,
            def: self.def,
            args,
            set: self.set.unwrap_or_default(),
            types,
            ext,
            pass,
            call,
            serial,
            ctr,
        }))
    }
}

impl ExtensionDecl {
    fn into_extension(self, method: &str, ext_name: &str) -> Result<Extension, SpecError> {
        let binding = ExtBinding::parse(method, ext_name, self.arg.as_deref())?;
        let types = match &self.types {
            Some(v) => parse_tables(method, v)?.into_iter().next().flatten(),
            None => None,
        };
        Ok(Extension {
            binding,
            pre: self.pre.and_then(|p| p.into_iter().next()),
            types,
            flag: MergePolicy::from_flag(self.flag.unwrap_or(0)),
            set: self.set.unwrap_or_default(),
            desc: self.desc,
        })
    }
}

fn parse_key(method: &str, key: &Value) -> Result<KeyShape, SpecError> {
    match key {
        Value::Null => Ok(KeyShape::Default),
        Value::String(s) => Ok(KeyShape::Wrap(KeyRef::parse(s))),
        Value::Object(fields) => {
            let mut out = IndexMap::new();
            for (k, v) in fields {
                let v = v.as_str().ok_or_else(|| SpecError::MalformedKey {
                    method: method.to_owned(),
                    key: key.to_string(),
                })?;
                out.insert(k.clone(), KeyRef::parse(v));
            }
            Ok(KeyShape::Fields(out))
        }
        Value::Array(xs) if xs.len() == 2 => {
            let unset = parse_key(method, &xs[0])?;
            let set = parse_key(method, &xs[1])?;
            Ok(KeyShape::Flagged(Box::new(unset), Box::new(set)))
        }
        _ => Err(SpecError::MalformedKey { method: method.to_owned(), key: key.to_string() }),
    }
}
