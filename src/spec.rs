//! The specification model.
//!
//! An [`Api`] maps method names to entries describing one generated builder
//! each: how its constructor binds arguments, which accessors it carries
//! (schema-derived, extensions, delegations, invocations), and how it
//! serializes. The model is built once, validated at build time, and read-only
//! afterwards.
pub mod binding;
pub mod catalog;
pub mod decl;
pub mod dispatch;
pub mod members;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde_json::Value;

pub use binding::{ArgBinding, ExtBinding};
pub use dispatch::{TypeCheck, TypeRule, TypeTable};
pub use members::{Member, MemberKind};

use decl::IntoApi;

use crate::error::{SchemaError, SpecError};
use crate::schema::{Properties, SchemaDoc};

/// Name prefix of private entries: generated, but neither indexed nor documented.
pub const PRIVATE_MARKER: char = '_';
/// Name prefix of entries re-exported from an external module.
pub const EXTERNAL_MARKER: char = '$';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
    External,
}

impl Visibility {
    pub fn of(name: &str) -> Self {
        if name.starts_with(PRIVATE_MARKER) {
            Self::Private
        } else if name.starts_with(EXTERNAL_MARKER) {
            Self::External
        } else {
            Self::Public
        }
    }
}

/// The public name of an entry (external marker stripped).
pub fn public_name(name: &str) -> &str {
    name.strip_prefix(EXTERNAL_MARKER).unwrap_or(name)
}

/// Ordered specification table.
#[derive(Debug, Clone, Default)]
pub struct Api {
    pub entries: IndexMap<String, Entry>,
}

impl Api {
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodSpec> {
        match self.entries.get(name)? {
            Entry::Method(spec) => Some(spec),
            Entry::External(_) => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a declarative table (see [`decl`]) from JSON text.
    pub fn from_json_str(src: &str) -> Result<Self, SpecError> {
        let table = crate::path_de::from_str_with_path::<decl::ApiDecl>(src).map_err(SpecError::Parse)?;
        table.into_api()
    }

    pub fn from_json_value(v: Value) -> Result<Self, SpecError> {
        let table = crate::path_de::from_value_with_path::<decl::ApiDecl>(v).map_err(SpecError::Parse)?;
        table.into_api()
    }

    /// Property shape of every entry, resolved once. Externals and entries
    /// without a definition get an empty shape.
    pub fn resolve_shapes(&self, schema: &SchemaDoc) -> Result<IndexMap<String, Properties>, SchemaError> {
        let entries: Vec<(&String, &Entry)> = self.entries.iter().collect();
        let resolved = entries
            .into_par_iter()
            .map(|(name, entry)| {
                let def = match entry {
                    Entry::Method(spec) => spec.def.as_deref(),
                    Entry::External(_) => None,
                };
                Ok((name.clone(), schema.definition_props(def)?))
            })
            .collect::<Result<Vec<_>, SchemaError>>()?;
        Ok(resolved.into_iter().collect())
    }
}

#[derive(Debug, Clone)]
pub enum Entry {
    Method(MethodSpec),
    External(ExternalSpec),
}

impl Entry {
    pub fn desc(&self) -> Option<&str> {
        match self {
            Self::Method(m) => m.desc.as_deref(),
            Self::External(x) => x.desc.as_deref(),
        }
    }

    pub fn category(&self) -> Option<&str> {
        match self {
            Self::Method(m) => m.doc.as_deref(),
            Self::External(x) => x.doc.as_deref(),
        }
    }
}

/// A re-export from an external source module.
#[derive(Debug, Clone)]
pub struct ExternalSpec {
    pub desc: Option<String>,
    pub doc: Option<String>,
    pub src: String,
    /// Exported name in the source module, when it differs.
    pub name: Option<String>,
    pub args: Option<Vec<ArgBinding>>,
}

#[derive(Debug, Clone, Default)]
pub struct MethodSpec {
    pub desc: Option<String>,
    /// Category tag for the documentation index.
    pub doc: Option<String>,
    /// Path below `#/definitions/` of the shape instances conform to.
    pub def: Option<String>,
    /// `None`: the constructor accepts property-value objects.
    pub args: Option<Vec<ArgBinding>>,
    /// Fixed assignments applied at construction.
    pub set: IndexMap<String, Value>,
    /// Per argument position; position 0 is the method-level table when `args` is `None`.
    pub types: Vec<Option<TypeTable>>,
    /// `None` values suppress a schema accessor without replacing it.
    pub ext: IndexMap<String, Option<Extension>>,
    pub pass: IndexMap<String, Option<Delegation>>,
    pub call: IndexMap<String, Option<Invocation>>,
    pub serial: Option<Serialization>,
    pub ctr: Option<Proxy>,
}

impl MethodSpec {
    pub fn type_table(&self, position: usize) -> Option<&TypeTable> {
        self.types.get(position).and_then(Option::as_ref)
    }

    pub fn is_proxy(&self) -> bool {
        self.ctr.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Extension {
    pub binding: ExtBinding,
    /// Literal prepended to the merge input.
    pub pre: Option<Value>,
    pub types: Option<TypeTable>,
    pub flag: MergePolicy,
    /// Post-assignments applied to the returned copy.
    pub set: IndexMap<String, Value>,
    pub desc: Option<String>,
}

/// Construct a companion builder, transfer state, forward the call.
#[derive(Debug, Clone)]
pub struct Delegation {
    pub call: String,
    pub from: Option<String>,
    /// Truncate the forwarded arguments to this many.
    pub args: Option<usize>,
    /// Accessor invoked on the companion with the forwarded arguments.
    pub prop: Option<String>,
    /// Merge method on the companion that receives this instance.
    pub merge_method: Option<String>,
    pub desc: Option<String>,
}

impl Delegation {
    pub fn source(&self) -> &str {
        self.from.as_deref().unwrap_or(&self.call)
    }
}

/// Forward the arguments to an external function bound to the instance.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub call: String,
    pub from: Option<String>,
    pub args: Option<usize>,
    pub desc: Option<String>,
}

impl Invocation {
    pub fn source(&self) -> &str {
        self.from.as_deref().unwrap_or(&self.call)
    }
}

#[derive(Debug, Clone)]
pub struct Proxy {
    pub call: String,
    pub from: Option<String>,
    /// Fixed first argument.
    pub arg: Option<Value>,
}

impl Proxy {
    pub fn source(&self) -> &str {
        self.from.as_deref().unwrap_or(&self.call)
    }
}

/// The two merge policies. `Concat` also asks builder arguments for their keyed
/// serialization variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergePolicy {
    #[default]
    Replace,
    Concat,
}

impl MergePolicy {
    pub fn from_flag(flag: u8) -> Self {
        if flag == 0 { Self::Replace } else { Self::Concat }
    }

    pub fn flag(self) -> u8 {
        match self {
            Self::Replace => 0,
            Self::Concat => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Serialization {
    pub key: KeyShape,
    pub nest: Option<Nest>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeyShape {
    /// The plain property record.
    Default,
    /// `{<key>: record}`.
    Wrap(KeyRef),
    /// An explicit object of key → value reference.
    Fields(IndexMap<String, KeyRef>),
    /// Selected at serialization time by a boolean flag: `(unset, set)`.
    Flagged(Box<KeyShape>, Box<KeyShape>),
}

/// `_`-prefixed references read an internal field; anything else is literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyRef {
    Internal(String),
    Literal(String),
}

impl KeyRef {
    pub fn parse(s: &str) -> Self {
        if s.starts_with('_') { Self::Internal(s.to_owned()) } else { Self::Literal(s.to_owned()) }
    }
}

/// Regroup everything but `keys` under `rest`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct Nest {
    pub keys: Vec<String>,
    pub rest: String,
}
