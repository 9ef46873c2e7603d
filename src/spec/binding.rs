//! Argument binding rules.
//!
//! The declarative tables spell bindings with string sigils (`...`, `:::`,
//! `+::`, `+++`, `^_`, `_`). They are parsed here, once, into closed enums;
//! generation never looks at a sigil again.
use serde_json::Value;

use crate::error::SpecError;

/// How one constructor argument position is bound.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgBinding {
    /// `"prop"`: assign when the argument is present.
    Positional { prop: String },
    /// `["prop", literal]`: assign the argument, or the literal when absent.
    Default { prop: String, value: Value },
    /// `"_field"` / `"^_field"`: hidden, never serialized; `^` autogenerates an id.
    Internal { field: String, autogen: Option<String> },
    /// `"...prop"`: every argument, flattened, into one array property.
    Spread { prop: String },
    /// `":::prop"`: every argument merged into one existing property.
    Merge { prop: String },
}

impl ArgBinding {
    pub fn parse(sigil: &str) -> Self {
        if let Some(prop) = sigil.strip_prefix(":::") {
            Self::Merge { prop: prop.to_owned() }
        } else if let Some(prop) = sigil.strip_prefix("...") {
            Self::Spread { prop: prop.to_owned() }
        } else if let Some(field) = sigil.strip_prefix('^') {
            let autogen = field.strip_prefix('_').unwrap_or(field).to_owned();
            Self::Internal { field: field.to_owned(), autogen: Some(autogen) }
        } else if sigil.starts_with('_') {
            Self::Internal { field: sigil.to_owned(), autogen: None }
        } else {
            Self::Positional { prop: sigil.to_owned() }
        }
    }

    /// Every binding must name the property or field it fills.
    fn is_named(&self) -> bool {
        match self {
            Self::Positional { prop } | Self::Default { prop, .. } | Self::Spread { prop } | Self::Merge { prop } => {
                !prop.is_empty()
            }
            Self::Internal { field, .. } => !field.trim_start_matches('_').is_empty(),
        }
    }

    /// Spread and merge consume every remaining argument.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Spread { .. } | Self::Merge { .. })
    }

    /// Argument name as shown in documentation signatures.
    pub fn display_name(&self) -> String {
        match self {
            Self::Positional { prop } | Self::Default { prop, .. } => prop.clone(),
            Self::Internal { field, .. } => field.strip_prefix('_').unwrap_or(field).to_owned(),
            Self::Spread { prop } | Self::Merge { prop } => format!("...{prop}"),
        }
    }

    fn sigil(&self) -> String {
        match self {
            Self::Spread { prop } => format!("...{prop}"),
            Self::Merge { prop } => format!(":::{prop}"),
            other => other.display_name(),
        }
    }
}

/// Parse and validate a constructor's binding list.
pub fn parse_bindings(method: &str, decls: &[ArgDecl]) -> Result<Vec<ArgBinding>, SpecError> {
    let mut out = Vec::with_capacity(decls.len());
    for (index, decl) in decls.iter().enumerate() {
        let binding = decl.to_binding(method)?;
        if binding.is_terminal() && index != 0 {
            return Err(SpecError::TerminalNotFirst {
                method: method.to_owned(),
                binding: binding.sigil(),
                index,
            });
        }
        out.push(binding);
    }
    if let Some(first) = out.first().filter(|b| b.is_terminal()) {
        if out.len() > 1 {
            return Err(SpecError::TrailingBinding {
                method: method.to_owned(),
                binding: first.sigil(),
            });
        }
    }
    Ok(out)
}

/// Declarative form of one binding: a sigil string or a `[prop, default]` pair.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(untagged)]
pub enum ArgDecl {
    Sigil(String),
    WithDefault(String, Value),
}

impl ArgDecl {
    fn to_binding(&self, method: &str) -> Result<ArgBinding, SpecError> {
        match self {
            Self::Sigil(s) => {
                let binding = ArgBinding::parse(s);
                if !binding.is_named() {
                    return Err(malformed(method, s));
                }
                Ok(binding)
            }
            Self::WithDefault(prop, value) => {
                if !matches!(ArgBinding::parse(prop), ArgBinding::Positional { .. }) || prop.is_empty() {
                    return Err(malformed(method, prop));
                }
                Ok(ArgBinding::Default {
                    prop: prop.clone(),
                    value: default_literal(method, value)?,
                })
            }
        }
    }
}

fn malformed(method: &str, binding: &str) -> SpecError {
    SpecError::MalformedBinding { method: method.to_owned(), binding: format!("{binding:?}") }
}

/// Defaults written as strings are source literals (`"\"value\""`, `"true"`).
fn default_literal(method: &str, value: &Value) -> Result<Value, SpecError> {
    match value {
        Value::String(src) => serde_json::from_str(src).map_err(|_| SpecError::InvalidDefault {
            method: method.to_owned(),
            literal: src.clone(),
        }),
        other => Ok(other.clone()),
    }
}

/// Accessor strategy of an extension method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtBinding {
    /// No argument: return a copy, applying post-assignments.
    Copy,
    /// `:::prop`
    Merge(String),
    /// `+::prop`
    AccreteObject(String),
    /// `+++prop`
    AccreteArray(String),
    /// `...prop`
    Spread(String),
    Plain(String),
}

impl ExtBinding {
    pub fn parse(method: &str, extension: &str, args: Option<&[String]>) -> Result<Self, SpecError> {
        let args = args.unwrap_or_default();
        if args.len() > 1 {
            return Err(SpecError::ExtensionArity {
                method: method.to_owned(),
                extension: extension.to_owned(),
                count: args.len(),
            });
        }
        let Some(arg) = args.first() else {
            return Ok(Self::Copy);
        };
        let parsed = if let Some(p) = arg.strip_prefix(":::") {
            Self::Merge(p.to_owned())
        } else if let Some(p) = arg.strip_prefix("+::") {
            Self::AccreteObject(p.to_owned())
        } else if let Some(p) = arg.strip_prefix("+++") {
            Self::AccreteArray(p.to_owned())
        } else if let Some(p) = arg.strip_prefix("...") {
            Self::Spread(p.to_owned())
        } else {
            Self::Plain(arg.clone())
        };
        Ok(parsed)
    }

    /// Documentation signature; zero-argument extensions take nothing.
    pub fn display_name(&self) -> String {
        match self {
            Self::Copy => String::new(),
            Self::Merge(p) | Self::AccreteObject(p) | Self::AccreteArray(p) | Self::Spread(p) => {
                format!("...{p}")
            }
            Self::Plain(p) => p.strip_prefix('_').unwrap_or(p).to_owned(),
        }
    }
}
