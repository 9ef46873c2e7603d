//! Error taxonomy.
//!
//! Malformed specifications abort the whole run (the table is static, so a bad
//! entry is a programming mistake). Schema lookups that miss never error; only an
//! unreadable document or a reference cycle does.
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpecError {
    /// Spread and merge bindings collect every call-time argument, so they must
    /// be the first binding.
    #[error("method `{method}`: `{binding}` must be the first argument binding (found at position {index})")]
    TerminalNotFirst {
        method: String,
        binding: String,
        index: usize,
    },

    #[error("method `{method}`: no argument bindings may follow the terminal binding `{binding}`")]
    TrailingBinding { method: String, binding: String },

    #[error("extension `{method}.{extension}` must take 0-1 named arguments (found {count})")]
    ExtensionArity {
        method: String,
        extension: String,
        count: usize,
    },

    #[error("method `{method}`: unknown type check `{check}` (expected array, string, number, boolean or object)")]
    UnknownTypeCheck { method: String, check: String },

    #[error("method `{method}`: malformed type rule for `{check}`: {reason}")]
    MalformedTypeRule {
        method: String,
        check: String,
        reason: String,
    },

    #[error("method `{method}`: malformed argument binding {binding}")]
    MalformedBinding { method: String, binding: String },

    #[error("method `{method}`: invalid default literal `{literal}`")]
    InvalidDefault { method: String, literal: String },

    #[error("method `{method}`: malformed serialization key {key}")]
    MalformedKey { method: String, key: String },

    #[error("failed to parse specification table {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema reference cycle through `{reference}`")]
    Cycle { reference: String },

    #[error("failed to read schema document '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse schema document {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("no method named `{0}` in the specification table")]
    UnknownEntry(String),

    #[error("`{owner}` has no member named `{method}`")]
    UnknownMember { owner: String, method: String },

    #[error("external function `{0}` is not registered")]
    UnboundFunction(String),

    #[error("`{0}` is re-exported from an external module and cannot be constructed")]
    ExternalEntry(String),

    #[error("proxy `{0}` leads back to itself")]
    ProxyCycle(String),

    #[error("`{method}` expected a builder instance, got {got}")]
    ExpectedInstance { method: String, got: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

#[derive(Debug, Error)]
#[error("failed to write artifact '{path}': {source}")]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("failed to read specification table '{path}': {source}")]
    ReadTable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Write(#[from] WriteError),
}
