//! In-process builder runtime.
//!
//! Interprets the specification model directly: a [`Runtime`] constructs
//! [`Instance`]s exactly the way a generated module's factory would, and each
//! accessor follows the same member plan the code compiler emits. Dispatch
//! tables are evaluated as data.
pub mod instance;
pub mod value;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use serde_json::Value;

pub use instance::Instance;
pub use value::Arg;

use crate::error::{RuntimeError, SchemaError};
use crate::schema::{Properties, SchemaDoc};
use crate::spec::{Api, MethodSpec};

/// An external function bound to an instance: receives the instance's
/// serialized form and the call arguments.
pub type ExternalFn = Arc<dyn Fn(&Value, &[Value]) -> Value + Send + Sync>;

pub struct Runtime {
    api: Api,
    shapes: IndexMap<String, Properties>,
    functions: HashMap<String, ExternalFn>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("entries", &self.api.len())
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Runtime {
    pub fn new(schema: &SchemaDoc, api: Api) -> Result<Self, SchemaError> {
        let shapes = api.resolve_shapes(schema)?;
        tracing::debug!(entries = api.len(), "builder runtime ready");
        Ok(Self { api, shapes, functions: HashMap::new(), next_id: AtomicU64::new(0) })
    }

    /// Register the external function invocations named `name` forward to.
    pub fn with_function<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(f));
        self
    }

    pub fn api(&self) -> &Api {
        &self.api
    }

    /// Call the factory of entry `name`.
    pub fn construct<'rt>(&'rt self, name: &str, args: Vec<Arg<'rt>>) -> Result<Instance<'rt>, RuntimeError> {
        Instance::construct(self, name, args)
    }

    pub(crate) fn method(&self, name: &str) -> Result<&MethodSpec, RuntimeError> {
        match self.api.get(name) {
            Some(crate::spec::Entry::Method(spec)) => Ok(spec),
            Some(crate::spec::Entry::External(_)) => Err(RuntimeError::ExternalEntry(name.to_owned())),
            None => Err(RuntimeError::UnknownEntry(name.to_owned())),
        }
    }

    pub(crate) fn shape(&self, name: &str) -> &Properties {
        static EMPTY: once_cell::sync::Lazy<Properties> = once_cell::sync::Lazy::new(Properties::new);
        self.shapes.get(name).unwrap_or(&EMPTY)
    }

    pub(crate) fn function(&self, name: &str) -> Result<&ExternalFn, RuntimeError> {
        self.functions.get(name).ok_or_else(|| RuntimeError::UnboundFunction(name.to_owned()))
    }

    /// Fresh identifier: `base` followed by a per-runtime counter.
    pub(crate) fn next_id(&self, base: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{base}{n}")
    }
}
