//! Generation pipeline.
//!
//! Shapes are resolved once per run; both artifact sets are generated from the
//! same resolved shapes, side by side.
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use rayon::prelude::*;

use crate::codegen;
use crate::docgen;
use crate::error::GenerateError;
use crate::schema::{Properties, SchemaDoc};
use crate::spec::{Api, Entry, MethodSpec, Visibility, catalog, public_name};

/// One named text artifact, relative to its output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub text: String,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, text: String) -> Self {
        Self { path: path.into(), text }
    }
}

#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub schema: PathBuf,
    /// Declarative table; the built-in catalog when absent.
    pub api: Option<PathBuf>,
    pub src: PathBuf,
    pub docs: PathBuf,
    pub prefix: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildReport {
    pub entries: usize,
    pub modules: usize,
    pub pages: usize,
}

// ------------------------------- Artifacts ---------------------------------- //

/// `<name>.js` for every generated entry plus `index.js`.
pub fn generate_api(schema: &SchemaDoc, api: &Api) -> Result<Vec<Artifact>, GenerateError> {
    let shapes = api.resolve_shapes(schema)?;
    Ok(api_artifacts(api, &shapes))
}

/// `<name>.md` for every documented entry plus `index.md`.
pub fn generate_docs(schema: &SchemaDoc, api: &Api, prefix: &str) -> Result<Vec<Artifact>, GenerateError> {
    let shapes = api.resolve_shapes(schema)?;
    Ok(doc_artifacts(api, &shapes, catalog::TITLE, prefix))
}

pub fn api_artifacts(api: &Api, shapes: &IndexMap<String, Properties>) -> Vec<Artifact> {
    let empty = Properties::new();
    let entries: Vec<(&str, &Entry)> = api.iter().collect();
    let mut out: Vec<Artifact> = entries
        .into_par_iter()
        .filter_map(|(name, entry)| match entry {
            Entry::Method(spec) => Some((name, spec)),
            Entry::External(_) => None,
        })
        .map(|(name, spec)| {
            let shape = shapes.get(name).unwrap_or(&empty);
            Artifact::new(format!("{name}.js"), codegen::generate_method(shape, name, spec))
        })
        .collect();
    out.push(Artifact::new("index.js", codegen::generate_index(api)));
    out
}

pub fn doc_artifacts(api: &Api, shapes: &IndexMap<String, Properties>, title: &str, prefix: &str) -> Vec<Artifact> {
    let empty = Properties::new();
    let entries: Vec<(&str, &Entry)> = api.iter().collect();
    let mut out: Vec<Artifact> = entries
        .into_par_iter()
        .filter(|(name, _)| Visibility::of(name) != Visibility::Private)
        .map(|(name, entry)| {
            let shape = shapes.get(name).unwrap_or(&empty);
            let public = public_name(name);
            Artifact::new(format!("{public}.md"), docgen::doc_method(public, entry, shape, prefix))
        })
        .collect();
    out.push(Artifact::new("index.md", docgen::doc_index(api, title, prefix)));
    out
}

// --------------------------------- Driver ----------------------------------- //

pub fn load_api(path: Option<&Path>, schema: &SchemaDoc) -> Result<Api, GenerateError> {
    match path {
        None => catalog::api(schema),
        Some(path) => {
            let source = std::fs::read_to_string(path).map_err(|source| GenerateError::ReadTable {
                path: path.to_path_buf(),
                source,
            })?;
            let api = Api::from_json_str(&source)?;
            tracing::debug!(path = %path.display(), entries = api.len(), "loaded specification table");
            Ok(api)
        }
    }
}

/// Generate both artifact sets without writing anything.
pub fn generate_all(config: &BuildConfig) -> Result<(Vec<Artifact>, Vec<Artifact>, usize), GenerateError> {
    let schema = SchemaDoc::load(&config.schema)?;
    let api = load_api(config.api.as_deref(), &schema)?;
    let shapes = api.resolve_shapes(&schema)?;
    tracing::info!(entries = api.len(), "resolved property shapes");
    for (name, entry) in api.iter() {
        if let Entry::Method(MethodSpec { def: Some(def), .. }) = entry
            && shapes.get(name).is_none_or(|shape| shape.is_empty())
        {
            tracing::warn!(entry = name, definition = %def, "definition resolved to no properties");
        }
    }

    let (code, docs) = rayon::join(
        || api_artifacts(&api, &shapes),
        || doc_artifacts(&api, &shapes, &config.title, &config.prefix),
    );
    Ok((code, docs, api.len()))
}

pub fn check(config: &BuildConfig) -> Result<BuildReport, GenerateError> {
    let (code, docs, entries) = generate_all(config)?;
    Ok(BuildReport { entries, modules: code.len(), pages: docs.len() })
}

pub fn build(config: &BuildConfig) -> Result<BuildReport, GenerateError> {
    let (code, docs, entries) = generate_all(config)?;
    let report = BuildReport { entries, modules: code.len(), pages: docs.len() };
    let batch: Vec<(&Path, &Artifact)> = code
        .iter()
        .map(|a| (config.src.as_path(), a))
        .chain(docs.iter().map(|a| (config.docs.as_path(), a)))
        .collect();
    crate::writer::write_batch(&batch)?;
    tracing::info!(
        src = %config.src.display(),
        docs = %config.docs.display(),
        "wrote {} modules and {} pages",
        report.modules,
        report.pages
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> (SchemaDoc, Api) {
        let schema = SchemaDoc::new(json!({ "definitions": {
            "Unit": { "type": "object", "properties": { "width": { "type": "number" } } }
        }}));
        let api = Api::from_json_value(json!({
            "mark": { "desc": "A mark.", "doc": "Charts", "def": "Unit", "arg": [":::mark"] },
            "markBar": { "desc": "A bar.", "doc": "Charts", "ctr": { "call": "mark", "arg": { "type": "bar" } } },
            "_facet": { "def": "Unit" },
            "$vega": { "desc": "Vega.", "doc": "Utilities", "src": "__view__", "name": "_vega" }
        }))
        .unwrap();
        (schema, api)
    }

    fn paths(artifacts: &[Artifact]) -> Vec<String> {
        artifacts.iter().map(|a| a.path.display().to_string()).collect()
    }

    #[test]
    fn code_artifacts_skip_externals_only() {
        let (schema, api) = fixture();
        let code = generate_api(&schema, &api).unwrap();
        assert_eq!(paths(&code), vec!["mark.js", "markBar.js", "_facet.js", "index.js"]);
        assert!(code[0].text.contains("prototype.width = function(value) {"));
    }

    #[test]
    fn doc_artifacts_skip_private_and_strip_external_marker() {
        let (schema, api) = fixture();
        let docs = generate_docs(&schema, &api, "vl.").unwrap();
        assert_eq!(paths(&docs), vec!["mark.md", "markBar.md", "vega.md", "index.md"]);
        assert!(docs[3].text.starts_with("## Vega-Lite API Reference\n"));
        assert!(docs[2].text.starts_with("vl.<b>vega</b>(<em>...values</em>)"));
    }
}
