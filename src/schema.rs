//! Structural schema resolution.
//!
//! A schema node is a plain `serde_json::Value`: a `$ref` pointer, a concrete
//! shape, or an `anyOf`/`allOf`/`oneOf` combinator. [`SchemaDoc::search`] walks
//! references and combinators until an [`Extractor`] recognizes a node, and
//! combines the per-branch results the way that extractor asks for.
//!
//! Lookups that find nothing fall back to the extractor's default. The only
//! failure is a reference cycle.
use std::path::Path;

use serde_json::{Map, Value, json};

use crate::error::SchemaError;

/// Property map of an object-shaped node, in schema declaration order.
pub type Properties = Map<String, Value>;

const COMBINATORS: [&str; 3] = ["anyOf", "allOf", "oneOf"];

// ------------------------------ Extractors -------------------------------- //

/// One instantiation of the generic resolver.
pub trait Extractor {
    type Output;
    /// Does this concrete node carry what we are looking for?
    fn matches(&self, node: &Value) -> bool;
    fn extract(&self, node: &Value) -> Self::Output;
    /// Combine the results of every branch of a combinator.
    fn gather(&self, parts: Vec<Self::Output>) -> Self::Output;
    fn fallback(&self) -> Self::Output;
}

/// Object-shaped nodes → property map; branches shallow-merged (later wins).
pub struct PropertyShape;

impl Extractor for PropertyShape {
    type Output = Option<Properties>;
    fn matches(&self, node: &Value) -> bool {
        node.get("type").and_then(Value::as_str) == Some("object")
    }
    fn extract(&self, node: &Value) -> Self::Output {
        Some(node.get("properties").and_then(Value::as_object).cloned().unwrap_or_default())
    }
    fn gather(&self, parts: Vec<Self::Output>) -> Self::Output {
        let mut out = Properties::new();
        for part in parts.into_iter().flatten() {
            for (k, v) in part {
                out.insert(k, v);
            }
        }
        Some(out)
    }
    fn fallback(&self) -> Self::Output {
        None
    }
}

/// Nodes declaring an explicit `enum` → its (string) values.
pub struct Enumeration;

impl Extractor for Enumeration {
    type Output = Vec<String>;
    fn matches(&self, node: &Value) -> bool {
        node.get("enum").is_some_and(Value::is_array)
    }
    fn extract(&self, node: &Value) -> Self::Output {
        string_values(node.get("enum"))
    }
    fn gather(&self, parts: Vec<Self::Output>) -> Self::Output {
        concat_sorted(parts)
    }
    fn fallback(&self) -> Self::Output {
        Vec::new()
    }
}

/// Object-shaped nodes whose `type` property is an enumeration → that enumeration.
pub struct Discriminant;

impl Extractor for Discriminant {
    type Output = Vec<String>;
    fn matches(&self, node: &Value) -> bool {
        PropertyShape.matches(node)
            && node
                .pointer("/properties/type/enum")
                .is_some_and(Value::is_array)
    }
    fn extract(&self, node: &Value) -> Self::Output {
        string_values(node.pointer("/properties/type/enum"))
    }
    fn gather(&self, parts: Vec<Self::Output>) -> Self::Output {
        concat_sorted(parts)
    }
    fn fallback(&self) -> Self::Output {
        Vec::new()
    }
}

fn string_values(v: Option<&Value>) -> Vec<String> {
    v.and_then(Value::as_array)
        .map(|xs| xs.iter().filter_map(Value::as_str).map(str::to_owned).collect())
        .unwrap_or_default()
}

fn concat_sorted(parts: Vec<Vec<String>>) -> Vec<String> {
    let mut out: Vec<String> = parts.into_iter().flatten().collect();
    out.sort();
    out
}

// ------------------------------- Document --------------------------------- //

#[derive(Debug, Clone)]
pub struct SchemaDoc {
    root: Value,
}

impl SchemaDoc {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let source = std::fs::read_to_string(path).map_err(|source| SchemaError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let root = crate::path_de::from_str_with_path::<Value>(&source)
            .map_err(|e| SchemaError::Parse(format!("({}) {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "loaded schema document");
        Ok(Self::new(root))
    }

    /// Follow a `#/a/b` pointer. Missing segments yield `None`.
    pub fn lookup(&self, reference: &str) -> Option<&Value> {
        let mut node = &self.root;
        for seg in reference.split('/').skip(1) {
            node = node.get(seg)?;
        }
        Some(node)
    }

    /// A reference node pointing at `#/definitions/<def>`.
    pub fn definition_ref(def: &str) -> Value {
        json!({ "$ref": format!("#/definitions/{def}") })
    }

    pub fn search<E: Extractor>(&self, node: &Value, extractor: &E) -> Result<E::Output, SchemaError> {
        let mut visiting = Vec::new();
        self.search_inner(Some(node), extractor, &mut visiting)
    }

    fn search_inner<E: Extractor>(
        &self,
        node: Option<&Value>,
        extractor: &E,
        visiting: &mut Vec<String>,
    ) -> Result<E::Output, SchemaError> {
        let Some(node) = node else {
            return Ok(extractor.fallback());
        };

        if let Some(reference) = node.get("$ref").and_then(Value::as_str) {
            if visiting.iter().any(|r| r == reference) {
                return Err(SchemaError::Cycle { reference: reference.to_owned() });
            }
            visiting.push(reference.to_owned());
            let out = self.search_inner(self.lookup(reference), extractor, visiting);
            visiting.pop();
            return out;
        }

        if extractor.matches(node) {
            return Ok(extractor.extract(node));
        }

        let branches = COMBINATORS
            .iter()
            .find_map(|k| node.get(*k).and_then(Value::as_array));
        match branches {
            Some(children) => {
                let parts = children
                    .iter()
                    .map(|child| self.search_inner(Some(child), extractor, visiting))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(extractor.gather(parts))
            }
            None => Ok(extractor.fallback()),
        }
    }

    pub fn props(&self, node: &Value) -> Result<Option<Properties>, SchemaError> {
        self.search(node, &PropertyShape)
    }

    pub fn enums(&self, node: &Value) -> Result<Vec<String>, SchemaError> {
        self.search(node, &Enumeration)
    }

    pub fn discriminants(&self, node: &Value) -> Result<Vec<String>, SchemaError> {
        self.search(node, &Discriminant)
    }

    /// Property map of a named definition; empty when `def` is absent or unresolvable.
    pub fn definition_props(&self, def: Option<&str>) -> Result<Properties, SchemaError> {
        match def {
            None => Ok(Properties::new()),
            Some(def) => Ok(self.props(&Self::definition_ref(def))?.unwrap_or_default()),
        }
    }
}

/// True for `type: "array"`, or a two-way union of `X[]` and bare `X`. Element
/// and branch types are compared as declared, so two untyped sides (references,
/// empty `items`) count as the same type.
pub fn is_array_type(node: &Value) -> bool {
    if node.get("type").and_then(Value::as_str) == Some("array") {
        return true;
    }
    let Some(branches) = ["anyOf", "oneOf"]
        .iter()
        .find_map(|k| node.get(*k).and_then(Value::as_array))
    else {
        return false;
    };
    if branches.len() != 2 {
        return false;
    }
    let types: Vec<Option<&str>> = branches
        .iter()
        .map(|b| b.get("type").and_then(Value::as_str))
        .collect();
    let Some(index) = types.iter().position(|t| *t == Some("array")) else {
        return false;
    };
    match (branches[1 - index].get("type"), branches[index].pointer("/items/type")) {
        (None, None) => true,
        (Some(Value::String(bare)), Some(Value::String(item))) => bare == item,
        _ => false,
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> SchemaDoc {
        SchemaDoc::new(json!({
            "definitions": {
                "Mark": { "enum": ["point", "bar", "area"] },
                "CompositeMark": { "enum": ["boxplot"] },
                "AnyMark": { "anyOf": [
                    { "$ref": "#/definitions/CompositeMark" },
                    { "$ref": "#/definitions/Mark" }
                ]},
                "Csv": { "type": "object", "properties": {
                    "type": { "enum": ["csv", "tsv"] },
                    "parse": { "type": "object" }
                }},
                "Json": { "type": "object", "properties": {
                    "type": { "enum": ["json"] },
                    "property": { "type": "string" }
                }},
                "Format": { "oneOf": [
                    { "$ref": "#/definitions/Json" },
                    { "$ref": "#/definitions/Csv" }
                ]},
                "Loop": { "$ref": "#/definitions/Loop2" },
                "Loop2": { "anyOf": [{ "$ref": "#/definitions/Loop" }] }
            }
        }))
    }

    #[test]
    fn lookup_walks_pointer_segments() {
        let d = doc();
        assert!(d.lookup("#/definitions/Mark").is_some());
        assert!(d.lookup("#/definitions/Missing").is_none());
        assert_eq!(
            d.lookup("#/definitions/Csv/properties/parse"),
            Some(&json!({ "type": "object" }))
        );
    }

    #[test]
    fn enums_concatenate_and_sort_across_unions() {
        let d = doc();
        let marks = d.enums(&SchemaDoc::definition_ref("AnyMark")).unwrap();
        assert_eq!(marks, vec!["area", "bar", "boxplot", "point"]);
    }

    #[test]
    fn discriminants_from_object_type_property() {
        let d = doc();
        let formats = d.discriminants(&SchemaDoc::definition_ref("Format")).unwrap();
        assert_eq!(formats, vec!["csv", "json", "tsv"]);
    }

    #[test]
    fn props_shallow_merge_later_wins() {
        let d = doc();
        let props = d.props(&SchemaDoc::definition_ref("Format")).unwrap().unwrap();
        let keys: Vec<&str> = props.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["type", "property", "parse"]);
        assert_eq!(props["type"], json!({ "enum": ["csv", "tsv"] }));
    }

    #[test]
    fn unresolvable_reference_falls_back() {
        let d = doc();
        assert_eq!(d.props(&SchemaDoc::definition_ref("Nope")).unwrap(), None);
        assert!(d.enums(&SchemaDoc::definition_ref("Nope")).unwrap().is_empty());
        assert!(d.definition_props(None).unwrap().is_empty());
    }

    #[test]
    fn resolving_concrete_node_is_idempotent() {
        let d = doc();
        let node = d.lookup("#/definitions/Csv").unwrap().clone();
        let once = d.props(&node).unwrap();
        let again = d.props(&json!({ "type": "object", "properties": once.clone().unwrap() })).unwrap();
        assert_eq!(once, again);
    }

    #[test]
    fn reference_cycle_is_an_error() {
        let d = doc();
        let err = d.props(&SchemaDoc::definition_ref("Loop")).unwrap_err();
        assert!(matches!(err, SchemaError::Cycle { .. }));
    }

    #[test]
    fn shared_reference_in_two_branches_is_not_a_cycle() {
        let d = SchemaDoc::new(json!({ "definitions": {
            "A": { "enum": ["a"] },
            "B": { "anyOf": [{ "$ref": "#/definitions/A" }, { "$ref": "#/definitions/A" }] }
        }}));
        assert_eq!(d.enums(&SchemaDoc::definition_ref("B")).unwrap(), vec!["a", "a"]);
    }

    #[test]
    fn array_type_detection() {
        assert!(is_array_type(&json!({ "type": "array" })));
        assert!(is_array_type(&json!({ "anyOf": [
            { "type": "string" },
            { "type": "array", "items": { "type": "string" } }
        ]})));
        assert!(!is_array_type(&json!({ "anyOf": [
            { "type": "number" },
            { "type": "array", "items": { "type": "string" } }
        ]})));
        assert!(!is_array_type(&json!({ "anyOf": [
            { "type": "string" },
            { "type": "array", "items": { "type": "string" } },
            { "type": "null" }
        ]})));
        assert!(!is_array_type(&json!({ "$ref": "#/definitions/X" })));
    }

    #[test]
    fn untyped_branches_pair_up_as_array_unions() {
        assert!(is_array_type(&json!({ "anyOf": [
            { "$ref": "#/definitions/A" },
            { "type": "array", "items": { "$ref": "#/definitions/A" } }
        ]})));
        assert!(is_array_type(&json!({ "anyOf": [
            { "type": "array", "items": {} },
            { "$ref": "#/definitions/ImputeSequence" }
        ]})));
        assert!(!is_array_type(&json!({ "anyOf": [
            { "$ref": "#/definitions/A" },
            { "type": "array", "items": { "type": "string" } }
        ]})));
    }
}
