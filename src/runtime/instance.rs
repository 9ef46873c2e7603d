//! Immutable builder instances.
//!
//! State is an `Arc`'d record; every mutating accessor clones the handle and
//! writes through `Arc::make_mut`, so the receiver is never observed to change.
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::Runtime;
use super::value::{Arg, dispatch, flat, merge, nest, truthy};
use crate::error::RuntimeError;
use crate::spec::members::{self, MemberKind};
use crate::spec::{
    ArgBinding, Delegation, ExtBinding, Extension, Invocation, KeyRef, KeyShape, MergePolicy,
    MethodSpec, TypeTable,
};

#[derive(Debug, Clone, Default, PartialEq)]
struct State {
    /// Serialized properties.
    props: Map<String, Value>,
    /// Hidden fields, never serialized directly.
    internal: Map<String, Value>,
}

#[derive(Clone)]
pub struct Instance<'rt> {
    rt: &'rt Runtime,
    name: String,
    state: Arc<State>,
}

impl std::fmt::Debug for Instance<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("name", &self.name)
            .field("props", &self.state.props)
            .field("internal", &self.state.internal)
            .finish()
    }
}

#[derive(Clone, Copy)]
enum Accrete {
    None,
    Object,
    Array,
}

impl<'rt> Instance<'rt> {
    pub(super) fn construct(rt: &'rt Runtime, name: &str, args: Vec<Arg<'rt>>) -> Result<Self, RuntimeError> {
        Self::construct_via(rt, name, args, &mut Vec::new())
    }

    /// `proxies` holds the proxy entries already followed for this construction.
    fn construct_via(
        rt: &'rt Runtime,
        name: &str,
        args: Vec<Arg<'rt>>,
        proxies: &mut Vec<String>,
    ) -> Result<Self, RuntimeError> {
        let spec = rt.method(name)?;

        if let Some(ctr) = &spec.ctr {
            if proxies.iter().any(|p| p == name) {
                return Err(RuntimeError::ProxyCycle(name.to_owned()));
            }
            proxies.push(name.to_owned());
            let mut forwarded = Vec::with_capacity(args.len() + 1);
            forwarded.extend(ctr.arg.clone().map(Arg::Json));
            forwarded.extend(args);
            let mut inst = Self::construct_via(rt, &ctr.call, forwarded, proxies)?;
            inst.apply(&spec.set);
            return Ok(inst);
        }

        let mut inst = Self { rt, name: name.to_owned(), state: Arc::new(State::default()) };
        inst.apply(&spec.set);
        match &spec.args {
            Some(bindings) => inst.bind(spec, bindings, args),
            None => {
                for arg in args {
                    inst.assign(dispatch(spec.type_table(0), arg));
                }
            }
        }
        Ok(inst)
    }

    /// Entry name this instance was built by (proxies resolve to their target).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, prop: &str) -> Option<&Value> {
        self.state.props.get(prop)
    }

    pub fn internal(&self, field: &str) -> Option<&Value> {
        self.state.internal.get(field)
    }

    pub fn props(&self) -> &Map<String, Value> {
        &self.state.props
    }

    /// Invoke the accessor `method` as the generated prototype would.
    pub fn call(&self, method: &str, args: Vec<Arg<'rt>>) -> Result<Arg<'rt>, RuntimeError> {
        let spec = self.rt.method(&self.name)?;
        let shape = self.rt.shape(&self.name);
        let member = members::find(spec, shape, method).ok_or_else(|| RuntimeError::UnknownMember {
            owner: self.name.clone(),
            method: method.to_owned(),
        })?;
        match member.kind {
            MemberKind::Property { array, .. } => Ok(self.accessor(member.name, array, None, &IndexMap::new(), args)),
            MemberKind::Extension(ext) => Ok(self.extension(ext, args)),
            MemberKind::Delegation(pass) => self.delegate(pass, args),
            MemberKind::Invocation(call) => self.invoke(call, args),
        }
    }

    /// Serialized form. `keyed` selects the set branch of a flagged key shape.
    pub fn to_json(&self, keyed: bool) -> Value {
        let base = Value::Object(self.state.props.clone());
        let Ok(spec) = self.rt.method(&self.name) else {
            return base;
        };
        let Some(serial) = &spec.serial else {
            return base;
        };
        let obj = self.key_json(&serial.key, base, keyed);
        match &serial.nest {
            Some(n) => nest(obj, &n.keys, &n.rest),
            None => obj,
        }
    }

    // -- construction --

    fn bind(&mut self, spec: &MethodSpec, bindings: &[ArgBinding], mut args: Vec<Arg<'rt>>) {
        for (i, binding) in bindings.iter().enumerate() {
            let table = spec.type_table(i);
            let arg = args.get(i).cloned();
            match binding {
                ArgBinding::Default { prop, value } => {
                    let v = arg.map(|a| a.into_value(false)).unwrap_or_else(|| value.clone());
                    self.put(prop, v);
                }
                ArgBinding::Merge { prop } => {
                    let current = self.get(prop).cloned().map(Arg::Json);
                    let input = current
                        .into_iter()
                        .chain(std::mem::take(&mut args).into_iter().map(|a| dispatch(table, a)));
                    let merged = merge(MergePolicy::Replace, input);
                    self.put(prop, merged);
                    break;
                }
                ArgBinding::Spread { prop } => {
                    let items = flat(std::mem::take(&mut args))
                        .into_iter()
                        .map(|a| dispatch(table, a).into_value(false))
                        .collect();
                    self.put(prop, Value::Array(items));
                    break;
                }
                ArgBinding::Internal { field, autogen } => {
                    let v = match (arg, autogen) {
                        (Some(a), _) => a.into_value(false),
                        (None, Some(base)) => Value::String(self.rt.next_id(base)),
                        (None, None) => continue,
                    };
                    self.state_mut().internal.insert(field.clone(), v);
                }
                ArgBinding::Positional { prop } => {
                    if let Some(a) = arg {
                        let v = dispatch(table, a).into_value(false);
                        self.put(prop, v);
                    }
                }
            }
        }
    }

    /// Shallow-copy another builder's state, or a plain object's fields.
    fn assign(&mut self, arg: Arg<'rt>) {
        match arg {
            Arg::Node(other) => {
                let state = self.state_mut();
                for (k, v) in &other.state.props {
                    state.props.insert(k.clone(), v.clone());
                }
                for (k, v) in &other.state.internal {
                    state.internal.insert(k.clone(), v.clone());
                }
            }
            Arg::Json(Value::Object(obj)) => {
                let state = self.state_mut();
                for (k, v) in obj {
                    state.props.insert(k, v);
                }
            }
            Arg::Json(_) => {}
        }
    }

    fn state_mut(&mut self) -> &mut State {
        Arc::make_mut(&mut self.state)
    }

    fn put(&mut self, prop: &str, value: Value) {
        self.state_mut().props.insert(prop.to_owned(), value);
    }

    fn apply(&mut self, set: &IndexMap<String, Value>) {
        for (k, v) in set {
            self.put(k, v.clone());
        }
    }

    // -- accessors --

    fn read(&self, prop: &str) -> Arg<'rt> {
        Arg::Json(self.get(prop).cloned().unwrap_or(Value::Null))
    }

    fn accessor(
        &self,
        prop: &str,
        spread: bool,
        types: Option<&TypeTable>,
        set: &IndexMap<String, Value>,
        args: Vec<Arg<'rt>>,
    ) -> Arg<'rt> {
        if args.is_empty() {
            return self.read(prop);
        }
        let value = if spread {
            let items = flat(args).into_iter().map(|a| dispatch(types, a).into_value(false)).collect();
            Value::Array(items)
        } else {
            let first = args.into_iter().next().map(|a| dispatch(types, a).into_value(false));
            first.unwrap_or(Value::Null)
        };
        let mut obj = self.clone();
        obj.put(prop, value);
        obj.apply(set);
        Arg::Node(obj)
    }

    fn extension(&self, ext: &Extension, args: Vec<Arg<'rt>>) -> Arg<'rt> {
        let types = ext.types.as_ref();
        match &ext.binding {
            ExtBinding::Copy => {
                let mut obj = self.clone();
                obj.apply(&ext.set);
                Arg::Node(obj)
            }
            ExtBinding::Plain(prop) => self.accessor(prop, false, types, &ext.set, args),
            ExtBinding::Spread(prop) => self.accessor(prop, true, types, &ext.set, args),
            ExtBinding::Merge(prop) => self.merging(prop, ext, args, Accrete::None),
            ExtBinding::AccreteObject(prop) => self.merging(prop, ext, args, Accrete::Object),
            ExtBinding::AccreteArray(prop) => self.merging(prop, ext, args, Accrete::Array),
        }
    }

    fn merging(&self, prop: &str, ext: &Extension, args: Vec<Arg<'rt>>, accrete: Accrete) -> Arg<'rt> {
        if ext.pre.is_none() && args.is_empty() {
            return self.read(prop);
        }
        let types = ext.types.as_ref();
        let mut values: Vec<Arg<'rt>> = ext
            .pre
            .clone()
            .map(Arg::Json)
            .into_iter()
            .chain(args)
            .map(|a| dispatch(types, a))
            .collect();

        let current = self.get(prop).filter(|v| truthy(v)).cloned();
        let stored = match accrete {
            Accrete::None => merge(ext.flag, values),
            Accrete::Object => {
                if let Some(cur) = current {
                    values.insert(0, Arg::Json(cur));
                }
                merge(ext.flag, values)
            }
            Accrete::Array => {
                let mut list = match current {
                    Some(Value::Array(xs)) => xs,
                    Some(v) => vec![v],
                    None => Vec::new(),
                };
                list.push(merge(ext.flag, values));
                if list.len() > 1 { Value::Array(list) } else { list.remove(0) }
            }
        };

        let mut obj = self.clone();
        obj.put(prop, stored);
        obj.apply(&ext.set);
        Arg::Node(obj)
    }

    fn delegate(&self, pass: &Delegation, mut args: Vec<Arg<'rt>>) -> Result<Arg<'rt>, RuntimeError> {
        if let Some(n) = pass.args {
            args.truncate(n);
        }
        match &pass.prop {
            Some(prop) => {
                let companion = Self::construct(self.rt, &pass.call, Vec::new())?;
                self.transfer(companion, pass)?.call(prop, args)
            }
            None => {
                let companion = Self::construct(self.rt, &pass.call, args)?;
                Ok(Arg::Node(self.transfer(companion, pass)?))
            }
        }
    }

    /// Hand this instance's state to a companion builder.
    fn transfer(&self, mut companion: Instance<'rt>, pass: &Delegation) -> Result<Instance<'rt>, RuntimeError> {
        match &pass.merge_method {
            Some(method) => {
                let out = companion.call(method, vec![Arg::Node(self.clone())])?;
                out.into_node().ok_or_else(|| RuntimeError::ExpectedInstance {
                    method: method.clone(),
                    got: "a plain value".to_owned(),
                })
            }
            None => {
                companion.assign(Arg::Node(self.clone()));
                Ok(companion)
            }
        }
    }

    fn invoke(&self, call: &Invocation, mut args: Vec<Arg<'rt>>) -> Result<Arg<'rt>, RuntimeError> {
        let f = self.rt.function(&call.call)?;
        if let Some(n) = call.args {
            args.truncate(n);
        }
        let values: Vec<Value> = args.into_iter().map(|a| a.into_value(false)).collect();
        Ok(Arg::Json(f(&self.to_json(false), &values)))
    }

    // -- serialization --

    fn key_json(&self, key: &KeyShape, base: Value, keyed: bool) -> Value {
        match key {
            KeyShape::Default => base,
            KeyShape::Wrap(r) => {
                let mut out = Map::new();
                out.insert(self.key_name(r), base);
                Value::Object(out)
            }
            KeyShape::Fields(fields) => {
                let out = fields.iter().map(|(k, r)| (k.clone(), self.key_value(r))).collect();
                Value::Object(out)
            }
            KeyShape::Flagged(unset, set) => {
                let chosen = if keyed { set } else { unset };
                self.key_json(chosen, base, keyed)
            }
        }
    }

    fn key_name(&self, r: &KeyRef) -> String {
        match r {
            KeyRef::Internal(field) => match self.internal(field) {
                Some(Value::String(s)) => s.clone(),
                Some(v) => v.to_string(),
                None => String::new(),
            },
            KeyRef::Literal(k) => k.clone(),
        }
    }

    /// Internal references read the hidden field; literals are JSON source,
    /// falling back to a plain string.
    fn key_value(&self, r: &KeyRef) -> Value {
        match r {
            KeyRef::Internal(field) => self.internal(field).cloned().unwrap_or(Value::Null),
            KeyRef::Literal(raw) => serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaDoc;
    use crate::spec::Api;
    use serde_json::json;

    fn runtime(schema: Value, api: Value) -> Runtime {
        Runtime::new(&SchemaDoc::new(schema), Api::from_json_value(api).unwrap()).unwrap()
    }

    fn j(v: Value) -> Arg<'static> {
        Arg::Json(v)
    }

    fn node<'rt>(a: Result<Arg<'rt>, RuntimeError>) -> Instance<'rt> {
        a.unwrap().into_node().unwrap()
    }

    fn spec_schema() -> Value {
        json!({ "definitions": {
            "Unit": { "type": "object", "properties": {
                "width": { "type": "number" },
                "values": { "type": "array", "items": { "type": "number" } },
                "encoding": { "type": "object" }
            }},
            "Facet": { "type": "object", "properties": { "facet": {}, "spec": {} } },
            "LookupData": { "type": "object", "properties": {
                "data": {}, "fields": { "type": "array" }, "key": {}
            }}
        }})
    }

    #[test]
    fn positional_default_binding() {
        let rt = runtime(json!({}), json!({ "m": { "arg": [["field", "\"value\""]] } }));
        let a = rt.construct("m", vec![]).unwrap();
        assert_eq!(a.get("field"), Some(&json!("value")));
        let b = rt.construct("m", vec![j(json!("x"))]).unwrap();
        assert_eq!(b.get("field"), Some(&json!("x")));
    }

    #[test]
    fn accretive_object_accumulates() {
        let rt = runtime(json!({}), json!({ "m": { "ext": { "enc": { "arg": ["+::encoding"] } } } }));
        let m = rt.construct("m", vec![]).unwrap();
        let m1 = node(m.call("enc", vec![j(json!({ "a": 1 }))]));
        let m2 = node(m1.call("enc", vec![j(json!({ "b": 2 }))]));
        assert_eq!(m2.get("encoding"), Some(&json!({ "a": 1, "b": 2 })));
        assert_eq!(m1.get("encoding"), Some(&json!({ "a": 1 })));
        assert_eq!(m.get("encoding"), None);

        let m3 = node(m2.call("enc", vec![j(json!({ "a": 5 }))]));
        assert_eq!(m3.get("encoding"), Some(&json!({ "a": 5, "b": 2 })));
        assert_eq!(m2.call("enc", vec![]).unwrap().as_json(), Some(&json!({ "a": 1, "b": 2 })));
    }

    #[test]
    fn spread_binding_flattens() {
        let rt = runtime(spec_schema(), json!({ "m": { "def": "Unit", "arg": ["...values"] } }));
        let a = rt.construct("m", vec![j(json!(1)), j(json!(2)), j(json!(3))]).unwrap();
        assert_eq!(a.get("values"), Some(&json!([1, 2, 3])));
        let b = rt.construct("m", vec![j(json!([1, [2, 3]]))]).unwrap();
        assert_eq!(b.get("values"), Some(&json!([1, 2, 3])));

        let c = node(a.call("values", vec![j(json!(4)), j(json!([5, [6]]))]));
        assert_eq!(c.get("values"), Some(&json!([4, 5, 6])));
    }

    #[test]
    fn flagged_key_selects_root() {
        let rt = runtime(json!({}), json!({ "m": { "set": { "x": 1 }, "key": ["a", "b"] } }));
        let m = rt.construct("m", vec![]).unwrap();
        assert_eq!(m.to_json(true), json!({ "b": { "x": 1 } }));
        assert_eq!(m.to_json(false), json!({ "a": { "x": 1 } }));
    }

    #[test]
    fn get_set_round_trip_and_isolation() {
        let rt = runtime(spec_schema(), json!({ "m": { "def": "Unit" } }));
        let m = rt.construct("m", vec![]).unwrap();
        let w = node(m.call("width", vec![j(json!(400))]));
        assert_eq!(w.call("width", vec![]).unwrap().as_json(), Some(&json!(400)));
        assert_eq!(m.call("width", vec![]).unwrap().as_json(), Some(&Value::Null));
        let w2 = node(w.call("width", vec![j(json!(500))]));
        assert_eq!(w.get("width"), Some(&json!(400)));
        assert_eq!(w2.get("width"), Some(&json!(500)));
    }

    #[test]
    fn property_objects_merge_shallowly() {
        let rt = runtime(json!({}), json!({ "m": {} }));
        let m = rt
            .construct("m", vec![j(json!({ "a": 1, "b": { "x": 1 } })), j(json!({ "b": { "y": 2 } }))])
            .unwrap();
        assert_eq!(m.to_json(false), json!({ "a": 1, "b": { "y": 2 } }));
    }

    #[test]
    fn accretive_array_collapses_single_entry() {
        let rt = runtime(json!({}), json!({ "m": { "ext": { "if": { "arg": ["+++condition"] } } } }));
        let m = rt.construct("m", vec![]).unwrap();
        let one = node(m.call("if", vec![j(json!({ "a": 1 }))]));
        assert_eq!(one.get("condition"), Some(&json!({ "a": 1 })));
        let two = node(one.call("if", vec![j(json!({ "b": 2 }))]));
        assert_eq!(two.get("condition"), Some(&json!([{ "a": 1 }, { "b": 2 }])));
        let three = node(two.call("if", vec![j(json!({ "c": 3 }))]));
        assert_eq!(three.get("condition"), Some(&json!([{ "a": 1 }, { "b": 2 }, { "c": 3 }])));
    }

    #[test]
    fn dispatch_tables_normalize_arguments() {
        let rt = runtime(json!({}), json!({
            "data": {
                "arg": ["data"],
                "type": [{ "array": { "key": "values" }, "string": { "key": "url" } }]
            },
            "color": { "type": { "string": { "key": "field", "set": { "type": "nominal" } } } }
        }));
        let d = rt.construct("data", vec![j(json!("a.csv"))]).unwrap();
        assert_eq!(d.get("data"), Some(&json!({ "url": "a.csv" })));
        let d = rt.construct("data", vec![j(json!([1, 2]))]).unwrap();
        assert_eq!(d.get("data"), Some(&json!({ "values": [1, 2] })));
        let d = rt.construct("data", vec![j(json!({ "name": "t" }))]).unwrap();
        assert_eq!(d.get("data"), Some(&json!({ "name": "t" })));

        let c = rt.construct("color", vec![j(json!("origin"))]).unwrap();
        assert_eq!(c.to_json(false), json!({ "field": "origin", "type": "nominal" }));
    }

    #[test]
    fn proxies_forward_fixed_argument() {
        let rt = runtime(json!({}), json!({
            "mark": { "arg": [":::mark"], "type": [{ "string": { "key": "type" } }] },
            "markBar": { "ctr": { "call": "mark", "arg": { "type": "bar" } } },
            "field": { "arg": ["field"] },
            "fieldN": { "ctr": { "call": "field" }, "set": { "type": "nominal" } }
        }));
        let bar = rt.construct("markBar", vec![j(json!({ "filled": true }))]).unwrap();
        assert_eq!(bar.name(), "mark");
        assert_eq!(bar.get("mark"), Some(&json!({ "type": "bar", "filled": true })));
        let point = rt.construct("mark", vec![j(json!("point"))]).unwrap();
        assert_eq!(point.get("mark"), Some(&json!({ "type": "point" })));
        let f = rt.construct("fieldN", vec![j(json!("a"))]).unwrap();
        assert_eq!(f.to_json(false), json!({ "field": "a", "type": "nominal" }));
    }

    #[test]
    fn merge_extensions_with_preset() {
        let rt = runtime(json!({}), json!({ "m": { "ext": {
            "markBar": { "arg": [":::mark"], "pre": [{ "type": "bar" }] },
            "count": { "set": { "aggregate": "count" } }
        }}}));
        let m = rt.construct("m", vec![]).unwrap();
        let bar = node(m.call("markBar", vec![]));
        assert_eq!(bar.get("mark"), Some(&json!({ "type": "bar" })));
        let bar = node(bar.call("markBar", vec![j(json!({ "size": 3 }))]));
        assert_eq!(bar.get("mark"), Some(&json!({ "type": "bar", "size": 3 })));
        let c = node(m.call("count", vec![j(json!("ignored"))]));
        assert_eq!(c.to_json(false), json!({ "aggregate": "count" }));
    }

    #[test]
    fn delegations_transfer_state() {
        let rt = runtime(spec_schema(), json!({
            "data": {
                "arg": ["data"],
                "pass": {
                    "mark": { "call": "mark" },
                    "facet": { "call": "_facet", "args": 1, "self": "spec" },
                    "fields": { "call": "lookupData", "prop": "fields" }
                }
            },
            "mark": { "def": "Unit", "arg": [":::mark"] },
            "_facet": { "def": "Facet", "arg": ["facet"] },
            "lookupData": { "def": "LookupData", "arg": ["data"] }
        }));
        let d = rt.construct("data", vec![j(json!("a.csv"))]).unwrap();

        let m = node(d.call("mark", vec![j(json!({ "type": "bar" }))]));
        assert_eq!(m.name(), "mark");
        assert_eq!(m.to_json(false), json!({ "mark": { "type": "bar" }, "data": "a.csv" }));

        let f = node(d.call("facet", vec![j(json!({ "row": "x" })), j(json!("dropped"))]));
        assert_eq!(f.to_json(false), json!({ "facet": { "row": "x" }, "spec": { "data": "a.csv" } }));

        let l = node(d.call("fields", vec![j(json!("a")), j(json!("b"))]));
        assert_eq!(l.name(), "lookupData");
        assert_eq!(l.to_json(false), json!({ "data": "a.csv", "fields": ["a", "b"] }));
    }

    #[test]
    fn invocations_reach_registered_functions() {
        let api = json!({ "m": {
            "set": { "a": 1 },
            "call": { "toSpec": { "call": "toSpec", "from": "__view__" }, "render": { "call": "render" } }
        }});
        let rt = runtime(json!({}), api).with_function("toSpec", |spec, _| spec.clone());
        let m = rt.construct("m", vec![]).unwrap();
        assert_eq!(m.call("toSpec", vec![]).unwrap().as_json(), Some(&json!({ "a": 1 })));
        assert!(matches!(m.call("render", vec![]), Err(RuntimeError::UnboundFunction(f)) if f == "render"));
    }

    #[test]
    fn internal_fields_and_selection_keys() {
        let rt = runtime(json!({}), json!({ "sel": {
            "set": { "type": "interval" },
            "arg": ["^_sel"],
            "key": [{ "selection": "_sel" }, "_sel"]
        }}));
        let a = rt.construct("sel", vec![]).unwrap();
        let b = rt.construct("sel", vec![]).unwrap();
        assert_eq!(a.internal("_sel"), Some(&json!("sel1")));
        assert_eq!(b.internal("_sel"), Some(&json!("sel2")));

        let brush = rt.construct("sel", vec![j(json!("brush"))]).unwrap();
        assert_eq!(brush.to_json(false), json!({ "selection": "brush" }));
        assert_eq!(brush.to_json(true), json!({ "brush": { "type": "interval" } }));
    }

    #[test]
    fn keyed_merge_serializes_builders() {
        let rt = runtime(json!({}), json!({
            "x": { "key": [null, "x"] },
            "m": { "ext": { "encode": { "arg": ["+::encoding"], "flag": 1 } } }
        }));
        let x = rt.construct("x", vec![j(json!({ "field": "a" }))]).unwrap();
        let m = rt.construct("m", vec![]).unwrap();
        let m = node(m.call("encode", vec![Arg::Node(x)]));
        assert_eq!(m.get("encoding"), Some(&json!({ "x": { "field": "a" } })));
    }

    #[test]
    fn nested_serialization() {
        let rt = runtime(json!({}), json!({ "csv": {
            "set": { "type": "csv" },
            "nest": { "keys": ["url"], "rest": "format" },
            "ext": { "url": { "arg": ["url"] } }
        }}));
        let c = node(rt.construct("csv", vec![]).unwrap().call("url", vec![j(json!("a.csv"))]));
        assert_eq!(c.to_json(false), json!({ "url": "a.csv", "format": { "type": "csv" } }));
    }

    #[test]
    fn extension_dispatch_applies_on_accessor_calls() {
        let rt = runtime(json!({}), json!({ "t": {
            "ext": { "data": {
                "arg": ["data"],
                "type": [{ "array": { "key": "values" }, "string": { "key": "url" } }]
            }}
        }}));
        let t = rt.construct("t", vec![]).unwrap();
        let url = node(t.call("data", vec![j(json!("x.csv"))]));
        assert_eq!(url.to_json(false), json!({ "data": { "url": "x.csv" } }));
        let inline = node(t.call("data", vec![j(json!([1, 2]))]));
        assert_eq!(inline.to_json(false), json!({ "data": { "values": [1, 2] } }));
        let named = node(t.call("data", vec![j(json!({ "name": "d" }))]));
        assert_eq!(named.call("data", vec![]).unwrap().as_json(), Some(&json!({ "name": "d" })));
    }

    #[test]
    fn falsy_current_value_does_not_accrete() {
        let rt = runtime(json!({}), json!({ "m": {
            "set": { "condition": false },
            "ext": { "if": { "arg": ["+++condition"] } }
        }}));
        let m = rt.construct("m", vec![]).unwrap();
        let one = node(m.call("if", vec![j(json!({ "a": 1 }))]));
        assert_eq!(one.get("condition"), Some(&json!({ "a": 1 })));
    }

    #[test]
    fn proxy_cycles_are_reported() {
        let rt = runtime(json!({}), json!({
            "a": { "ctr": { "call": "b" } },
            "b": { "ctr": { "call": "a" } },
            "loop": { "ctr": { "call": "loop" } }
        }));
        assert!(matches!(rt.construct("a", vec![]), Err(RuntimeError::ProxyCycle(name)) if name == "a"));
        assert!(matches!(rt.construct("loop", vec![]), Err(RuntimeError::ProxyCycle(_))));
    }

    #[test]
    fn lookup_failures() {
        let rt = runtime(json!({}), json!({ "m": {}, "$vega": { "src": "__view__" } }));
        assert!(matches!(rt.construct("nope", vec![]), Err(RuntimeError::UnknownEntry(_))));
        assert!(matches!(rt.construct("$vega", vec![]), Err(RuntimeError::ExternalEntry(_))));
        let m = rt.construct("m", vec![]).unwrap();
        assert!(matches!(m.call("width", vec![]), Err(RuntimeError::UnknownMember { .. })));
    }
}
