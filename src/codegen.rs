//! Code compiler: one JavaScript ES module per method specification.
//!
//! Generated modules are thin shells over the helper module `__util__`
//! (`init`, `proto`, `copy`, `get`, `set`, `assign`, `merge`, `flat`, `nest`,
//! `id`, and the `is*` type checks). Every accessor returns a fresh copy, so
//! instances are immutable from the caller's side.
pub mod literal;

use indexmap::IndexMap;
use serde_json::Value;

pub use literal::{js_literal, js_string};

use crate::emitter::Emitter;
use crate::schema::Properties;
use crate::spec::members::{self, MemberKind};
use crate::spec::{
    Api, ArgBinding, Delegation, Entry, ExtBinding, Extension, Invocation, KeyRef, KeyShape,
    MethodSpec, Proxy, TypeRule, TypeTable, Visibility, public_name,
};

/// Helper module every generated module imports from.
pub const UTIL: &str = "__util__";

pub fn generate_method(shape: &Properties, name: &str, spec: &MethodSpec) -> String {
    let mut emit = Emitter::new(UTIL);

    if let Some(ctr) = &spec.ctr {
        generate_proxy(&mut emit, name, spec, ctr);
        return emit.finish();
    }

    let class_name = format!("_{name}");
    generate_constructor(&mut emit, &class_name, spec);

    emit.import("proto");
    emit.line("// eslint-disable-next-line no-unused-vars");
    emit.line(format!("const prototype = proto({class_name});"));
    emit.blank();

    for member in members::plan(spec, shape) {
        match member.kind {
            MemberKind::Property { array, .. } => {
                generate_property(&mut emit, member.name, member.name, array, None, &[]);
            }
            MemberKind::Extension(ext) => generate_extension(&mut emit, member.name, ext),
            MemberKind::Delegation(pass) => generate_pass(&mut emit, member.name, pass),
            MemberKind::Invocation(call) => generate_call(&mut emit, member.name, call),
        }
    }

    if let Some(serial) = &spec.serial {
        generate_to_json(&mut emit, &serial.key, serial.nest.as_ref());
    }

    emit.line(format!("export function {name}(...args) {{"));
    emit.line(format!("  return new {class_name}(...args);"));
    emit.line("}");

    emit.finish()
}

/// Re-export every public entry; externals come from their source module.
pub fn generate_index(api: &Api) -> String {
    let mut code = String::new();
    for (name, entry) in api.iter() {
        match (Visibility::of(name), entry) {
            (Visibility::Private, _) => continue,
            (Visibility::External, Entry::External(x)) => {
                let base = x.name.as_deref().map(|b| format!("{b} as ")).unwrap_or_default();
                code.push_str(&format!("export {{{base}{}}} from \"./{}\";\n", public_name(name), x.src));
            }
            _ => code.push_str(&format!("export {{{name}}} from \"./{name}\";\n")),
        }
    }
    code
}

// ------------------------------- Constructor ------------------------------- //

fn generate_proxy(emit: &mut Emitter, name: &str, spec: &MethodSpec, ctr: &Proxy) {
    let target = &ctr.call;
    let fixed = ctr.arg.as_ref().map(|a| format!("{}, ", js_literal(a))).unwrap_or_default();

    emit.import_from([target.as_str()], ctr.source());
    emit.line(format!("export function {name}(...args) {{"));
    if spec.set.is_empty() {
        emit.line(format!("  return {target}({fixed}...args);"));
    } else {
        emit.import("set");
        emit.line(format!("  const obj = {target}({fixed}...args);"));
        for m in mutations("obj", &spec.set) {
            emit.line(format!("  {m}"));
        }
        emit.line("  return obj;");
    }
    emit.line("}");
}

fn generate_constructor(emit: &mut Emitter, class_name: &str, spec: &MethodSpec) {
    emit.line(format!("function {class_name}(...args) {{"));

    emit.import("init");
    emit.line("  init(this);");

    for (prop, value) in &spec.set {
        emit.import("set");
        emit.line(format!("  set(this, {}, {});", js_string(prop), js_literal(value)));
    }

    match &spec.args {
        Some(bindings) => {
            for (i, binding) in bindings.iter().enumerate() {
                let table = spec.type_table(i);
                let arg = format!("args[{i}]");
                match binding {
                    ArgBinding::Default { prop, value } => {
                        emit.import("set");
                        emit.line(format!(
                            "  set(this, {}, {arg} !== undefined ? {arg} : {});",
                            js_string(prop),
                            js_literal(value)
                        ));
                    }
                    ArgBinding::Merge { prop } => {
                        emit.import_all(["get", "set", "merge"]);
                        if let Some(t) = table {
                            let ts = type_switch(emit, t, "_");
                            emit.line(format!("  args = args.map(_ => {ts});"));
                        }
                        let p = js_string(prop);
                        emit.line(format!("  set(this, {p}, merge(0, get(this, {p}), args));"));
                        break;
                    }
                    ArgBinding::Spread { prop } => {
                        emit.import_all(["set", "flat"]);
                        match table {
                            Some(t) => {
                                let ts = type_switch(emit, t, "_");
                                emit.line(format!("  args = flat(args).map(_ => {ts});"));
                            }
                            None => {
                                emit.line("  args = flat(args);");
                            }
                        }
                        emit.line(format!("  set(this, {}, args);", js_string(prop)));
                        break;
                    }
                    ArgBinding::Internal { field, autogen: Some(base) } => {
                        emit.import("id");
                        emit.line(format!(
                            "  this[{}] = {arg} !== undefined ? {arg} : id({});",
                            js_string(field),
                            js_string(base)
                        ));
                    }
                    ArgBinding::Internal { field, autogen: None } => {
                        emit.line(format!("  if ({arg} !== undefined) this[{}] = {arg};", js_string(field)));
                    }
                    ArgBinding::Positional { prop } => {
                        emit.import("set");
                        let value = match table {
                            Some(t) => type_switch(emit, t, &arg),
                            None => arg.clone(),
                        };
                        emit.line(format!(
                            "  if ({arg} !== undefined) set(this, {}, {value});",
                            js_string(prop)
                        ));
                    }
                }
            }
        }
        None => {
            emit.import("assign");
            if let Some(t) = spec.type_table(0) {
                let ts = type_switch(emit, t, "_");
                emit.line(format!("  args = args.map(_ => {ts});"));
            }
            emit.line("  assign(this, ...args);");
        }
    }

    emit.line("}");
    emit.blank();
}

/// Compile a dispatch table to a conditional cascade over `value`.
fn type_switch(emit: &mut Emitter, table: &TypeTable, value: &str) -> String {
    let mut code = String::new();
    for (check, rule) in &table.cases {
        emit.import(check.helper());
        let branch = match rule {
            TypeRule::Map(sub) => {
                let inner = type_switch(emit, sub, "_");
                format!("{value}.map(_ => {{ return {inner}; }})")
            }
            TypeRule::Key { key, set } => {
                let mut fields = vec![format!("{key}: {value}")];
                fields.extend(set.iter().map(|(k, v)| format!("{k}: {}", js_literal(v))));
                format!("{{{}}}", fields.join(", "))
            }
        };
        code.push_str(&format!("{}({value}) ? {branch} : ", check.helper()));
    }
    code.push_str(value);
    code
}

fn mutations(obj: &str, values: &IndexMap<String, Value>) -> Vec<String> {
    values
        .iter()
        .map(|(k, v)| format!("set({obj}, {}, {});", js_string(k), js_literal(v)))
        .collect()
}

// -------------------------------- Accessors -------------------------------- //

fn generate_extension(emit: &mut Emitter, method: &str, ext: &Extension) {
    let set = mutations("obj", &ext.set);
    let types = ext.types.as_ref();
    let pre = ext.pre.as_ref();
    match &ext.binding {
        ExtBinding::Copy => generate_copy(emit, method, &set),
        ExtBinding::Merge(prop) => generate_merging(emit, method, prop, pre, types, ext, &set, Accrete::None),
        ExtBinding::AccreteObject(prop) => {
            generate_merging(emit, method, prop, pre, types, ext, &set, Accrete::Object)
        }
        ExtBinding::AccreteArray(prop) => {
            generate_merging(emit, method, prop, pre, types, ext, &set, Accrete::Array)
        }
        ExtBinding::Spread(prop) => generate_property(emit, method, prop, true, types, &set),
        ExtBinding::Plain(prop) => generate_property(emit, method, prop, false, types, &set),
    }
}

fn generate_copy(emit: &mut Emitter, method: &str, set: &[String]) {
    emit.import("copy");
    if !set.is_empty() {
        emit.import("set");
    }
    emit.line(format!("prototype.{method} = function() {{"));
    emit.line("  const obj = copy(this);");
    for m in set {
        emit.line(format!("  {m}"));
    }
    emit.line("  return obj;");
    emit.line("};");
    emit.blank();
}

/// Get with no arguments, copy-then-set otherwise. Spread accessors flatten
/// their arguments first.
fn generate_property(
    emit: &mut Emitter,
    method: &str,
    prop: &str,
    spread: bool,
    types: Option<&TypeTable>,
    set: &[String],
) {
    emit.import_all(["copy", "get", "set"]);
    if spread {
        emit.import("flat");
    }
    let p = js_string(prop);
    let rest = if spread { "..." } else { "" };

    emit.line(format!("prototype.{method} = function({rest}value) {{"));
    emit.line("  if (arguments.length) {");
    emit.line("    const obj = copy(this);");
    match (spread, types) {
        (true, Some(t)) => {
            let ts = type_switch(emit, t, "v");
            emit.line(format!("    value = flat(value).map(v => {ts});"));
        }
        (true, None) => {
            emit.line("    value = flat(value);");
        }
        (false, Some(t)) => {
            let ts = type_switch(emit, t, "value");
            emit.line(format!("    value = {ts};"));
        }
        (false, None) => {}
    }
    emit.line(format!("    set(obj, {p}, value);"));
    for m in set {
        emit.line(format!("    {m}"));
    }
    emit.line("    return obj;");
    emit.line("  } else {");
    emit.line(format!("    return get(this, {p});"));
    emit.line("  }");
    emit.line("};");
    emit.blank();
}

#[derive(Clone, Copy)]
enum Accrete {
    None,
    Object,
    Array,
}

/// Merge-style accessors. With a prepended literal the accessor always
/// writes; otherwise a bare call reads the property back.
#[allow(clippy::too_many_arguments)]
fn generate_merging(
    emit: &mut Emitter,
    method: &str,
    prop: &str,
    pre: Option<&Value>,
    types: Option<&TypeTable>,
    ext: &Extension,
    set: &[String],
    accrete: Accrete,
) {
    emit.import_all(["copy", "get", "merge", "set"]);
    let p = js_string(prop);
    let flag = ext.flag.flag();

    emit.line(format!("prototype.{method} = function(...values) {{")).indent();
    match pre {
        None => {
            emit.line("if (arguments.length) {").indent();
        }
        Some(pre) => {
            emit.line(format!("values = [{}].concat(values);", js_literal(pre)));
        }
    }

    if let Some(t) = types {
        let ts = type_switch(emit, t, "v");
        emit.line(format!("values = values.map(v => {ts});"));
    }
    match accrete {
        Accrete::None => {
            emit.line("const obj = copy(this);");
            emit.line(format!("set(obj, {p}, merge({flag}, values));"));
        }
        Accrete::Object => {
            emit.line(format!("const val = get(this, {p});"));
            emit.line("const obj = copy(this);");
            emit.line("if (val) values = [val].concat(values);");
            emit.line(format!("set(obj, {p}, merge({flag}, values));"));
        }
        Accrete::Array => {
            emit.line(format!("const val = get(this, {p}) || [];"));
            emit.line("const obj = copy(this);");
            emit.line(format!("values = [].concat(val, merge({flag}, values));"));
            emit.line(format!("set(obj, {p}, values.length > 1 ? values : values[0]);"));
        }
    }
    for m in set {
        emit.line(m);
    }
    emit.line("return obj;");

    if pre.is_none() {
        emit.outdent();
        emit.line("} else {").indent();
        emit.line(format!("return get(this, {p});")).outdent();
        emit.line("}");
    }

    emit.outdent();
    emit.line("};");
    emit.blank();
}

fn generate_pass(emit: &mut Emitter, method: &str, pass: &Delegation) {
    let call = &pass.call;
    emit.import_from([call.as_str()], pass.source());
    if pass.merge_method.is_none() {
        emit.import("assign");
    }

    emit.line(format!("prototype.{method} = function(...values) {{"));
    if let Some(n) = pass.args {
        emit.line(format!("  values = values.slice(0, {n});"));
    }
    match &pass.prop {
        Some(prop) => {
            emit.line(format!("  let obj = {call}();"));
            match &pass.merge_method {
                Some(m) => emit.line(format!("  obj = obj.{m}(this);")),
                None => emit.line("  obj = assign(obj, this);"),
            };
            emit.line(format!("  return obj.{prop}(...values);"));
        }
        None => {
            emit.line(format!("  const obj = {call}(...values);"));
            match &pass.merge_method {
                Some(m) => emit.line(format!("  return obj.{m}(this);")),
                None => emit.line("  return assign(obj, this);"),
            };
        }
    }
    emit.line("};");
    emit.blank();
}

fn generate_call(emit: &mut Emitter, method: &str, call: &Invocation) {
    let target = &call.call;
    emit.import_from([target.as_str()], call.source());

    emit.line(format!("prototype.{method} = function(...values) {{"));
    if let Some(n) = call.args {
        emit.line(format!("  values = values.slice(0, {n});"));
    }
    emit.line(format!("  return {target}.apply(this, values);"));
    emit.line("};");
    emit.blank();
}

// ------------------------------ Serialization ------------------------------ //

fn generate_to_json(emit: &mut Emitter, key: &KeyShape, nest: Option<&crate::spec::Nest>) {
    emit.import("proto");

    let flagged = matches!(key, KeyShape::Flagged(..));
    let mut obj = json_expr(key);

    if let Some(nest) = nest {
        emit.import("nest");
        let keys = Value::from(nest.keys.clone());
        obj = format!("nest({obj}, {}, {})", js_literal(&keys), js_string(&nest.rest));
    }

    let param = if flagged { "flag" } else { "" };
    emit.line(format!("prototype.toJSON = function({param}) {{"));
    emit.line(format!("  return {obj};"));
    emit.line("};");
    emit.blank();
}

fn json_expr(key: &KeyShape) -> String {
    match key {
        KeyShape::Default => "proto().toJSON.call(this)".to_owned(),
        KeyShape::Wrap(KeyRef::Internal(field)) => {
            format!("{{[this[{}]]: proto().toJSON.call(this)}}", js_string(field))
        }
        KeyShape::Wrap(KeyRef::Literal(k)) => format!("{{{k}: proto().toJSON.call(this)}}"),
        KeyShape::Fields(fields) => {
            let parts: Vec<String> = fields
                .iter()
                .map(|(k, v)| match v {
                    KeyRef::Internal(field) => format!("{k}: this[{}]", js_string(field)),
                    KeyRef::Literal(raw) => format!("{k}: {raw}"),
                })
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
        KeyShape::Flagged(unset, set) => format!("flag ? {} : {}", json_expr(set), json_expr(unset)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn method(decl: Value) -> MethodSpec {
        let api = Api::from_json_value(json!({ "m": decl })).unwrap();
        api.method("m").unwrap().clone()
    }

    fn shape(v: Value) -> Properties {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn positional_constructor_module() {
        let spec = method(json!({ "arg": ["field"] }));
        let code = generate_method(&Properties::new(), "field", &spec);
        let expected = "\
import {init, proto, set} from './__util__';

function _field(...args) {
  init(this);
  if (args[0] !== undefined) set(this, \"field\", args[0]);
}

// eslint-disable-next-line no-unused-vars
const prototype = proto(_field);

export function field(...args) {
  return new _field(...args);
}";
        assert_eq!(code, expected);
    }

    #[test]
    fn schema_properties_become_accessors() {
        let spec = method(json!({ "def": "X" }));
        let shape = shape(json!({
            "width": { "type": "number" },
            "transform": { "type": "array" }
        }));
        let code = generate_method(&shape, "m", &spec);
        assert!(code.starts_with("import {assign, copy, flat, get, init, proto, set} from './__util__';"));
        assert!(code.contains("  assign(this, ...args);"));
        assert!(code.contains("prototype.width = function(value) {"));
        assert!(code.contains("prototype.transform = function(...value) {\n  if (arguments.length) {\n    const obj = copy(this);\n    value = flat(value);"));
        assert!(code.contains("    return get(this, \"width\");"));
    }

    #[test]
    fn constructor_bindings() {
        let spec = method(json!({
            "set": { "type": "interval" },
            "arg": ["^_sel"],
            "key": [{ "selection": "_sel" }, "_sel"]
        }));
        let code = generate_method(&Properties::new(), "selectInterval", &spec);
        assert!(code.contains("  set(this, \"type\", \"interval\");"));
        assert!(code.contains("  this[\"_sel\"] = args[0] !== undefined ? args[0] : id(\"sel\");"));
        assert!(code.contains(
            "prototype.toJSON = function(flag) {\n  return flag ? {[this[\"_sel\"]]: proto().toJSON.call(this)} : {selection: this[\"_sel\"]};\n};"
        ));

        let spec = method(json!({ "arg": ["field", ["bin", true], "_hidden"] }));
        let code = generate_method(&Properties::new(), "bin", &spec);
        assert!(code.contains("  set(this, \"bin\", args[1] !== undefined ? args[1] : true);"));
        assert!(code.contains("  if (args[2] !== undefined) this[\"_hidden\"] = args[2];"));

        let spec = method(json!({ "arg": ["...layer"] }));
        let code = generate_method(&Properties::new(), "layer", &spec);
        assert!(code.contains("  args = flat(args);\n  set(this, \"layer\", args);"));
    }

    #[test]
    fn dispatch_compiles_to_cascade() {
        let spec = method(json!({
            "arg": ["data"],
            "type": [{ "array": { "key": "values" }, "string": { "key": "url" } }]
        }));
        let code = generate_method(&Properties::new(), "data", &spec);
        assert!(code.contains(
            "  if (args[0] !== undefined) set(this, \"data\", isArray(args[0]) ? {values: args[0]} : isString(args[0]) ? {url: args[0]} : args[0]);"
        ));
        assert!(code.starts_with("import {init, isArray, isString, proto, set} from './__util__';"));

        let spec = method(json!({
            "type": { "array": { "map": { "string": { "key": "field", "set": { "type": "nominal" } } } } }
        }));
        let code = generate_method(&Properties::new(), "detail", &spec);
        assert!(code.contains(
            "  args = args.map(_ => isArray(_) ? _.map(_ => { return isString(_) ? {field: _, type: \"nominal\"} : _; }) : _);"
        ));
    }

    #[test]
    fn extension_strategies() {
        let spec = method(json!({
            "arg": [":::mark"],
            "ext": {
                "encode": { "arg": ["+::encoding"], "flag": 1 },
                "markBar": { "arg": [":::mark"], "pre": [{ "type": "bar" }] },
                "if": { "arg": ["+++condition"] },
                "fieldN": { "arg": ["field"], "set": { "type": "nominal" } },
                "count": { "set": { "aggregate": "count" } }
            }
        }));
        let code = generate_method(&Properties::new(), "mark", &spec);
        assert!(code.contains("  set(this, \"mark\", merge(0, get(this, \"mark\"), args));"));
        assert!(code.contains(
            "prototype.encode = function(...values) {\n  if (arguments.length) {\n    const val = get(this, \"encoding\");\n    const obj = copy(this);\n    if (val) values = [val].concat(values);\n    set(obj, \"encoding\", merge(1, values));\n    return obj;\n  } else {\n    return get(this, \"encoding\");\n  }\n};"
        ));
        assert!(code.contains(
            "prototype.markBar = function(...values) {\n  values = [{\"type\":\"bar\"}].concat(values);\n  const obj = copy(this);\n  set(obj, \"mark\", merge(0, values));\n  return obj;\n};"
        ));
        assert!(code.contains("  set(obj, \"condition\", values.length > 1 ? values : values[0]);"));
        assert!(code.contains("    set(obj, \"field\", value);\n    set(obj, \"type\", \"nominal\");"));
        assert!(code.contains("prototype.count = function() {\n  const obj = copy(this);\n  set(obj, \"aggregate\", \"count\");\n  return obj;\n};"));
    }

    #[test]
    fn extension_accessor_dispatches_its_argument() {
        let spec = method(json!({ "ext": { "data": {
            "arg": ["data"],
            "type": [{ "array": { "key": "values" }, "string": { "key": "url" } }]
        }}}));
        let code = generate_method(&Properties::new(), "t", &spec);
        assert!(code.contains(
            "prototype.data = function(value) {\n  if (arguments.length) {\n    const obj = copy(this);\n    value = isArray(value) ? {values: value} : isString(value) ? {url: value} : value;\n    set(obj, \"data\", value);\n    return obj;"
        ));
        assert!(code.starts_with("import {assign, copy, get, init, isArray, isString, proto, set} from './__util__';"));
    }

    #[test]
    fn delegations_and_invocations() {
        let spec = method(json!({
            "pass": {
                "fields": { "call": "lookupData", "prop": "fields" },
                "facet": { "call": "_facet", "args": 1, "self": "spec" }
            },
            "call": { "render": { "call": "render", "from": "__view__" } }
        }));
        let code = generate_method(&Properties::new(), "data", &spec);
        assert!(code.contains("import {render} from './__view__';"));
        assert!(code.contains("import {lookupData} from './lookupData';"));
        assert!(code.contains("import {_facet} from './_facet';"));
        assert!(code.contains(
            "prototype.fields = function(...values) {\n  let obj = lookupData();\n  obj = assign(obj, this);\n  return obj.fields(...values);\n};"
        ));
        assert!(code.contains(
            "prototype.facet = function(...values) {\n  values = values.slice(0, 1);\n  const obj = _facet(...values);\n  return obj.spec(this);\n};"
        ));
        assert!(code.contains("  return render.apply(this, values);"));
    }

    #[test]
    fn proxy_modules() {
        let spec = method(json!({ "ctr": { "call": "mark", "arg": { "type": "bar" } } }));
        let code = generate_method(&Properties::new(), "markBar", &spec);
        assert_eq!(
            code,
            "import {} from './__util__';\nimport {mark} from './mark';\n\nexport function markBar(...args) {\n  return mark({\"type\":\"bar\"}, ...args);\n}"
        );

        let spec = method(json!({ "ctr": { "call": "field" }, "set": { "type": "nominal" } }));
        let code = generate_method(&Properties::new(), "fieldN", &spec);
        assert!(code.contains("  const obj = field(...args);\n  set(obj, \"type\", \"nominal\");\n  return obj;"));
    }

    #[test]
    fn nested_serialization() {
        let spec = method(json!({ "nest": { "keys": ["url", "values", "name"], "rest": "format" } }));
        let code = generate_method(&Properties::new(), "csv", &spec);
        assert!(code.contains(
            "  return nest(proto().toJSON.call(this), [\"url\",\"values\",\"name\"], \"format\");"
        ));
        let spec = method(json!({ "key": "sequence" }));
        let code = generate_method(&Properties::new(), "sequence", &spec);
        assert!(code.contains("prototype.toJSON = function() {\n  return {sequence: proto().toJSON.call(this)};"));
    }

    #[test]
    fn index_module() {
        let api = Api::from_json_value(json!({
            "mark": {},
            "_facet": {},
            "$vega": { "src": "__view__", "name": "_vega" },
            "$register": { "src": "__view__" }
        }))
        .unwrap();
        assert_eq!(
            generate_index(&api),
            "export {mark} from \"./mark\";\nexport {_vega as vega} from \"./__view__\";\nexport {register} from \"./__view__\";\n"
        );
    }
}
