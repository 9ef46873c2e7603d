//! The built-in specification table.
//!
//! A small operator catalog plus enumerations read from the schema (mark types,
//! data formats, generators, encoding channels, selection types) expand into the
//! full table. Everything is written in the declarative form and validated
//! through [`Api::from_json_value`], exactly like a table loaded from disk.
use serde_json::{Map, Value, json};

use super::Api;
use crate::error::GenerateError;
use crate::schema::SchemaDoc;
use crate::text::{article, capitalize, code, link};

pub const TITLE: &str = "Vega-Lite API Reference";
pub const DOC_PREFIX: &str = "vl.";

const AGGREGATE_OPS: &[(&str, &[&str])] = &[
    ("count", &["count"]),
    ("valid", &["valid", "field"]),
    ("missing", &["missing", "field"]),
    ("distinct", &["distinct", "field"]),
    ("sum", &["sum", "field"]),
    ("mean", &["mean", "field"]),
    ("average", &["average", "field"]),
    ("variance", &["variance", "field"]),
    ("variancep", &["variancep", "field"]),
    ("stdev", &["stdev", "field"]),
    ("stdevp", &["stdevp", "field"]),
    ("stderr", &["stderr", "field"]),
    ("median", &["median", "field"]),
    ("q1", &["q1", "field"]),
    ("q3", &["q3", "field"]),
    ("ci0", &["ci0", "field"]),
    ("ci1", &["ci1", "field"]),
    ("min", &["min", "field"]),
    ("max", &["max", "field"]),
    ("argmin", &["argmin", "field"]),
    ("argmax", &["argmax", "field"]),
];

const WINDOW_OPS: &[(&str, &[&str])] = &[
    ("row_number", &["row_number"]),
    ("rank", &["rank"]),
    ("dense_rank", &["dense_rank"]),
    ("percent_rank", &["percent_rank"]),
    ("cume_dist", &["cume_dist"]),
    ("ntile", &["ntile", "param"]),
    ("lag", &["lag", "field", "param"]),
    ("lead", &["lead", "field", "param"]),
    ("first_value", &["first_value", "field"]),
    ("last_value", &["last_value", "field"]),
    ("nth_value", &["nth_value", "field", "param"]),
];

const TIME_UNIT_OPS: &[(&str, &str)] = &[
    // local time
    ("year", "year"),
    ("quarter", "quarter"),
    ("month", "month"),
    ("day", "day"),
    ("date", "date"),
    ("hours", "hours"),
    ("minutes", "minutes"),
    ("seconds", "seconds"),
    ("milliseconds", "milliseconds"),
    ("yearmonth", "yearmonth"),
    ("timeYQ", "yearquarter"),
    ("timeYQM", "yearquartermonth"),
    ("timeYM", "yearmonth"),
    ("timeYMD", "yearmonthdate"),
    ("timeYMDH", "yearmonthdatehours"),
    ("timeYMDHM", "yearmonthdatehoursminutes"),
    ("timeYMDHMS", "yearmonthdatehoursminutesseconds"),
    ("timeQM", "quartermonth"),
    ("timeMD", "monthdate"),
    ("timeMDH", "monthdatehours"),
    ("timeHM", "hoursminutes"),
    ("timeHMS", "hoursminutesseconds"),
    ("timeMS", "minutesseconds"),
    ("timeSMS", "secondsmilliseconds"),
    // utc time
    ("utcyear", "utcyear"),
    ("utcquarter", "utcquarter"),
    ("utcmonth", "utcmonth"),
    ("utcday", "utcday"),
    ("utcdate", "utcdate"),
    ("utchours", "utchours"),
    ("utcminutes", "utcminutes"),
    ("utcseconds", "utcseconds"),
    ("utcmilliseconds", "utcmilliseconds"),
    ("utcyearmonth", "utcyearmonth"),
    ("utcYQ", "utcyearquarter"),
    ("utcYQM", "utcyearquartermonth"),
    ("utcYM", "utcyearmonth"),
    ("utcYMD", "utcyearmonthdate"),
    ("utcYMDH", "utcyearmonthdatehours"),
    ("utcYMDHM", "utcyearmonthdatehoursminutes"),
    ("utcYMDHMS", "utcyearmonthdatehoursminutesseconds"),
    ("utcQM", "utcquartermonth"),
    ("utcMD", "utcmonthdate"),
    ("utcMDH", "utcmonthdatehours"),
    ("utcHM", "utchoursminutes"),
    ("utcHMS", "utchoursminutesseconds"),
    ("utcMS", "utcminutesseconds"),
    ("utcSMS", "utcsecondsmilliseconds"),
];

const TRANSFORM_DESC: &[(&str, &str)] = &[
    ("aggregate", "Group and summarize data as counts, sums, averages, etc."),
    ("bin", "Discretize numeric values into uniform bins."),
    ("calculate", "Calculate a new data field value."),
    ("filter", "Remove data that does not match provided conditions."),
    ("flatten", "Map array fields to new records, one per array entry."),
    ("fold", "Collapse one or more data fields into two key, value fields."),
    ("impute", "Fill in missing values with imputed values."),
    ("joinaggregate", "Extend input data with aggregate values as new fields."),
    ("join", "A convenient shorthand for joinaggregate."),
    ("lookup", "Extend input data with values from another data source."),
    ("sample", "Filter random records from the data limit its size."),
    ("stack", "Compute running sums to stack groups of values."),
    ("timeUnit", "Discretize date/time values into meaningful intervals."),
    ("window", "Perform running calculations over sorted groups."),
    ("groupby", "Group by fields for aggregate or window transforms."),
];

const N: &str = "nominal";
const O: &str = "ordinal";
const Q: &str = "quantitative";
const T: &str = "temporal";

const TRANSFORMS: &str = "Data Transformations";

/// Build the table against a loaded schema.
pub fn api(schema: &SchemaDoc) -> Result<Api, GenerateError> {
    let marks = schema.enums(&SchemaDoc::definition_ref("AnyMark"))?;
    let formats = schema.discriminants(&SchemaDoc::definition_ref("DataFormat"))?;
    let generators: Vec<String> = schema
        .definition_props(Some("Generator"))?
        .keys()
        .filter(|k| *k != "name")
        .cloned()
        .collect();
    let channels: Vec<String> = schema.definition_props(Some("FacetedEncoding"))?.keys().cloned().collect();
    let selections = schema.discriminants(&SchemaDoc::definition_ref("SelectionDef"))?;

    let mut t = Map::new();

    // top-level specifications
    t.insert("mark".into(), unit(&marks));
    for m in &marks {
        t.insert(format!("mark{}", capitalize(m)), mark(m));
    }
    t.insert("layer".into(), layer(&["...layer"]));
    t.insert("hconcat".into(), spec("Horizontally concatenate", "TopLevelHConcatSpec", &["...hconcat"]));
    t.insert("vconcat".into(), spec("Vertically concatenate", "TopLevelVConcatSpec", &["...vconcat"]));
    t.insert("_repeat".into(), spec("Repeat", "TopLevelRepeatSpec", &["repeat", "spec"]));
    t.insert("_facet".into(), spec("Facet", "TopLevelFacetSpec", &["facet", "spec"]));

    // externally defined exports
    t.insert("$register".into(), json!({
        "desc": "Register Vega and Vega-Lite with the API.",
        "doc": "Utilities",
        "arg": ["vega", "vegalite", "options"],
        "src": "__view__"
    }));
    t.insert("$vega".into(), json!({
        "desc": "Access the registered Vega instance.",
        "doc": "Utilities",
        "src": "__view__",
        "name": "_vega"
    }));
    t.insert("$vegalite".into(), json!({
        "desc": "Access the registered Vega-Lite instance.",
        "doc": "Utilities",
        "src": "__view__",
        "name": "_vegalite"
    }));

    // data specification
    t.insert("data".into(), data());
    t.insert("url".into(), source("url", &["url"]));
    t.insert("values".into(), source("inline", &["values"]));
    for g in &generators {
        t.insert(g.clone(), generator(g));
    }
    for f in &formats {
        t.insert(f.clone(), source_format(f));
    }
    for f in &formats {
        t.insert(format!("{f}Format"), format_spec(f));
    }
    t.insert("lookupData".into(), lookup_data());

    // encoding channels
    for c in &channels {
        t.insert(c.clone(), channel(c));
    }
    t.insert("field".into(), field());
    t.insert("fieldN".into(), field_type(N));
    t.insert("fieldO".into(), field_type(O));
    t.insert("fieldQ".into(), field_type(Q));
    t.insert("fieldT".into(), field_type(T));
    t.insert("encoding".into(), encoding());
    t.insert("repeat".into(), reference("A field variable reference for a repeated chart.", Some("RepeatRef"), "repeat"));
    t.insert("value".into(), reference("A constant encoding value.", None, "value"));

    // cartographic projection
    t.insert("projection".into(), json!({
        "desc": "Define a cartographic projection for longitude, latitude coordinates.",
        "doc": "Projections",
        "def": "Projection",
        "arg": ["type"]
    }));

    // selections
    for s in &selections {
        t.insert(format!("select{}", capitalize(s)), selection(s));
    }

    // bindings
    t.insert("checkbox".into(), binding("BindCheckbox", "checkbox", None));
    t.insert("menu".into(), binding("BindRadioSelect", "select", Some(&["...options"])));
    t.insert("radio".into(), binding("BindRadioSelect", "radio", Some(&["...options"])));
    t.insert("slider".into(), binding("BindRange", "range", Some(&["min", "max", "step"])));

    // logical operations
    t.insert("not".into(), json!({ "desc": "Logical NOT operation.", "doc": "Logical Operations", "arg": ["not"] }));
    for op in ["and", "or"] {
        t.insert(op.into(), json!({
            "desc": format!("Logical {} operation.", op.to_uppercase()),
            "doc": "Logical Operations",
            "arg": [format!("...{op}")]
        }));
    }

    // transforms
    t.insert("aggregate".into(), transform("aggregate", "AggregateTransform", json!(["...aggregate"])));
    t.insert("bin".into(), transform("bin", "BinTransform", json!(["field", ["bin", true]])));
    t.insert("calculate".into(), transform("calculate", "CalculateTransform", json!(["calculate"])));
    t.insert("filter".into(), transform("filter", "FilterTransform", json!(["filter"])));
    t.insert("flatten".into(), transform("flatten", "FlattenTransform", json!(["...flatten"])));
    t.insert("fold".into(), transform("fold", "FoldTransform", json!(["...fold"])));
    t.insert("impute".into(), transform("impute", "ImputeTransform", json!(["impute", "key"])));
    t.insert("joinaggregate".into(), transform("joinaggregate", "JoinAggregateTransform", json!(["...joinaggregate"])));
    t.insert("join".into(), transform("join", "JoinAggregateTransform", json!(["...joinaggregate"])));
    t.insert("lookup".into(), transform("lookup", "LookupTransform", json!(["lookup"])));
    t.insert("sample".into(), transform("sample", "SampleTransform", json!(["sample"])));
    t.insert("stack".into(), transform("stack", "StackTransform", json!(["stack"])));
    t.insert("timeUnit".into(), transform("timeUnit", "TimeUnitTransform", json!(["timeUnit", "field"])));
    t.insert("window".into(), transform("window", "WindowTransform", json!(["...window"])));
    t.insert("groupby".into(), groupby());

    // operations
    for (name, parts) in AGGREGATE_OPS {
        t.insert((*name).into(), aggregate_op(parts[0], &with_params(&parts[1..], &["as"])));
    }
    for (name, parts) in WINDOW_OPS {
        t.insert((*name).into(), window_op(parts[0], &with_params(&parts[1..], &["as"])));
    }
    for (name, unit) in TIME_UNIT_OPS {
        t.insert((*name).into(), time_unit_op(unit, &["field", "as"]));
    }

    tracing::debug!(entries = t.len(), marks = marks.len(), channels = channels.len(), "expanded catalog");
    Ok(Api::from_json_value(Value::Object(t))?)
}

fn with_params<'a>(args: &[&'a str], params: &[&'a str]) -> Vec<&'a str> {
    args.iter().chain(params).copied().collect()
}

/// Shallow object merge: keys of `b` overwrite `a` in place, new keys append.
fn extend(mut a: Value, b: &Value) -> Value {
    if let (Some(a), Some(b)) = (a.as_object_mut(), b.as_object()) {
        for (k, v) in b {
            a.insert(k.clone(), v.clone());
        }
    }
    a
}

// -- Transforms --

fn transform_desc(name: &str) -> &'static str {
    TRANSFORM_DESC.iter().find(|(k, _)| *k == name).map(|(_, d)| *d).unwrap_or_default()
}

fn transform(name: &str, def: &str, args: Value) -> Value {
    json!({ "desc": transform_desc(name), "doc": TRANSFORMS, "def": def, "arg": args })
}

fn groupby() -> Value {
    json!({
        "desc": transform_desc("groupby"),
        "doc": TRANSFORMS,
        "arg": ["...groupby"],
        "pass": {
            "aggregate": { "call": "aggregate", "desc": format!("Specify and return an {} transform.", link("aggregate")) },
            "join": { "call": "joinaggregate", "desc": format!("Specify and return a {} transform.", link("joinaggregate")) },
            "joinaggregate": { "call": "joinaggregate", "desc": format!("Specify and return a {} transform.", link("joinaggregate")) },
            "window": { "call": "window", "desc": format!("Specify and return a {} transform.", link("window")) }
        }
    })
}

// -- Transform Operators --

fn aggregate_op(op: &str, args: &[&str]) -> Value {
    json!({
        "desc": format!("Specify {} {} aggregate operation.", article(op), code(op)),
        "doc": "Aggregate Operations",
        "def": "AggregatedFieldDef",
        "set": { "op": op },
        "arg": args,
        "ext": {
            "order": {
                "arg": ["order"],
                "desc": "Indicates the sort order. One of `\"ascending\"` or `\"descending\"`. Only applicable if the operation is being used as a sort parameter."
            }
        }
    })
}

fn window_op(op: &str, args: &[&str]) -> Value {
    json!({
        "desc": format!("A {} window operation.", code(op)),
        "doc": "Window Operations",
        "def": "WindowFieldDef",
        "set": { "op": op },
        "arg": args
    })
}

fn time_unit_op(op: &str, args: &[&str]) -> Value {
    json!({
        "desc": format!("A time unit operation for {}.", code(op)),
        "doc": "TimeUnit Operations",
        "def": "TimeUnitTransform",
        "set": { "timeUnit": op },
        "arg": args,
        "ext": ext_logic()
    })
}

// -- Logical Operations --

fn ext_logic() -> Value {
    json!({
        "equals":  { "arg": ["equal"], "desc": "Logical equals (==) comparison." },
        "gte":     { "arg": ["gte"], "desc": "Logical greater than or equal to (>=) comparison." },
        "gt":      { "arg": ["gt"], "desc": "Logical greater than (>) comparison." },
        "lte":     { "arg": ["lte"], "desc": "Logical less than or equal to (<=) comparison." },
        "lt":      { "arg": ["lt"], "desc": "Logical less than (<) comparison." },
        "oneOf":   { "arg": ["...oneOf"], "desc": "Logical set membership test." },
        "inRange": { "arg": ["...range"], "desc": "Logical value in range test." },
        "valid":   { "arg": ["valid"], "desc": "Logical valid value test." }
    })
}

fn field() -> Value {
    let ext = json!({
        "order": {
            "arg": ["order"],
            "desc": "Indicates the sort order. One of `\"ascending\"` or `\"descending\"`. Only applicable if the field is being used as a sort parameter."
        },
        "type": {
            "arg": ["type"],
            "desc": "The data type of the field. One of `\"nominal\"`, `\"ordinal\"`, `\"quantitative\"`, or `\"temporal\"`."
        }
    });
    json!({
        "desc": "A reference to a data field.",
        "doc": "References",
        "arg": ["field"],
        "ext": extend(ext, &ext_logic())
    })
}

fn field_type(ty: &str) -> Value {
    json!({
        "desc": format!("A reference to {} {ty} data field.", article(ty)),
        "doc": "References",
        "ctr": { "call": "field" },
        "set": { "type": ty }
    })
}

// -- Selections --

fn selection(ty: &str) -> Value {
    json!({
        "desc": format!("Define a new {} selection.", code(ty)),
        "doc": "Selections",
        "def": format!("{}Selection", capitalize(ty)),
        "set": { "type": ty },
        "arg": ["^_sel"],
        "key": [{ "selection": "_sel" }, "_sel"]
    })
}

fn binding(def: &str, input: &str, args: Option<&[&str]>) -> Value {
    json!({
        "desc": format!("Define a new HTML {} input element binding.", code(input)),
        "doc": "Selection Bindings",
        "def": def,
        "set": { "input": input },
        "arg": args
    })
}

// -- Encodings --

fn channel_ext() -> Value {
    let mut ext = json!({
        "fieldN": { "arg": ["field"], "set": { "type": N }, "desc": "Encode the field as a nominal data type." },
        "fieldO": { "arg": ["field"], "set": { "type": O }, "desc": "Encode the field as an ordinal data type." },
        "fieldQ": { "arg": ["field"], "set": { "type": Q }, "desc": "Encode the field as a quantitative data type." },
        "fieldT": { "arg": ["field"], "set": { "type": T }, "desc": "Encode the field as a temporal data type." },
        "if": {
            "arg": ["+++condition"],
            "flag": 0,
            "desc": "Perform a conditional encoding. If the provided condition (first argument) evaluates to true, apply the provided encoding (second argument)."
        }
    });
    for (name, parts) in AGGREGATE_OPS {
        ext = extend(ext, &json!({ *name: {
            "arg": parts.get(1).map(|f| vec![*f]).unwrap_or_default(),
            "set": { "type": Q, "aggregate": parts[0] },
            "desc": format!("Apply the {} aggregate operation prior to encoding.", code(parts[0]))
        }}));
    }
    for (name, unit) in TIME_UNIT_OPS {
        ext = extend(ext, &json!({ *name: {
            "arg": ["field"],
            "set": { "type": T, "timeUnit": unit },
            "desc": format!("Apply the {} timeUnit operation prior to encoding.", code(unit))
        }}));
    }
    ext
}

fn channel(ty: &str) -> Value {
    let field_of = |t: &str| json!({ "key": "field", "set": { "type": t } });
    let types = match ty {
        "detail" | "tooltip" => json!({ "array": { "map": { "string": field_of(N) } }, "string": field_of(N) }),
        "href" | "key" | "shape" | "text" => json!({ "string": field_of(N) }),
        "column" | "facet" | "order" | "row" => json!({ "string": field_of(O) }),
        "latitude" | "longitude" | "latitude2" | "longitude2" => json!({ "string": field_of(Q) }),
        _ => Value::Null,
    };
    json!({
        "desc": format!("Specify the {} encoding channel.", code(ty)),
        "doc": "Encodings",
        "def": format!("FacetedEncoding/properties/{ty}"),
        "key": [null, ty],
        "type": types,
        "ext": channel_ext()
    })
}

fn encoding() -> Value {
    json!({
        "desc": "A reference to an encoding channel.",
        "doc": "References",
        "arg": ["encoding"],
        "ext": {
            "order": {
                "arg": ["encoding"],
                "desc": "Indicates a sort order for encoded values. One of `\"ascending\"` or `\"descending\"`."
            }
        }
    })
}

fn reference(desc: &str, def: Option<&str>, arg: &str) -> Value {
    json!({ "desc": desc, "doc": "References", "def": def, "arg": [arg] })
}

// -- Data Specification --

fn type_data() -> Value {
    json!([{ "array": { "key": "values" }, "string": { "key": "url" } }])
}

fn format_def(ty: &str) -> String {
    let base = match ty {
        "tsv" => "csv",
        "topojson" => "topo",
        other => other,
    };
    format!("{}DataFormat", capitalize(base))
}

fn data() -> Value {
    let pass = json!({
        "fields":  { "call": "lookupData", "prop": "fields", "desc": format!("Fields to retrieve in a {} reference.", link("lookupData")) },
        "key":     { "call": "lookupData", "prop": "key", "desc": format!("Key field to lookup in a {} reference.", link("lookupData")) },
        "mark":    { "call": "mark", "desc": format!("Create a new {} that visualizes this data reference.", link("mark")) },
        "layer":   { "call": "layer", "desc": format!("Create a {} chart that visualizes this data reference.", link("layer")) },
        "hconcat": { "call": "hconcat", "desc": format!("Create a {} chart that visualizes this data reference.", link("hconcat")) },
        "vconcat": { "call": "vconcat", "desc": format!("Create a {} chart that visualizes this data reference.", link("vconcat")) }
    });
    json!({
        "desc": "Create a new data reference for a chart or lookup.",
        "doc": "Data",
        "def": "TopLevelUnitSpec",
        "arg": ["data"],
        "type": type_data(),
        "ext": ext_unit(),
        "call": call_spec(),
        "pass": extend(pass, &pass_multi())
    })
}

fn source(ty: &str, args: &[&str]) -> Value {
    json!({
        "desc": format!("Define a {ty} data source."),
        "doc": "Data",
        "def": format!("{}Data", capitalize(ty)),
        "arg": args
    })
}

fn source_format(ty: &str) -> Value {
    json!({
        "desc": format!("Define a data source for {} format data.", code(ty)),
        "doc": "Data",
        "def": format_def(ty),
        "type": extend(json!({ "object": { "key": "values" } }), &type_data()[0]),
        "set": { "type": ty },
        "nest": { "keys": ["url", "values", "name"], "rest": "format" },
        "ext": {
            "url":    { "arg": ["url"], "desc": "A URL from which to load the data." },
            "values": { "arg": ["values"], "desc": "Provide loaded data values directly." },
            "name":   { "arg": ["name"], "desc": "A name for this data source. Use this name to update the data via the runtime API." }
        }
    })
}

fn lookup_data() -> Value {
    json!({
        "desc": "Specify a lookup on a secondary data source.",
        "doc": "Data",
        "def": "LookupData",
        "arg": ["data"],
        "type": type_data()
    })
}

fn format_spec(ty: &str) -> Value {
    json!({
        "desc": format!("Specify parsing of {} format data.", code(ty)),
        "doc": "Data",
        "def": format_def(ty),
        "set": { "type": ty }
    })
}

fn generator(ty: &str) -> Value {
    let args = (ty == "sequence").then(|| json!(["start", "stop", "step"]));
    json!({
        "desc": format!("Define a {} data generator.", code(ty)),
        "doc": "Data",
        "def": format!("{}Params", capitalize(ty)),
        "key": ty,
        "arg": args
    })
}

// -- Top-Level Specifications --

fn ext_spec() -> Value {
    json!({
        "data":      { "arg": ["data"], "type": type_data(), "desc": format!("The input {} specification.", link("data")) },
        "transform": { "arg": ["...transform"], "desc": "The data transformations to apply." },
        "$schema":   null
    })
}

fn ext_layer() -> Value {
    let ext = json!({
        "projection": null,
        "project": { "arg": ["projection"], "desc": format!("The cartographic {} to apply to geographical data.", link("projection")) }
    });
    extend(ext, &ext_spec())
}

fn ext_unit() -> Value {
    let ext = json!({
        "mark":      { "arg": [":::mark"], "type": [{ "string": { "key": "type" } }], "desc": "Set the mark type and default visual properties." },
        "encoding":  null,
        "encode":    { "arg": ["+::encoding"], "flag": 1, "desc": "Specify visual encodings for the mark." },
        "selection": null,
        "select":    { "arg": ["+::selection"], "flag": 1, "desc": "Register interactive selections on the mark." }
    });
    extend(ext, &ext_layer())
}

fn pass_multi() -> Value {
    json!({
        "facet":  { "call": "_facet", "args": 1, "self": "spec", "desc": "Facet a chart into sub-plots by partitioning data values." },
        "repeat": { "call": "_repeat", "args": 1, "self": "spec", "desc": "Repeat a chart template to generate multiple plots." }
    })
}

fn call_spec() -> Value {
    json!({
        "render":   { "call": "render", "from": "__view__", "desc": "Compile and render the Vega-Lite visualization and return the DOM element containing the Vega View." },
        "toView":   { "call": "toView", "from": "__view__", "desc": "Compile the Vega-Lite specification and return the resulting Vega View object." },
        "toSpec":   { "call": "toSpec", "from": "__view__", "desc": "Return the Vega-Lite specification as a JavaScript object." },
        "toString": { "call": "toString", "from": "__view__", "desc": "Return the Vega-Lite specification as a JSON string." }
    })
}

fn unit(marks: &[String]) -> Value {
    let mut ext = ext_unit();
    for m in marks {
        ext = extend(ext, &json!({
            format!("mark{}", capitalize(m)): { "arg": [":::mark"], "pre": [{ "type": m }] }
        }));
    }
    json!({
        "desc": "Create a new mark of unspecified type.",
        "doc": "Chart Constructors",
        "def": "TopLevelUnitSpec",
        "arg": [":::mark"],
        "type": [{ "string": { "key": "type" } }],
        "ext": ext,
        "call": call_spec(),
        "pass": pass_multi()
    })
}

fn mark(ty: &str) -> Value {
    json!({
        "desc": format!("Create a new {} mark.", code(ty)),
        "doc": "Chart Constructors",
        "ctr": { "call": "mark", "arg": { "type": ty } }
    })
}

fn layer(args: &[&str]) -> Value {
    json!({
        "desc": "Create a new layered chart.",
        "doc": "Chart Constructors",
        "def": "TopLevelLayerSpec",
        "arg": args,
        "ext": ext_layer(),
        "call": call_spec(),
        "pass": pass_multi()
    })
}

fn spec(verb: &str, def: &str, args: &[&str]) -> Value {
    let repeat = if def == "TopLevelRepeatSpec" { Value::Null } else { pass_multi()["repeat"].clone() };
    json!({
        "desc": format!("{verb} charts."),
        "doc": "Chart Constructors",
        "def": def,
        "arg": args,
        "ext": ext_spec(),
        "call": call_spec(),
        "pass": { "repeat": repeat }
    })
}
