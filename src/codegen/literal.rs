use serde_json::Value;

/// Render a JSON value as a JavaScript source literal.
///
/// Arrays recurse with no separator spacing; strings and objects are compact
/// JSON with U+2028/U+2029 escaped (both are legal in JSON strings but end a
/// line in JavaScript source); everything else renders bare.
pub fn js_literal(v: &Value) -> String {
    match v {
        Value::Array(xs) => {
            let items: Vec<String> = xs.iter().map(js_literal).collect();
            format!("[{}]", items.join(","))
        }
        Value::String(_) | Value::Object(_) => escape_separators(v.to_string()),
        other => other.to_string(),
    }
}

pub fn js_string(s: &str) -> String {
    escape_separators(Value::String(s.to_owned()).to_string())
}

fn escape_separators(s: String) -> String {
    if s.contains(['\u{2028}', '\u{2029}']) {
        s.replace('\u{2028}', "\\u2028").replace('\u{2029}', "\\u2029")
    } else {
        s
    }
}
