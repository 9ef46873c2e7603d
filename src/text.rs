//! Small prose helpers shared by the catalog and the documentation compiler.
use once_cell::sync::Lazy;
use regex::Regex;

static VOWEL_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[aeiou]").expect("static regex"));

/// Indefinite article for a lowercase word.
pub fn article(word: &str) -> &'static str {
    if VOWEL_START.is_match(word) { "an" } else { "a" }
}

pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn code(s: &str) -> String {
    format!("<code>{s}</code>")
}

pub fn link(s: &str) -> String {
    format!("[{s}]({s})")
}
