//! Append-only line buffer with an import ledger.
use std::collections::BTreeSet;

use indexmap::IndexMap;

const INDENT: &str = "  ";

#[derive(Debug)]
pub struct Emitter {
    default_source: String,
    imports: IndexMap<String, BTreeSet<String>>,
    lines: Vec<String>,
    prefix: String,
}

impl Emitter {
    pub fn new(default_source: impl Into<String>) -> Self {
        let default_source = default_source.into();
        let mut imports = IndexMap::new();
        imports.insert(default_source.clone(), BTreeSet::new());
        Self { default_source, imports, lines: Vec::new(), prefix: String::new() }
    }

    /// Append a line at the current indentation. Empty input appends a bare blank line.
    pub fn line(&mut self, s: impl AsRef<str>) -> &mut Self {
        let s = s.as_ref();
        if s.is_empty() {
            self.lines.push(String::new());
        } else {
            self.lines.push(format!("{}{s}", self.prefix));
        }
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.line("")
    }

    pub fn indent(&mut self) -> &mut Self {
        self.prefix.push_str(INDENT);
        self
    }

    pub fn outdent(&mut self) -> &mut Self {
        let keep = self.prefix.len().saturating_sub(INDENT.len());
        self.prefix.truncate(keep);
        self
    }

    /// Require `symbol` from the default source.
    pub fn import(&mut self, symbol: &str) -> &mut Self {
        let source = self.default_source.clone();
        self.import_from([symbol], &source)
    }

    pub fn import_all<'a>(&mut self, symbols: impl IntoIterator<Item = &'a str>) -> &mut Self {
        let source = self.default_source.clone();
        self.import_from(symbols, &source)
    }

    pub fn import_from<'a>(
        &mut self,
        symbols: impl IntoIterator<Item = &'a str>,
        source: &str,
    ) -> &mut Self {
        let ledger = self.imports.entry(source.to_owned()).or_default();
        ledger.extend(symbols.into_iter().map(str::to_owned));
        self
    }

    /// Import declarations, a blank separator, then every appended line.
    pub fn finish(self) -> String {
        let mut out: Vec<String> = self
            .imports
            .iter()
            .map(|(source, symbols)| {
                let symbols = symbols.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
                format!("import {{{symbols}}} from './{source}';")
            })
            .collect();
        out.push(String::new());
        out.extend(self.lines);
        out.join("\n")
    }
}
