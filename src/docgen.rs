//! Documentation compiler: Markdown reference pages and the category index.
//!
//! Pages are built from the same member plan as the generated modules, so the
//! documented accessor set always matches the generated one.
use indexmap::IndexMap;

use crate::schema::Properties;
use crate::spec::members::{self, Member, MemberKind};
use crate::spec::{Api, ArgBinding, Entry, ExtBinding, TypeTable, Visibility, public_name};
use crate::text::{article, code, link};

/// Category used for entries that declare none.
pub const DEFAULT_CATEGORY: &str = "Other";

pub fn doc_method(name: &str, entry: &Entry, shape: &Properties, prefix: &str) -> String {
    let (args, spec) = match entry {
        Entry::Method(spec) => (spec.args.as_deref(), Some(spec)),
        Entry::External(x) => (x.args.as_deref(), None),
    };

    let mut out = format!("{prefix}<b>{name}</b>(<em>{}</em>)\n", arguments(args));
    if let Some(desc) = entry.desc() {
        out.push('\n');
        out.push_str(desc);
    }
    if let Some(table) = spec.and_then(|s| s.type_table(0)) {
        out.push('\n');
        out.push_str(&dispatch_paragraph(None, table));
    }
    out.push('\n');

    let Some(spec) = spec else {
        return out;
    };

    if let Some(ctr) = &spec.ctr {
        out.push_str(&format!("Returns a {} instance.\n", link(&ctr.call)));
        return out;
    }

    out.push('\n');

    let members = members::sorted(spec, shape);
    if members.is_empty() {
        return out;
    }

    out.push_str(&format!("## <code>{name}</code> Method Overview\n\n"));
    for m in &members {
        out.push_str(&format!("* <a href=\"#{0}\">{0}</a>\n", m.name));
    }
    out.push('\n');

    out.push_str(&format!("## <code>{name}</code> API Reference\n\n"));
    for m in &members {
        out.push_str(&format!(
            "<a id=\"{0}\" href=\"#{0}\">#</a>\n<em>{name}</em>.<b>{0}</b>(<em>{1}</em>)\n",
            m.name,
            member_arguments(m)
        ));
        if let Some(desc) = member_description(m, shape) {
            out.push('\n');
            out.push_str(&desc);
            out.push('\n');
        }
        out.push('\n');
    }

    out
}

/// Category index: one section per category in first-appearance order.
pub fn doc_index(api: &Api, title: &str, prefix: &str) -> String {
    let mut sections: IndexMap<&str, Vec<(&str, &Entry)>> = IndexMap::new();
    for (name, entry) in api.iter() {
        if Visibility::of(name) == Visibility::Private {
            continue;
        }
        let category = entry.category().unwrap_or(DEFAULT_CATEGORY);
        sections.entry(category).or_default().push((public_name(name), entry));
    }

    let mut out = format!("## {title}\n");
    for (category, entries) in sections {
        out.push_str(&format!("\n### {category}\n\n"));
        for (name, entry) in entries {
            out.push_str(&format!(
                "- <a href=\"{name}\">{prefix}<b>{name}</b></a> - {}\n",
                entry.desc().unwrap_or_default()
            ));
        }
    }
    out
}

// --------------------------------- Helpers --------------------------------- //

fn arguments(args: Option<&[ArgBinding]>) -> String {
    match args {
        Some(args) => args.iter().map(ArgBinding::display_name).collect::<Vec<_>>().join(", "),
        None => "...values".to_owned(),
    }
}

fn member_arguments(m: &Member<'_>) -> String {
    match m.kind {
        MemberKind::Property { array: true, .. } => "...value".to_owned(),
        MemberKind::Property { array: false, .. } => "value".to_owned(),
        MemberKind::Extension(ext) => ext.binding.display_name(),
        MemberKind::Delegation(_) | MemberKind::Invocation(_) => "...values".to_owned(),
    }
}

/// Member description, falling back to the schema description of the
/// same-named property, plus the member's own dispatch paragraph.
fn member_description(m: &Member<'_>, shape: &Properties) -> Option<String> {
    let desc = m.desc().or_else(|| {
        shape
            .get(m.name)
            .and_then(|p| p.get("description"))
            .and_then(|d| d.as_str())
    });

    let MemberKind::Extension(ext) = m.kind else {
        return desc.map(str::to_owned);
    };
    let Some(table) = &ext.types else {
        return desc.map(str::to_owned);
    };
    let prop = match &ext.binding {
        ExtBinding::Copy => m.name,
        ExtBinding::Merge(p)
        | ExtBinding::AccreteObject(p)
        | ExtBinding::AccreteArray(p)
        | ExtBinding::Spread(p)
        | ExtBinding::Plain(p) => p.as_str(),
    };
    let para = dispatch_paragraph(Some(prop), table);
    Some(match desc {
        Some(d) => format!("{d}\n{para}"),
        None => para.trim_start().to_owned(),
    })
}

/// Sentence list describing a dispatch table. With no property the cases
/// describe constructor arguments.
pub fn dispatch_paragraph(prop: Option<&str>, table: &TypeTable) -> String {
    let mut out = String::from("\nThe behavior of this method depends on the argument type:\n\n");
    for case in table.doc_cases() {
        let type_name = if case.array {
            format!("{} array", case.type_name)
        } else {
            case.type_name.to_owned()
        };
        let target = match prop {
            Some(p) => format!("{p}.{}", case.key),
            None => case.key,
        };
        out.push_str(&format!(
            "- If the argument is {} {}, sets the {} property.\n",
            article(case.type_name),
            code(&type_name),
            code(&target)
        ));
    }
    match prop {
        Some(p) => out.push_str(&format!("- Otherwise, sets the {} property.", code(p))),
        None => out.push_str("- Otherwise, sets the properties defined on the input argument(s), if provided."),
    }
    out
}
