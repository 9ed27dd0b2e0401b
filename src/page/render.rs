//! Default render and translate implementations.

use std::sync::LazyLock;

use pulldown_cmark::{Options, Parser, html};
use regex::{Captures, Regex};
use serde_json::Value;

use super::unit::Mapping;

/// `{{ name }}`, whitespace allowed inside the braces.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([^{}\s][^{}]*?)\s*\}\}").expect("placeholder pattern is valid")
});

/// Replace every `{{ key }}` whose key exists in `data`.
///
/// Placeholders without a matching key are left untouched. Substituted
/// values are not scanned again, so a value containing `{{ x }}` appears
/// literally in the output.
pub fn render_variables(src: &str, data: &Mapping) -> String {
    PLACEHOLDER
        .replace_all(src, |caps: &Captures| match data.get(&caps[1]) {
            Some(value) => value_to_string(value),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// String form of a template value.
///
/// Strings are inserted verbatim, `null` as nothing, everything else as
/// compact JSON.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Re-indent a block of text by `indent` spaces.
///
/// The common leading whitespace is removed first and the block trimmed;
/// blank lines stay empty. The result ends with one newline, which makes
/// it easy to splice into a template at a given depth.
pub fn set_indent(src: &str, indent: usize) -> String {
    let margin = src
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    let dedented = src
        .lines()
        .map(|line| if line.trim().is_empty() { "" } else { &line[margin..] })
        .collect::<Vec<_>>()
        .join("\n");

    let pad = " ".repeat(indent);
    let mut out = String::with_capacity(dedented.len() + 1);
    for line in dedented.trim().lines() {
        if !line.trim().is_empty() {
            out.push_str(&pad);
            out.push_str(line);
        }
        out.push('\n');
    }
    if out.is_empty() {
        out.push('\n');
    }
    out
}

/// CommonMark (plus tables, strikethrough, footnotes) to HTML.
pub fn markdown_to_html(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);

    let parser = Parser::new_ext(text, options);
    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
