//! Unit resolution: query shape → output paths → rendered content.

use std::fmt;

use rustc_hash::FxHashMap;
use serde_json::Value;

use super::error::UnitError;
use super::shape::{QueryShape, classify};
use super::unit::{Mapping, PageUnit};

/// Identity of a unit: its source's logical name and its name in the file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitId {
    pub source: String,
    pub unit: String,
}

impl UnitId {
    pub fn new(source: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            unit: unit.into(),
        }
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.source, self.unit)
    }
}

/// One file to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDescriptor {
    /// Relative to the output root, `/` separated, ending in `.html`.
    pub path: String,
    pub content: String,
    pub unit: UnitId,
}

/// Output base name of a unit.
///
/// The only unit of a file is named after the file; otherwise units nest
/// under a directory named after the file.
pub fn base_name(logical: &str, unit: &str, units_in_file: usize) -> String {
    if units_in_file == 1 {
        logical.to_string()
    } else {
        format!("{logical}/{unit}")
    }
}

/// `translate(render(template, data))`, with the rendered text trimmed to a
/// single trailing newline in between.
pub fn finalize(unit: &dyn PageUnit, template: &str, data: &Mapping) -> Result<String, UnitError> {
    let rendered = unit.render(template, data).map_err(UnitError::Render)?;
    let mut text = String::with_capacity(rendered.len() + 1);
    text.push_str(rendered.trim());
    text.push('\n');
    unit.translate(text).map_err(UnitError::Render)
}

/// Resolve `unit` into its outputs under `base`.
///
/// Naming failures reject the whole unit; nothing is rendered in that case.
pub fn resolve(
    unit: &dyn PageUnit,
    base: &str,
    id: &UnitId,
) -> Result<Vec<OutputDescriptor>, UnitError> {
    let query = unit.query().map_err(UnitError::Query)?;

    let pages: Vec<(String, &Mapping)> = match classify(&query)? {
        QueryShape::Single(data) => vec![(format!("{base}.html"), data)],
        QueryShape::List(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, data)| (format!("{base}/{}.html", i + 1), data))
            .collect(),
        QueryShape::Keyed(items, key) => {
            let mut seen: FxHashMap<String, usize> = FxHashMap::default();
            let mut pages = Vec::with_capacity(items.len());
            for (i, data) in items.into_iter().enumerate() {
                let index = i + 1;
                let name = page_name(data, key, index)?;
                if let Some(&first) = seen.get(&name) {
                    return Err(UnitError::DuplicateName {
                        name,
                        first,
                        second: index,
                    });
                }
                pages.push((format!("{base}/{name}.html"), data));
                seen.insert(name, index);
            }
            pages
        }
    };

    if pages.is_empty() {
        crate::debug!("resolve"; "{} produced no pages", id);
        return Ok(Vec::new());
    }

    let template = unit.template().map_err(UnitError::Render)?;
    pages
        .into_iter()
        .map(|(path, data)| {
            Ok(OutputDescriptor {
                path,
                content: finalize(unit, &template, data)?,
                unit: id.clone(),
            })
        })
        .collect()
}

/// The page name an element's `key` value produces.
fn page_name(data: &Mapping, key: &str, index: usize) -> Result<String, UnitError> {
    let value = data.get(key).ok_or_else(|| UnitError::MissingNameKey {
        key: key.to_string(),
        index,
    })?;

    let name = match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    };

    match name {
        Some(name)
            if !name.is_empty()
                && name != "."
                && name != ".."
                && !name.contains(['/', '\\']) =>
        {
            Ok(name)
        }
        _ => Err(UnitError::InvalidName {
            key: key.to_string(),
            index,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Query;
    use anyhow::{Result, bail};
    use serde_json::json;

    const MARKER: &str = "<!-- rendered -->";

    struct TestUnit {
        data: Value,
        key: Option<&'static str>,
        template: &'static str,
    }

    impl TestUnit {
        fn new(data: Value) -> Self {
            Self {
                data,
                key: None,
                template: "<p>{{ title }}</p>",
            }
        }

        fn keyed(data: Value, key: &'static str) -> Self {
            Self {
                key: Some(key),
                ..Self::new(data)
            }
        }
    }

    impl PageUnit for TestUnit {
        fn query(&self) -> Result<Query> {
            Ok(Query {
                data: self.data.clone(),
                key: self.key.map(str::to_string),
            })
        }

        fn template(&self) -> Result<String> {
            Ok(self.template.to_string())
        }
    }

    /// Render appends a marker; translate refuses text without it.
    struct Ordered;

    impl PageUnit for Ordered {
        fn template(&self) -> Result<String> {
            Ok("  body  ".to_string())
        }

        fn render(&self, template: &str, _data: &Mapping) -> Result<String> {
            Ok(format!("{template}{MARKER}\n\n"))
        }

        fn translate(&self, text: String) -> Result<String> {
            if !text.ends_with(&format!("{MARKER}\n")) {
                bail!("translate ran before render");
            }
            Ok(text.to_uppercase())
        }
    }

    struct FailingQuery;

    impl PageUnit for FailingQuery {
        fn query(&self) -> Result<Query> {
            bail!("database offline")
        }

        fn template(&self) -> Result<String> {
            Ok(String::new())
        }
    }

    fn id() -> UnitId {
        UnitId::new("blog", "post")
    }

    fn paths(outputs: &[OutputDescriptor]) -> Vec<&str> {
        outputs.iter().map(|o| o.path.as_str()).collect()
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("about", "about", 1), "about");
        assert_eq!(base_name("blog", "post", 2), "blog/post");
    }

    #[test]
    fn test_single_mapping() {
        let unit = TestUnit::new(json!({ "title": "Hi" }));
        let outputs = resolve(&unit, "about", &id()).unwrap();
        assert_eq!(paths(&outputs), ["about.html"]);
        assert_eq!(outputs[0].content, "<p>Hi</p>\n");
        assert_eq!(outputs[0].unit, id());
    }

    #[test]
    fn test_list_numbered_in_order() {
        let unit = TestUnit::new(json!([{ "title": "a" }, { "title": "b" }, { "title": "c" }]));
        let outputs = resolve(&unit, "blog/post", &id()).unwrap();
        assert_eq!(paths(&outputs), ["blog/post/1.html", "blog/post/2.html", "blog/post/3.html"]);
        assert_eq!(outputs[2].content, "<p>c</p>\n");
    }

    #[test]
    fn test_keyed_names() {
        let unit = TestUnit::keyed(json!([{ "slug": "hello", "title": "H" }, { "slug": 7 }]), "slug");
        let outputs = resolve(&unit, "posts", &id()).unwrap();
        assert_eq!(paths(&outputs), ["posts/hello.html", "posts/7.html"]);
    }

    #[test]
    fn test_missing_key_fails_unit() {
        let unit = TestUnit::keyed(json!([{ "slug": "a" }, { "title": "no slug" }]), "slug");
        let err = resolve(&unit, "posts", &id()).unwrap_err();
        assert!(matches!(err, UnitError::MissingNameKey { index: 2, .. }));
    }

    #[test]
    fn test_duplicate_name() {
        let unit = TestUnit::keyed(json!([{ "slug": "a" }, { "slug": "b" }, { "slug": "a" }]), "slug");
        match resolve(&unit, "posts", &id()).unwrap_err() {
            UnitError::DuplicateName { name, first, second } => {
                assert_eq!((name.as_str(), first, second), ("a", 1, 3));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_names() {
        for bad in [json!(""), json!("a/b"), json!(".."), json!(1.5), json!(null), json!(["x"])] {
            let unit = TestUnit::keyed(json!([{ "slug": bad }]), "slug");
            let err = resolve(&unit, "posts", &id()).unwrap_err();
            assert!(matches!(err, UnitError::InvalidName { index: 1, .. }), "{err:?}");
        }
    }

    #[test]
    fn test_invalid_shape() {
        let unit = TestUnit::new(json!("just text"));
        let err = resolve(&unit, "x", &id()).unwrap_err();
        assert!(matches!(err, UnitError::InvalidQueryShape { .. }));
    }

    #[test]
    fn test_empty_list_yields_nothing() {
        let unit = TestUnit::new(json!([]));
        assert!(resolve(&unit, "x", &id()).unwrap().is_empty());
    }

    #[test]
    fn test_render_then_translate() {
        let outputs = resolve(&Ordered, "o", &id()).unwrap();
        assert_eq!(outputs[0].content, format!("BODY  {}\n", MARKER.to_uppercase()));
    }

    #[test]
    fn test_query_error() {
        let err = resolve(&FailingQuery, "x", &id()).unwrap_err();
        assert!(matches!(err, UnitError::Query(_)));
    }

    #[test]
    fn test_unit_id_display() {
        assert_eq!(id().to_string(), "blog [post]");
    }
}
