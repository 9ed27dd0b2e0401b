//! The page unit contract.

use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;

use super::render::{render_variables, set_indent};

/// String-keyed data handed to a template.
pub type Mapping = serde_json::Map<String, Value>;

/// Creates a fresh unit instance for each generation pass.
pub type UnitFactory = Arc<dyn Fn() -> Box<dyn PageUnit> + Send + Sync>;

/// Raw result of [`PageUnit::query`].
///
/// `data` is classified by the resolver: a mapping yields one page, an array
/// of mappings one page per element. With `key` set, array elements are
/// named by their `key` value instead of their 1-based position.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub data: Value,
    pub key: Option<String>,
}

impl Query {
    pub fn new(data: impl Into<Value>) -> Self {
        Self {
            data: data.into(),
            key: None,
        }
    }

    /// A list whose elements are named by `key`.
    pub fn keyed(data: impl Into<Value>, key: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            key: Some(key.into()),
        }
    }

    /// The empty mapping: one page with no variables.
    pub fn empty() -> Self {
        Self::new(Mapping::new())
    }
}

impl From<Value> for Query {
    fn from(data: Value) -> Self {
        Self::new(data)
    }
}

impl From<Mapping> for Query {
    fn from(data: Mapping) -> Self {
        Self::new(data)
    }
}

impl From<Vec<Mapping>> for Query {
    fn from(items: Vec<Mapping>) -> Self {
        Self::new(Value::Array(items.into_iter().map(Value::Object).collect()))
    }
}

/// A user-defined page generator.
///
/// Only [`template`](PageUnit::template) is required. `render` defaults to
/// literal `{{ key }}` substitution and `translate` to the identity, so a
/// unit overrides them to plug in another template engine or a format
/// converter.
pub trait PageUnit {
    /// Data for this unit's page(s).
    fn query(&self) -> Result<Query> {
        Ok(Query::empty())
    }

    /// Template source rendered once per data mapping.
    fn template(&self) -> Result<String>;

    /// Substitute `data` into `template`.
    fn render(&self, template: &str, data: &Mapping) -> Result<String> {
        Ok(render_variables(template, data))
    }

    /// Convert rendered text into final page content.
    fn translate(&self, text: String) -> Result<String> {
        Ok(text)
    }

    /// Helper for building templates: `src` dedented and re-indented by
    /// `indent` spaces. See [`set_indent`].
    fn indent(&self, src: &str, indent: usize) -> String {
        set_indent(src, indent)
    }
}
