//! TOML page files.
//!
//! Every top-level table that declares `template`, `template_file` or
//! `extends` is one unit, in declaration order:
//!
//! ```toml
//! [post]
//! extends = "layouts/base"
//! template_file = "layouts/post.html"
//! format = "markdown"
//! key = "slug"
//! query = [{ slug = "a", title = "A" }, { slug = "b", title = "B" }]
//! ```
//!
//! `template_file`, `query_file` and `extends` are resolved against the libs
//! directory. Files are read when the unit is queried, never at load time.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::Value;

use super::discover::PageSource;
use super::error::LoadError;
use super::merge::merge_mappings;
use super::render::markdown_to_html;
use super::unit::{Mapping, PageUnit, Query, UnitFactory};

/// Keys that make a top-level table a page unit.
const UNIT_MARKERS: [&str; 3] = ["template", "template_file", "extends"];

const MAX_EXTENDS_DEPTH: usize = 16;

/// How rendered text is translated into page content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Rendered text is the page.
    #[default]
    Text,
    /// Rendered text is CommonMark, converted to HTML.
    Markdown,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct UnitSpec {
    template: Option<String>,
    template_file: Option<PathBuf>,
    query: Option<toml::Value>,
    query_file: Option<PathBuf>,
    key: Option<String>,
    format: Option<Format>,
    extends: Option<String>,
}

#[derive(Debug, Clone)]
enum TemplateSource {
    Inline(String),
    File(PathBuf),
}

#[derive(Debug, Clone)]
enum QuerySource {
    Inline(Value),
    File(PathBuf),
}

/// One level of an `extends` chain. Unset fields fall through to the base.
#[derive(Debug, Clone, Default)]
struct Layer {
    template: Option<TemplateSource>,
    query: Option<QuerySource>,
    key: Option<String>,
    format: Option<Format>,
}

impl Layer {
    fn from_spec(path: &Path, unit: &str, spec: UnitSpec, libs: &Path) -> Result<Self, LoadError> {
        let invalid = |message: &str| LoadError::Invalid {
            path: path.to_path_buf(),
            unit: unit.to_string(),
            message: message.to_string(),
        };

        let template = match (spec.template, spec.template_file) {
            (Some(_), Some(_)) => {
                return Err(invalid("`template` and `template_file` are mutually exclusive"));
            }
            (Some(text), None) => Some(TemplateSource::Inline(text)),
            (None, Some(file)) => Some(TemplateSource::File(libs.join(file))),
            (None, None) => None,
        };

        let query = match (spec.query, spec.query_file) {
            (Some(_), Some(_)) => {
                return Err(invalid("`query` and `query_file` are mutually exclusive"));
            }
            (Some(value), None) => Some(QuerySource::Inline(toml_to_json(value))),
            (None, Some(file)) => Some(QuerySource::File(libs.join(file))),
            (None, None) => None,
        };

        Ok(Self {
            template,
            query,
            key: spec.key,
            format: spec.format,
        })
    }

    /// Apply `child` on top of this (base) layer.
    fn overlay(self, child: Layer) -> Layer {
        let query = match (self.query, child.query) {
            (
                Some(QuerySource::Inline(Value::Object(mut base))),
                Some(QuerySource::Inline(Value::Object(add))),
            ) => {
                merge_mappings(&mut base, add);
                Some(QuerySource::Inline(Value::Object(base)))
            }
            (base, None) => base,
            (_, child) => child,
        };

        Layer {
            template: child.template.or(self.template),
            query,
            key: child.key.or(self.key),
            format: child.format.or(self.format),
        }
    }

    fn finish(self, path: &Path, unit: &str) -> Result<Definition, LoadError> {
        let Some(template) = self.template else {
            return Err(LoadError::Invalid {
                path: path.to_path_buf(),
                unit: unit.to_string(),
                message: "no `template` or `template_file`, directly or through `extends`"
                    .to_string(),
            });
        };
        Ok(Definition {
            template,
            query: self.query,
            key: self.key,
            format: self.format.unwrap_or_default(),
        })
    }
}

/// A fully composed unit definition, shared by every instance.
#[derive(Debug)]
struct Definition {
    template: TemplateSource,
    query: Option<QuerySource>,
    key: Option<String>,
    format: Format,
}

/// A page unit declared in a TOML page file.
#[derive(Debug)]
struct FilePage {
    def: Arc<Definition>,
}

impl PageUnit for FilePage {
    fn query(&self) -> Result<Query> {
        let data = match &self.def.query {
            None => Value::Object(Mapping::new()),
            Some(QuerySource::Inline(value)) => value.clone(),
            Some(QuerySource::File(path)) => read_query_file(path)?,
        };
        Ok(Query {
            data,
            key: self.def.key.clone(),
        })
    }

    fn template(&self) -> Result<String> {
        match &self.def.template {
            TemplateSource::Inline(text) => Ok(text.clone()),
            TemplateSource::File(path) => fs::read_to_string(path)
                .with_context(|| format!("failed to read template `{}`", path.display())),
        }
    }

    fn translate(&self, text: String) -> Result<String> {
        Ok(match self.def.format {
            Format::Text => text,
            Format::Markdown => markdown_to_html(&text),
        })
    }
}

fn read_query_file(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read query file `{}`", path.display()))?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&text)
            .with_context(|| format!("invalid JSON in `{}`", path.display())),
        Some("toml") => {
            let table: toml::Table = toml::from_str(&text)
                .with_context(|| format!("invalid TOML in `{}`", path.display()))?;
            Ok(toml_to_json(toml::Value::Table(table)))
        }
        _ => bail!(
            "unsupported query file `{}` (expected .json or .toml)",
            path.display()
        ),
    }
}

/// TOML values as JSON. Datetimes become their RFC 3339 text.
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

fn is_valid_unit_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// Read `path` and return its unit tables in declaration order.
fn parse_units(path: &Path) -> Result<Vec<(String, UnitSpec)>, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table: toml::Table = toml::from_str(&text).map_err(|source| LoadError::Syntax {
        path: path.to_path_buf(),
        source,
    })?;

    let mut units = Vec::new();
    for (name, value) in table {
        let toml::Value::Table(body) = value else {
            continue;
        };
        if !UNIT_MARKERS.iter().any(|key| body.contains_key(*key)) {
            crate::debug!("load"; "{}: table `{}` is not a unit", path.display(), name);
            continue;
        }
        if !is_valid_unit_name(&name) {
            return Err(LoadError::Invalid {
                path: path.to_path_buf(),
                unit: name,
                message: "unit names must be a single path component".to_string(),
            });
        }
        let spec = toml::Value::Table(body)
            .try_into::<UnitSpec>()
            .map_err(|source| LoadError::Unit {
                path: path.to_path_buf(),
                unit: name.clone(),
                source,
            })?;
        units.push((name, spec));
    }
    Ok(units)
}

/// The unit at the start of an `extends` chain, used to report chain-wide
/// errors.
struct Origin<'a> {
    path: &'a Path,
    unit: &'a str,
}

/// Loads page files, resolving `extends` against the libs directory.
#[derive(Debug, Clone)]
pub struct PageLoader {
    libs_root: PathBuf,
}

impl PageLoader {
    pub fn new(libs_root: impl Into<PathBuf>) -> Self {
        Self {
            libs_root: libs_root.into(),
        }
    }

    /// Load every unit in `path` as one [`PageSource`] named `logical`.
    ///
    /// Any unit that fails to compose fails the whole file.
    pub fn load_file(&self, path: &Path, logical: &str) -> Result<PageSource, LoadError> {
        let mut source = PageSource::new(logical);
        for (name, spec) in parse_units(path)? {
            let origin = Origin { path, unit: &name };
            let mut chain = Vec::new();
            let layer = self.compose(&origin, path, &name, spec, &mut chain)?;
            let def = Arc::new(layer.finish(path, &name)?);
            let factory: UnitFactory =
                Arc::new(move || Box::new(FilePage { def: Arc::clone(&def) }) as Box<dyn PageUnit>);
            source = source.with_unit(name, factory);
        }
        Ok(source)
    }

    fn compose(
        &self,
        origin: &Origin<'_>,
        path: &Path,
        unit: &str,
        mut spec: UnitSpec,
        chain: &mut Vec<String>,
    ) -> Result<Layer, LoadError> {
        let extends = spec.extends.take();
        let own = Layer::from_spec(path, unit, spec, &self.libs_root)?;
        let Some(base_ref) = extends else {
            return Ok(own);
        };

        if chain.len() >= MAX_EXTENDS_DEPTH {
            return Err(LoadError::Invalid {
                path: origin.path.to_path_buf(),
                unit: origin.unit.to_string(),
                message: format!("`extends` chain is deeper than {MAX_EXTENDS_DEPTH}"),
            });
        }

        let (base_path, base_unit, base_spec) = self.find_base(path, unit, &base_ref)?;
        let base_logical = base_path
            .strip_prefix(&self.libs_root)
            .unwrap_or(base_path.as_path())
            .with_extension("");
        let id = format!("{}/{}", base_logical.display(), base_unit);
        if chain.contains(&id) {
            chain.push(id);
            return Err(LoadError::ExtendsCycle {
                path: origin.path.to_path_buf(),
                unit: origin.unit.to_string(),
                chain: chain.join(" -> "),
            });
        }
        chain.push(id);

        let base = match self.compose(origin, &base_path, &base_unit, base_spec, chain) {
            Ok(base) => base,
            Err(err @ LoadError::ExtendsCycle { .. }) => return Err(err),
            Err(err) => {
                return Err(LoadError::Base {
                    path: path.to_path_buf(),
                    unit: unit.to_string(),
                    base: base_ref,
                    source: Box::new(err),
                });
            }
        };
        chain.pop();
        Ok(base.overlay(own))
    }

    /// Locate `base_ref` in libs: `<logical>` for a single-unit file, or
    /// `<logical>/<unit>`.
    fn find_base(
        &self,
        path: &Path,
        unit: &str,
        base_ref: &str,
    ) -> Result<(PathBuf, String, UnitSpec), LoadError> {
        let missing = || LoadError::MissingBase {
            path: path.to_path_buf(),
            unit: unit.to_string(),
            base: base_ref.to_string(),
        };
        let load_base = |file: &Path| {
            parse_units(file).map_err(|source| LoadError::Base {
                path: path.to_path_buf(),
                unit: unit.to_string(),
                base: base_ref.to_string(),
                source: Box::new(source),
            })
        };

        if base_ref.is_empty()
            || base_ref.starts_with('/')
            || base_ref.split('/').any(|part| part.is_empty() || part == "..")
        {
            return Err(missing());
        }

        let whole = self.libs_root.join(format!("{base_ref}.toml"));
        if whole.is_file() {
            let mut units = load_base(&whole)?;
            return match units.len() {
                1 => {
                    let (name, spec) = units.remove(0);
                    Ok((whole, name, spec))
                }
                0 => Err(missing()),
                n => Err(LoadError::Invalid {
                    path: path.to_path_buf(),
                    unit: unit.to_string(),
                    message: format!(
                        "`{base_ref}` defines {n} units; name one as `{base_ref}/<unit>`"
                    ),
                }),
            };
        }

        if let Some((file, name)) = base_ref.rsplit_once('/') {
            let file = self.libs_root.join(format!("{file}.toml"));
            if file.is_file() {
                if let Some((name, spec)) = load_base(&file)?.into_iter().find(|(n, _)| n == name) {
                    return Ok((file, name, spec));
                }
            }
        }

        Err(missing())
    }
}
