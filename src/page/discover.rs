//! Page source discovery.
//!
//! Walks the pages directory once, sorts the eligible files, and loads them
//! lazily as the [`Discovery`] iterator is consumed.

use std::fmt;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;

use super::error::LoadError;
use super::file::PageLoader;
use super::unit::UnitFactory;
use crate::utils::path::is_temp_file;

/// Extension of page source files.
const PAGE_EXT: &str = "toml";

/// A named unit factory within a source.
#[derive(Clone)]
pub struct UnitEntry {
    pub name: String,
    pub factory: UnitFactory,
}

impl fmt::Debug for UnitEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitEntry").field("name", &self.name).finish_non_exhaustive()
    }
}

/// One source file: its logical name and its units in declaration order.
#[derive(Debug, Clone)]
pub struct PageSource {
    logical: String,
    units: Vec<UnitEntry>,
}

impl PageSource {
    pub fn new(logical: impl Into<String>) -> Self {
        Self {
            logical: logical.into(),
            units: Vec::new(),
        }
    }

    pub fn with_unit(mut self, name: impl Into<String>, factory: UnitFactory) -> Self {
        self.units.push(UnitEntry {
            name: name.into(),
            factory,
        });
        self
    }

    /// Path relative to the pages root, without extension, `/` separated.
    pub fn logical(&self) -> &str {
        &self.logical
    }

    pub fn units(&self) -> &[UnitEntry] {
        &self.units
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Restricts a pass to an explicit list of source files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputFilter {
    /// Normalized logical names; `None` selects every file.
    only: Option<Vec<String>>,
}

impl InputFilter {
    pub fn all() -> Self {
        Self::default()
    }

    /// Build a filter from user-supplied paths.
    ///
    /// `./pages/blog/post.toml`, `pages/blog/post` and `blog/post` all name
    /// the same source when the pages directory is called `pages`. An empty
    /// list selects everything.
    pub fn from_inputs<S: AsRef<str>>(inputs: &[S], pages_dir_name: &str) -> Self {
        if inputs.is_empty() {
            return Self::all();
        }
        let only = inputs
            .iter()
            .map(|input| normalize_input(input.as_ref(), pages_dir_name))
            .collect();
        Self { only: Some(only) }
    }

    pub fn is_all(&self) -> bool {
        self.only.is_none()
    }

    pub fn matches(&self, logical: &str) -> bool {
        match &self.only {
            None => true,
            Some(names) => names.iter().any(|name| name == logical),
        }
    }

    /// Entries of an explicit filter that match none of `logicals`.
    fn unmatched<'a>(&'a self, logicals: &[&str]) -> Vec<&'a str> {
        self.only
            .iter()
            .flatten()
            .filter(|name| !logicals.contains(&name.as_str()))
            .map(String::as_str)
            .collect()
    }
}

fn normalize_input(input: &str, pages_dir_name: &str) -> String {
    let mut rest = input.replace('\\', "/");
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped.to_string();
    }
    if let Some(stripped) = rest
        .strip_prefix(pages_dir_name)
        .and_then(|s| s.strip_prefix('/'))
    {
        rest = stripped.to_string();
    }
    match rest.rsplit_once('.') {
        Some((stem, ext)) if !ext.contains('/') && !stem.is_empty() && !stem.ends_with('/') => {
            stem.to_string()
        }
        _ => rest,
    }
}

/// Lazily loaded page sources in sorted logical-name order.
///
/// Files that define no units are skipped with a warning.
pub struct Discovery<'a> {
    files: std::vec::IntoIter<(PathBuf, String)>,
    loader: &'a PageLoader,
}

impl Iterator for Discovery<'_> {
    type Item = Result<PageSource, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        for (path, logical) in self.files.by_ref() {
            match self.loader.load_file(&path, &logical) {
                Ok(source) if source.is_empty() => {
                    crate::log!("warn"; "`{}` defines no page units, skipped", path.display());
                }
                result => return Some(result),
            }
        }
        None
    }
}

/// Eligible page files under `pages_root` that pass `filter`.
pub fn discover<'a>(pages_root: &Path, filter: &InputFilter, loader: &'a PageLoader) -> Discovery<'a> {
    let mut files: Vec<(PathBuf, String)> = WalkDir::new(pages_root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .filter(|path| !is_temp_file(path))
        .filter(|path| path.extension().is_some_and(|ext| ext == PAGE_EXT))
        .filter_map(|path| {
            let logical = logical_name(pages_root, &path)?;
            Some((path, logical))
        })
        .collect();
    files.sort_by(|a, b| a.1.cmp(&b.1));

    if !filter.is_all() {
        let logicals: Vec<&str> = files.iter().map(|(_, l)| l.as_str()).collect();
        for name in filter.unmatched(&logicals) {
            crate::log!("warn"; "input `{}` does not name a page file", name);
        }
        files.retain(|(_, logical)| filter.matches(logical));
    }

    crate::debug!("discover"; "{} page file(s) under {}", files.len(), pages_root.display());
    Discovery {
        files: files.into_iter(),
        loader,
    }
}

fn logical_name(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?.with_extension("");
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        let pages = dir.path().join("pages");
        fs::create_dir_all(pages.join("blog")).unwrap();
        fs::create_dir_all(dir.path().join("libs")).unwrap();
        fs::write(pages.join("index.toml"), "[index]\ntemplate = \"home\"\n").unwrap();
        fs::write(pages.join("about.toml"), "[about]\ntemplate = \"about\"\n").unwrap();
        fs::write(pages.join("blog/post.toml"), "[a]\ntemplate = \"a\"\n[b]\ntemplate = \"b\"\n").unwrap();
        fs::write(pages.join("notes.toml"), "title = \"no units here\"\n").unwrap();
        fs::write(pages.join("readme.md"), "not a page").unwrap();
        fs::write(pages.join(".hidden.toml"), "[h]\ntemplate = \"h\"\n").unwrap();
        fs::write(pages.join("index.toml~"), "[x]\ntemplate = \"x\"\n").unwrap();
        dir
    }

    fn logicals(root: &Path, filter: &InputFilter) -> Vec<String> {
        let loader = PageLoader::new(root.join("libs"));
        discover(&root.join("pages"), filter, &loader)
            .map(|source| source.unwrap().logical().to_string())
            .collect()
    }

    #[test]
    fn test_discovers_sorted_units() {
        let dir = site();
        assert_eq!(logicals(dir.path(), &InputFilter::all()), ["about", "blog/post", "index"]);
    }

    #[test]
    fn test_unit_order_in_file() {
        let dir = site();
        let loader = PageLoader::new(dir.path().join("libs"));
        let filter = InputFilter::from_inputs(&["blog/post"], "pages");
        let sources: Vec<_> = discover(&dir.path().join("pages"), &filter, &loader).collect();
        let source = sources[0].as_ref().unwrap();
        let names: Vec<_> = source.units().iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_filter_normalization() {
        let dir = site();
        let filter = InputFilter::from_inputs(&["./pages/index.toml", "blog\\post.toml"], "pages");
        assert_eq!(logicals(dir.path(), &filter), ["blog/post", "index"]);
    }

    #[test]
    fn test_load_error_isolated() {
        let dir = site();
        fs::write(dir.path().join("pages/broken.toml"), "[x\n").unwrap();
        let loader = PageLoader::new(dir.path().join("libs"));
        let results: Vec<_> =
            discover(&dir.path().join("pages"), &InputFilter::all(), &loader).collect();

        assert_eq!(results.len(), 4);
        assert!(matches!(results[2], Err(LoadError::Syntax { .. })));
        assert!(results.iter().filter(|r| r.is_ok()).count() == 3);
    }

    #[test]
    fn test_normalize_input() {
        assert_eq!(normalize_input("pages/blog/post.toml", "pages"), "blog/post");
        assert_eq!(normalize_input("././index", "pages"), "index");
        assert_eq!(normalize_input("pagesx/index.toml", "pages"), "pagesx/index");
        assert_eq!(normalize_input("v1.2/page", "pages"), "v1.2/page");
    }

    #[test]
    fn test_filter_all() {
        let filter = InputFilter::from_inputs::<&str>(&[], "pages");
        assert!(filter.is_all());
        assert!(filter.matches("anything"));
    }
}
