//! Generation pass: discover → resolve → check → write.
//!
//! Per-file and per-unit failures are collected into the [`PassReport`] and
//! do not stop the pass; everything that resolved is still written. Errors
//! that make the output tree untrustworthy abort the pass as a [`PassError`]
//! before anything is published.

mod conflict;
mod error;
mod write;

pub use conflict::find_collisions;
pub use error::{Claimant, Collision, PassError};
pub use write::{WriteMode, clean_output, publish};

use std::fmt;

use rayon::prelude::*;

use crate::config::SitePaths;
use crate::core::PublishGate;
use crate::page::{
    InputFilter, LoadError, OutputDescriptor, PageLoader, PageSource, UnitError, UnitFactory,
    UnitId, base_name, discover, resolve,
};

/// A failure isolated to one file or one unit.
#[derive(Debug)]
pub enum Failure {
    Load(LoadError),
    Unit { unit: UnitId, error: UnitError },
}

impl Failure {
    /// What failed: a source path or a unit id.
    pub fn subject(&self) -> String {
        match self {
            Self::Load(err) => err.path().display().to_string(),
            Self::Unit { unit, .. } => unit.to_string(),
        }
    }

    pub fn error(&self) -> &(dyn std::error::Error + 'static) {
        match self {
            Self::Load(err) => err as &(dyn std::error::Error + 'static),
            Self::Unit { error, .. } => error as &(dyn std::error::Error + 'static),
        }
    }

    /// One line: the failure followed by each underlying cause.
    pub fn detail(&self) -> String {
        let mut text = self.to_string();
        let mut source = self.error().source();
        while let Some(cause) = source {
            text.push_str(": ");
            text.push_str(&cause.to_string());
            source = cause.source();
        }
        text
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(err) => write!(f, "{err}"),
            Self::Unit { unit, error } => write!(f, "{unit}: {error}"),
        }
    }
}

/// Outcome of a pass that reached the writer.
#[derive(Debug, Default)]
pub struct PassReport {
    /// Pages written.
    pub written: usize,
    /// Units resolved, successfully or not.
    pub units: usize,
    pub failures: Vec<Failure>,
    /// Whether the outputs reached the output root.
    pub published: bool,
}

impl PassReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run one generation pass over the pages directory.
///
/// An unfiltered pass replaces the output tree; a filtered one writes the
/// selected pages in place. With a `gate` the output tree is being served:
/// once it has been published, a pass with any failure leaves it untouched
/// so the last good build stays live.
pub fn generate(
    paths: &SitePaths,
    filter: &InputFilter,
    gate: Option<&PublishGate>,
) -> Result<PassReport, PassError> {
    if !paths.pages.is_dir() {
        return Err(PassError::PagesDirMissing(paths.pages.clone()));
    }

    let loader = PageLoader::new(&paths.libs);
    let mut sources = Vec::new();
    let mut failures = Vec::new();
    for item in discover(&paths.pages, filter, &loader) {
        match item {
            Ok(source) => sources.push(source),
            Err(err) => failures.push(Failure::Load(err)),
        }
    }

    let mode = if filter.is_all() {
        WriteMode::Replace
    } else {
        WriteMode::InPlace
    };
    generate_from(sources, failures, paths, mode, gate)
}

/// Run a pass over already loaded sources.
///
/// `failures` carries load failures from discovery into the report.
pub fn generate_from(
    sources: Vec<PageSource>,
    mut failures: Vec<Failure>,
    paths: &SitePaths,
    mode: WriteMode,
    gate: Option<&PublishGate>,
) -> Result<PassReport, PassError> {
    let units: Vec<(UnitId, String, &UnitFactory)> = sources
        .iter()
        .flat_map(|source| {
            let count = source.units().len();
            source.units().iter().map(move |entry| {
                (
                    UnitId::new(source.logical(), &entry.name),
                    base_name(source.logical(), &entry.name, count),
                    &entry.factory,
                )
            })
        })
        .collect();

    if units.is_empty() && failures.is_empty() {
        return Err(PassError::NoPages);
    }

    let resolved: Vec<Result<Vec<OutputDescriptor>, Failure>> = units
        .par_iter()
        .map(|(id, base, factory)| {
            let unit = factory();
            resolve(&*unit, base, id).map_err(|error| Failure::Unit {
                unit: id.clone(),
                error,
            })
        })
        .collect();

    let mut outputs = Vec::new();
    for result in resolved {
        match result {
            Ok(pages) => outputs.extend(pages),
            Err(failure) => failures.push(failure),
        }
    }

    let collisions = find_collisions(&outputs, paths.static_name());
    if !collisions.is_empty() {
        return Err(PassError::PathCollision(collisions));
    }

    if !failures.is_empty() && gate.is_some_and(|gate| gate.generation() > 0) {
        crate::debug!("generate"; "{} failure(s), keeping the served tree", failures.len());
        return Ok(PassReport {
            written: 0,
            units: units.len(),
            failures,
            published: false,
        });
    }

    let written = publish(&outputs, paths, mode, gate)?;
    crate::debug!("generate"; "{} page(s) from {} unit(s)", written, units.len());

    Ok(PassReport {
        written,
        units: units.len(),
        failures,
        published: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{PageUnit, Query};
    use anyhow::Result;
    use serde_json::json;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn site() -> (TempDir, SitePaths) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let paths = SitePaths {
            root: root.to_path_buf(),
            pages: root.join("pages"),
            libs: root.join("libs"),
            static_dir: root.join("static"),
            output: root.join("dist"),
        };
        for sub in [&paths.pages, &paths.libs, &paths.static_dir] {
            fs::create_dir_all(sub).unwrap();
        }
        (dir, paths)
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// Every file under `root` with its content, sorted by relative path.
    fn snapshot(root: &Path) -> Vec<(String, Vec<u8>)> {
        let mut files: Vec<_> = jwalk::WalkDir::new(root)
            .skip_hidden(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let path = e.path();
                let rel = path.strip_prefix(root).unwrap().to_string_lossy().into_owned();
                (rel, fs::read(&path).unwrap())
            })
            .collect();
        files.sort();
        files
    }

    struct Fixed(&'static str);

    impl PageUnit for Fixed {
        fn template(&self) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Keyed;

    impl PageUnit for Keyed {
        fn query(&self) -> Result<Query> {
            Ok(Query::keyed(json!([{ "id": "a" }, { "no_id": true }]), "id"))
        }

        fn template(&self) -> Result<String> {
            Ok(String::new())
        }
    }

    struct Listed;

    impl PageUnit for Listed {
        fn query(&self) -> Result<Query> {
            Ok(Query::new(json!([{ "n": 1 }, { "n": 2 }])))
        }

        fn template(&self) -> Result<String> {
            Ok("{{ n }}".into())
        }
    }

    fn fixed(text: &'static str) -> UnitFactory {
        Arc::new(move || Box::new(Fixed(text)) as Box<dyn PageUnit>)
    }

    #[test]
    fn test_full_pass() {
        let (_dir, paths) = site();
        write(
            &paths.pages.join("index.toml"),
            "[index]\ntemplate = \"<h1>{{ t }}</h1>\"\nquery = { t = \"Home\" }\n",
        );
        write(
            &paths.pages.join("blog.toml"),
            "[posts]\ntemplate = \"{{ title }}\"\nkey = \"slug\"\n\
             query = [{ slug = \"one\", title = \"One\" }, { slug = \"two\", title = \"Two\" }]\n\
             [archive]\ntemplate = \"{{ n }}\"\nquery = [{ n = 1 }, { n = 2 }]\n",
        );
        write(&paths.static_dir.join("site.css"), "body{}");

        let report = generate(&paths, &InputFilter::all(), None).unwrap();

        assert!(report.is_clean());
        assert_eq!(report.units, 3);
        assert_eq!(report.written, 5);
        let files: Vec<_> = snapshot(&paths.output).into_iter().map(|(p, _)| p).collect();
        assert_eq!(
            files,
            [
                "blog/archive/1.html",
                "blog/archive/2.html",
                "blog/posts/one.html",
                "blog/posts/two.html",
                "index.html",
                "static/site.css",
            ]
        );
        assert_eq!(fs::read_to_string(paths.output.join("index.html")).unwrap(), "<h1>Home</h1>\n");
    }

    #[test]
    fn test_idempotent() {
        let (_dir, paths) = site();
        write(&paths.pages.join("a.toml"), "[a]\ntemplate = \"{{ x }}\"\nquery = [{ x = 1 }, { x = 2 }]\n");
        write(&paths.static_dir.join("img/logo.svg"), "<svg/>");

        generate(&paths, &InputFilter::all(), None).unwrap();
        let first = snapshot(&paths.output);
        generate(&paths, &InputFilter::all(), None).unwrap();
        assert_eq!(snapshot(&paths.output), first);
    }

    #[test]
    fn test_collision_leaves_output_unchanged() {
        let (_dir, paths) = site();
        write(&paths.output.join("index.html"), "previous");
        let before = snapshot(&paths.output);

        let sources = vec![
            PageSource::new("index").with_unit("home", fixed("a")),
            PageSource::new("index").with_unit("landing", fixed("b")),
        ];
        let err = generate_from(sources, Vec::new(), &paths, WriteMode::Replace, None).unwrap_err();

        match err {
            PassError::PathCollision(collisions) => {
                assert_eq!(collisions.len(), 1);
                assert_eq!(collisions[0].path, "index.html");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(snapshot(&paths.output), before);
    }

    #[test]
    fn test_file_and_directory_clash_caught_before_writing() {
        let (_dir, paths) = site();
        let sources = vec![
            PageSource::new("a").with_unit("a", fixed("a")),
            PageSource::new("a.html")
                .with_unit("list", Arc::new(|| Box::new(Listed) as Box<dyn PageUnit>)),
        ];

        let err = generate_from(sources, Vec::new(), &paths, WriteMode::Replace, None).unwrap_err();

        match err {
            PassError::PathCollision(collisions) => {
                assert_eq!(collisions.len(), 1);
                assert_eq!(collisions[0].path, "a.html");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!paths.output.exists());
    }

    #[test]
    fn test_unit_failure_isolated() {
        let (_dir, paths) = site();
        let sources = vec![
            PageSource::new("about").with_unit("about", fixed("about")),
            PageSource::new("posts")
                .with_unit("posts", Arc::new(|| Box::new(Keyed) as Box<dyn PageUnit>)),
        ];

        let report = generate_from(sources, Vec::new(), &paths, WriteMode::Replace, None).unwrap();

        assert_eq!(report.written, 1);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            &report.failures[0],
            Failure::Unit { error: UnitError::MissingNameKey { index: 2, .. }, .. }
        ));
        assert!(paths.output.join("about.html").is_file());
        assert!(!paths.output.join("posts").exists());
    }

    #[test]
    fn test_load_failure_reported() {
        let (_dir, paths) = site();
        write(&paths.pages.join("good.toml"), "[good]\ntemplate = \"ok\"\n");
        write(&paths.pages.join("bad.toml"), "[bad\n");

        let report = generate(&paths, &InputFilter::all(), None).unwrap();

        assert_eq!(report.written, 1);
        assert!(matches!(report.failures.as_slice(), [Failure::Load(LoadError::Syntax { .. })]));
        assert_eq!(report.failures[0].subject(), paths.pages.join("bad.toml").display().to_string());

        let detail = report.failures[0].detail();
        assert!(detail.starts_with("syntax error in"));
        assert!(detail.len() > report.failures[0].to_string().len(), "cause appended");
    }

    #[test]
    fn test_served_tree_kept_on_failure() {
        let (_dir, paths) = site();
        let gate = PublishGate::new();
        write(&paths.pages.join("index.toml"), "[index]\ntemplate = \"v1\"\n");
        let first = generate(&paths, &InputFilter::all(), Some(&gate)).unwrap();
        assert!(first.published);
        assert_eq!(gate.generation(), 1);

        write(&paths.pages.join("index.toml"), "[index\ntemplate = \"v2\"\n");
        let second = generate(&paths, &InputFilter::all(), Some(&gate)).unwrap();

        assert!(!second.published);
        assert_eq!(second.written, 0);
        assert_eq!(second.failures.len(), 1);
        assert_eq!(gate.generation(), 1);
        assert_eq!(fs::read_to_string(paths.output.join("index.html")).unwrap(), "v1\n");
    }

    #[test]
    fn test_first_served_pass_publishes_despite_failures() {
        let (_dir, paths) = site();
        let gate = PublishGate::new();
        write(&paths.pages.join("good.toml"), "[good]\ntemplate = \"ok\"\n");
        write(&paths.pages.join("bad.toml"), "[bad\n");

        let report = generate(&paths, &InputFilter::all(), Some(&gate)).unwrap();

        assert!(report.published);
        assert_eq!(gate.generation(), 1);
        assert!(paths.output.join("good.html").is_file());
    }

    #[test]
    fn test_filtered_pass_in_place() {
        let (_dir, paths) = site();
        write(&paths.pages.join("a.toml"), "[a]\ntemplate = \"a1\"\n");
        write(&paths.pages.join("b.toml"), "[b]\ntemplate = \"b1\"\n");
        generate(&paths, &InputFilter::all(), None).unwrap();

        write(&paths.pages.join("a.toml"), "[a]\ntemplate = \"a2\"\n");
        write(&paths.pages.join("b.toml"), "[b]\ntemplate = \"b2\"\n");
        let filter = InputFilter::from_inputs(&["pages/a.toml"], "pages");
        let report = generate(&paths, &filter, None).unwrap();

        assert_eq!(report.written, 1);
        assert_eq!(fs::read_to_string(paths.output.join("a.html")).unwrap(), "a2\n");
        assert_eq!(fs::read_to_string(paths.output.join("b.html")).unwrap(), "b1\n");
    }

    #[test]
    fn test_no_pages() {
        let (_dir, paths) = site();
        write(&paths.pages.join("notes.toml"), "title = \"nothing\"\n");
        assert!(matches!(generate(&paths, &InputFilter::all(), None), Err(PassError::NoPages)));
    }

    #[test]
    fn test_pages_dir_missing() {
        let (_dir, paths) = site();
        fs::remove_dir_all(&paths.pages).unwrap();
        assert!(matches!(
            generate(&paths, &InputFilter::all(), None),
            Err(PassError::PagesDirMissing(_))
        ));
    }

    #[test]
    fn test_static_prefix_collision() {
        let (_dir, paths) = site();
        let sources = vec![
            PageSource::new("static")
                .with_unit("a", fixed("a"))
                .with_unit("b", fixed("b")),
        ];
        let err = generate_from(sources, Vec::new(), &paths, WriteMode::Replace, None).unwrap_err();
        assert!(matches!(err, PassError::PathCollision(c) if c.len() == 2));
    }
}
