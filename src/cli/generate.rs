//! `gen` and `clean` commands.

use anyhow::{Result, bail};
use std::path::Path;

use crate::{
    config::{SiteConfig, SitePaths},
    generator::{self, PassReport},
    log,
    page::InputFilter,
    utils::plural::plural_count,
};

/// Run one generation pass and report it.
///
/// Fails when the pass aborts or any file or unit failed; pages that did
/// resolve are written either way.
pub fn generate_site(config: &SiteConfig, inputs: &[String]) -> Result<()> {
    let paths = config.paths();
    let filter = input_filter(&paths, inputs);

    let report = generator::generate(&paths, &filter, None)?;
    log!("gen"; "{}", summary(&report, &paths));

    if report.is_clean() {
        return Ok(());
    }
    for failure in &report.failures {
        log!("error"; "{}", failure.detail());
    }
    bail!(
        "generation finished with {}",
        plural_count(report.failures.len(), "error")
    )
}

/// Remove the output directory.
pub fn clean_site(config: &SiteConfig) -> Result<()> {
    let output = &config.build.output;
    let shown = display_relative(output, config.get_root());
    if generator::clean_output(output)? {
        log!("clean"; "removed {}", shown);
    } else {
        log!("clean"; "{} does not exist", shown);
    }
    Ok(())
}

/// Filter for `--input` values, relative to the pages directory.
pub fn input_filter(paths: &SitePaths, inputs: &[String]) -> InputFilter {
    if inputs.is_empty() {
        return InputFilter::all();
    }
    let pages_name = paths
        .pages
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    InputFilter::from_inputs(inputs, pages_name)
}

/// "3 pages from 2 units written to dist"
pub fn summary(report: &PassReport, paths: &SitePaths) -> String {
    format!(
        "{} from {} written to {}",
        plural_count(report.written, "page"),
        plural_count(report.units, "unit"),
        display_relative(&paths.output, &paths.root)
    )
}

fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
