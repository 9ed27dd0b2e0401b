//! Dev-mode builds: the initial pass and every rebuild after a change.

use std::sync::Arc;

use crate::{
    actor::{Rebuild, WatchEvent},
    cli::generate::summary,
    config::SitePaths,
    core::PublishGate,
    generator::{self, PassReport},
    logger::{status_error, status_success},
    page::InputFilter,
    utils::plural::plural_count,
};

/// Runs generation passes for the dev server.
///
/// Failures never stop the server; they are shown in the status block and
/// the previous output stays published.
pub struct SiteRebuilder {
    paths: SitePaths,
    filter: InputFilter,
    gate: Arc<PublishGate>,
}

impl SiteRebuilder {
    pub fn new(paths: SitePaths, filter: InputFilter, gate: Arc<PublishGate>) -> Self {
        Self {
            paths,
            filter,
            gate,
        }
    }

    /// Run one pass, reporting the outcome. Returns whether it was clean.
    pub fn build(&self) -> bool {
        self.build_with_context("")
    }

    fn build_with_context(&self, context: &str) -> bool {
        match generator::generate(&self.paths, &self.filter, Some(&self.gate)) {
            Ok(report) => {
                report_pass(&report, &self.paths, context);
                report.is_clean()
            }
            Err(e) => {
                status_error(
                    &format!("{context}build failed"),
                    &format!("{:#}", anyhow::Error::new(e)),
                );
                false
            }
        }
    }
}

impl Rebuild for SiteRebuilder {
    fn rebuild(&mut self, changes: &[WatchEvent]) {
        for change in changes {
            crate::debug!("watch"; "{}", change);
        }
        self.build_with_context(&format!("{}: ", changed_summary(changes)));
    }
}

fn report_pass(report: &PassReport, paths: &SitePaths, context: &str) {
    let summary = summary(report, paths);
    if report.is_clean() {
        status_success(&format!("{context}{summary}"));
        return;
    }

    let errors = plural_count(report.failures.len(), "error");
    let headline = if report.published {
        format!("{context}{summary}, {errors}")
    } else {
        format!("{context}{errors}, still serving the previous build")
    };
    let details: Vec<String> = report.failures.iter().map(|f| f.detail()).collect();
    status_error(&headline, &details.join("\n"));
}

/// "index.toml modified" or "3 files changed"
fn changed_summary(changes: &[WatchEvent]) -> String {
    match changes {
        [single] => {
            let name = single
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| single.path.display().to_string());
            format!("{name} {}", single.kind.label())
        }
        _ => format!("{} changed", plural_count(changes.len(), "file")),
    }
}
