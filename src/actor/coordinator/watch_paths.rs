use std::path::PathBuf;

use crate::actor::fs::Origin;
use crate::config::SitePaths;

/// Source roots the dev server watches, tagged with their origin.
///
/// The output root is never watched; the config file is not either, since
/// its settings are read once at startup.
pub fn collect_watch_roots(paths: &SitePaths) -> Vec<(PathBuf, Origin)> {
    let mut roots = vec![
        (paths.pages.clone(), Origin::Pages),
        (paths.libs.clone(), Origin::Libs),
        (paths.static_dir.clone(), Origin::Static),
    ];
    dedupe_roots(&mut roots);
    roots
}

/// Same directory configured twice keeps its first role.
fn dedupe_roots(roots: &mut Vec<(PathBuf, Origin)>) {
    let mut seen = Vec::with_capacity(roots.len());
    roots.retain(|(path, _)| {
        if seen.contains(path) {
            false
        } else {
            seen.push(path.clone());
            true
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(pages: &str, libs: &str, static_dir: &str) -> SitePaths {
        SitePaths {
            root: PathBuf::from("/site"),
            pages: PathBuf::from(pages),
            libs: PathBuf::from(libs),
            static_dir: PathBuf::from(static_dir),
            output: PathBuf::from("/site/dist"),
        }
    }

    #[test]
    fn watches_three_source_roots() {
        let roots = collect_watch_roots(&site("/site/pages", "/site/libs", "/site/static"));
        let origins: Vec<_> = roots.iter().map(|(_, o)| *o).collect();
        assert_eq!(origins, vec![Origin::Pages, Origin::Libs, Origin::Static]);
        assert!(roots.iter().all(|(p, _)| !p.starts_with("/site/dist")));
    }

    #[test]
    fn shared_directory_watched_once() {
        let roots = collect_watch_roots(&site("/site/src", "/site/src", "/site/static"));
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0], (PathBuf::from("/site/src"), Origin::Pages));
    }
}
