//! Output path collision detection.

use rustc_hash::FxHashMap;

use super::error::{Claimant, Collision};
use crate::page::OutputDescriptor;

/// Every path claimed by more than one unit, every file path another output
/// needs as a directory, and every path that falls inside the static mirror
/// (`static_name`), sorted by path.
pub fn find_collisions(outputs: &[OutputDescriptor], static_name: Option<&str>) -> Vec<Collision> {
    let mut claims: FxHashMap<&str, Vec<Claimant>> = FxHashMap::default();
    for output in outputs {
        claims
            .entry(output.path.as_str())
            .or_default()
            .push(Claimant::Unit(output.unit.clone()));
    }

    // `a.html` as a file and `a.html/1.html` cannot both exist
    let mut dir_claims: FxHashMap<&str, Vec<Claimant>> = FxHashMap::default();
    for output in outputs {
        for dir in parent_dirs(&output.path) {
            if !claims.contains_key(dir) {
                continue;
            }
            let claimant = Claimant::Unit(output.unit.clone());
            let entry = dir_claims.entry(dir).or_default();
            if !entry.contains(&claimant) {
                entry.push(claimant);
            }
        }
    }

    let mut collisions: Vec<Collision> = claims
        .into_iter()
        .filter_map(|(path, mut claimants)| {
            if let Some(nested) = dir_claims.remove(path) {
                claimants.extend(nested);
            }
            if static_name.is_some_and(|name| is_under(path, name)) {
                claimants.push(Claimant::Static);
            }
            (claimants.len() > 1).then(|| Collision {
                path: path.to_string(),
                claimants,
            })
        })
        .collect();

    collisions.sort_by(|a, b| a.path.cmp(&b.path));
    collisions
}

/// `a/b/c.html` → `a`, `a/b`
fn parent_dirs(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices('/').map(move |(i, _)| &path[..i])
}

fn is_under(path: &str, dir: &str) -> bool {
    path.strip_prefix(dir).is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::UnitId;

    fn output(path: &str, source: &str) -> OutputDescriptor {
        OutputDescriptor {
            path: path.to_string(),
            content: String::new(),
            unit: UnitId::new(source, source),
        }
    }

    #[test]
    fn test_no_collisions() {
        let outputs = [output("a.html", "a"), output("b/1.html", "b")];
        assert!(find_collisions(&outputs, Some("static")).is_empty());
    }

    #[test]
    fn test_cross_unit_collision() {
        let outputs = [
            output("index.html", "index"),
            output("about.html", "about"),
            output("index.html", "home"),
        ];
        let collisions = find_collisions(&outputs, None);
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].path, "index.html");
        assert_eq!(
            collisions[0].claimants,
            [
                Claimant::Unit(UnitId::new("index", "index")),
                Claimant::Unit(UnitId::new("home", "home")),
            ]
        );
    }

    #[test]
    fn test_file_used_as_directory() {
        let outputs = [
            output("a.html", "a"),
            output("a.html/1.html", "a.html"),
            output("a.html/2.html", "a.html"),
            output("b/1.html", "b"),
        ];
        let collisions = find_collisions(&outputs, None);
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].path, "a.html");
        assert_eq!(
            collisions[0].claimants,
            [
                Claimant::Unit(UnitId::new("a", "a")),
                Claimant::Unit(UnitId::new("a.html", "a.html")),
            ]
        );
    }

    #[test]
    fn test_parent_dirs() {
        assert_eq!(parent_dirs("a/b/c.html").collect::<Vec<_>>(), ["a", "a/b"]);
        assert_eq!(parent_dirs("c.html").count(), 0);
    }

    #[test]
    fn test_static_prefix_reserved() {
        let outputs = [output("static/1.html", "static"), output("statics.html", "statics")];
        let collisions = find_collisions(&outputs, Some("static"));
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].path, "static/1.html");
        assert_eq!(collisions[0].claimants.last(), Some(&Claimant::Static));
    }
}
