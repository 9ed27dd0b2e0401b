//! Writer: puts resolved outputs and the static mirror on disk.
//!
//! A full pass builds a complete tree in `.<output>.staging` next to the
//! output root and swaps it in with two renames. A filtered pass overwrites
//! the named pages in place. Either way the swap or overwrite happens under
//! the publish gate when one is given.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;

use super::error::PassError;
use crate::config::SitePaths;
use crate::core::PublishGate;
use crate::page::OutputDescriptor;

/// How a pass reaches the output root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Build a fresh tree and replace the output root with it.
    Replace,
    /// Overwrite only the generated pages, keep everything else.
    InPlace,
}

/// Write `outputs` under the output root and refresh the static mirror.
///
/// Returns the number of pages written.
pub fn publish(
    outputs: &[OutputDescriptor],
    paths: &SitePaths,
    mode: WriteMode,
    gate: Option<&PublishGate>,
) -> Result<usize, PassError> {
    match mode {
        WriteMode::Replace => replace(outputs, paths, gate)?,
        WriteMode::InPlace => exclusive(gate, || {
            write_pages(outputs, &paths.output)?;
            mirror_static(paths, &paths.output)
        })?,
    }
    Ok(outputs.len())
}

/// Remove the output root and any leftover staging trees.
///
/// Returns whether the output root existed.
pub fn clean_output(output: &Path) -> Result<bool, PassError> {
    let existed = output.exists();
    for dir in [output.to_path_buf(), sibling(output, "staging"), sibling(output, "old")] {
        remove_dir_if_exists(&dir)?;
    }
    Ok(existed)
}

fn exclusive(
    gate: Option<&PublishGate>,
    f: impl FnOnce() -> Result<(), PassError>,
) -> Result<(), PassError> {
    match gate {
        Some(gate) => gate.publish(f),
        None => f(),
    }
}

fn replace(
    outputs: &[OutputDescriptor],
    paths: &SitePaths,
    gate: Option<&PublishGate>,
) -> Result<(), PassError> {
    let staging = sibling(&paths.output, "staging");
    let old = sibling(&paths.output, "old");

    remove_dir_if_exists(&staging)?;
    fs::create_dir_all(&staging).map_err(PassError::write(&staging))?;

    let staged = write_pages(outputs, &staging).and_then(|()| mirror_static(paths, &staging));
    if let Err(err) = staged {
        fs::remove_dir_all(&staging).ok();
        return Err(err);
    }

    exclusive(gate, || swap(&staging, &paths.output, &old))?;

    if let Err(e) = fs::remove_dir_all(&old)
        && e.kind() != io::ErrorKind::NotFound
    {
        crate::debug!("write"; "failed to remove {}: {}", old.display(), e);
    }
    Ok(())
}

/// `output` → `old`, `staging` → `output`. Restores `output` if the second
/// rename fails.
fn swap(staging: &Path, output: &Path, old: &Path) -> Result<(), PassError> {
    remove_dir_if_exists(old)?;
    let had_output = output.exists();
    if had_output {
        fs::rename(output, old).map_err(PassError::write(output))?;
    }
    if let Err(source) = fs::rename(staging, output) {
        if had_output {
            fs::rename(old, output).ok();
        }
        return Err(PassError::Write {
            path: output.to_path_buf(),
            source,
        });
    }
    Ok(())
}

/// `.<name>.<suffix>` next to `output`.
fn sibling(output: &Path, suffix: &str) -> PathBuf {
    let name = output
        .file_name()
        .map_or_else(|| "output".into(), |n| n.to_string_lossy());
    output.with_file_name(format!(".{name}.{suffix}"))
}

fn write_pages(outputs: &[OutputDescriptor], root: &Path) -> Result<(), PassError> {
    for output in outputs {
        let path = root.join(&output.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(PassError::write(parent))?;
        }
        fs::write(&path, &output.content).map_err(PassError::write(&path))?;
    }
    Ok(())
}

/// Recreate `<root>/<static name>` from the static directory.
fn mirror_static(paths: &SitePaths, root: &Path) -> Result<(), PassError> {
    let Some(name) = paths.static_name() else {
        return Ok(());
    };
    let dest = root.join(name);
    remove_dir_if_exists(&dest)?;

    if !paths.static_dir.is_dir() {
        crate::debug!("write"; "no static directory at {}", paths.static_dir.display());
        return Ok(());
    }
    copy_tree(&paths.static_dir, &dest)
}

fn copy_tree(src: &Path, dest: &Path) -> Result<(), PassError> {
    for entry in WalkDir::new(src).skip_hidden(false).sort(true) {
        let entry = entry.map_err(|e| PassError::Write {
            path: src.to_path_buf(),
            source: io::Error::other(e.to_string()),
        })?;
        let path = entry.path();
        let Ok(rel) = path.strip_prefix(src) else {
            continue;
        };
        let target = dest.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(PassError::write(&target))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(PassError::write(parent))?;
            }
            fs::copy(&path, &target).map_err(PassError::write(&target))?;
        }
    }
    Ok(())
}

fn remove_dir_if_exists(path: &Path) -> Result<(), PassError> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(PassError::Write {
            path: path.to_path_buf(),
            source: e,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::UnitId;
    use tempfile::TempDir;

    fn paths(root: &Path) -> SitePaths {
        SitePaths {
            root: root.to_path_buf(),
            pages: root.join("pages"),
            libs: root.join("libs"),
            static_dir: root.join("static"),
            output: root.join("dist"),
        }
    }

    fn page(path: &str, content: &str) -> OutputDescriptor {
        OutputDescriptor {
            path: path.to_string(),
            content: content.to_string(),
            unit: UnitId::new("p", "p"),
        }
    }

    #[test]
    fn test_sibling_names() {
        assert_eq!(sibling(Path::new("/site/dist"), "staging"), Path::new("/site/.dist.staging"));
    }

    #[test]
    fn test_replace_drops_stale_files() {
        let dir = TempDir::new().unwrap();
        let paths = paths(dir.path());
        fs::create_dir_all(paths.output.join("old")).unwrap();
        fs::write(paths.output.join("old/stale.html"), "stale").unwrap();

        let n = publish(&[page("a/b.html", "b\n")], &paths, WriteMode::Replace, None).unwrap();

        assert_eq!(n, 1);
        assert_eq!(fs::read_to_string(paths.output.join("a/b.html")).unwrap(), "b\n");
        assert!(!paths.output.join("old").exists());
        assert!(!sibling(&paths.output, "staging").exists());
        assert!(!sibling(&paths.output, "old").exists());
    }

    #[test]
    fn test_in_place_keeps_other_files() {
        let dir = TempDir::new().unwrap();
        let paths = paths(dir.path());
        fs::create_dir_all(&paths.output).unwrap();
        fs::write(paths.output.join("keep.html"), "keep").unwrap();

        publish(&[page("new.html", "new\n")], &paths, WriteMode::InPlace, None).unwrap();

        assert_eq!(fs::read_to_string(paths.output.join("keep.html")).unwrap(), "keep");
        assert_eq!(fs::read_to_string(paths.output.join("new.html")).unwrap(), "new\n");
    }

    #[test]
    fn test_static_mirror_is_fresh() {
        let dir = TempDir::new().unwrap();
        let paths = paths(dir.path());
        fs::create_dir_all(paths.static_dir.join("css")).unwrap();
        fs::write(paths.static_dir.join("css/site.css"), "body{}").unwrap();
        fs::write(paths.static_dir.join(".nojekyll"), "").unwrap();
        fs::create_dir_all(paths.output.join("static")).unwrap();
        fs::write(paths.output.join("static/removed.js"), "gone").unwrap();

        publish(&[], &paths, WriteMode::InPlace, None).unwrap();

        let mirror = paths.output.join("static");
        assert_eq!(fs::read_to_string(mirror.join("css/site.css")).unwrap(), "body{}");
        assert!(mirror.join(".nojekyll").exists());
        assert!(!mirror.join("removed.js").exists());
    }

    #[test]
    fn test_gate_generation_bumps_per_publish() {
        let dir = TempDir::new().unwrap();
        let paths = paths(dir.path());
        let gate = PublishGate::new();

        publish(&[page("index.html", "1\n")], &paths, WriteMode::Replace, Some(&gate)).unwrap();
        publish(&[page("index.html", "2\n")], &paths, WriteMode::Replace, Some(&gate)).unwrap();

        assert_eq!(gate.generation(), 2);
        assert_eq!(fs::read_to_string(paths.output.join("index.html")).unwrap(), "2\n");
    }

    #[test]
    fn test_clean_output() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("dist");
        fs::create_dir_all(&output).unwrap();
        fs::create_dir_all(sibling(&output, "staging")).unwrap();

        assert!(clean_output(&output).unwrap());
        assert!(!output.exists());
        assert!(!sibling(&output, "staging").exists());
        assert!(!clean_output(&output).unwrap());
    }
}
