//! Filesystem path helpers.

use std::path::{Path, PathBuf};

/// Extensions editors use for swap and backup files.
const TEMP_EXTENSIONS: &[&str] = &["bck", "bak", "backup", "swp", "swo", "tmp"];

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Hidden files plus everything [`is_editor_temp`] matches.
///
/// Page discovery skips them.
pub fn is_temp_file(path: &Path) -> bool {
    is_hidden(path) || is_editor_temp(path)
}

/// Editor swap/backup files and `foo~` files.
pub fn is_editor_temp(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.ends_with('~') {
        return true;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| TEMP_EXTENSIONS.contains(&ext))
}

pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.starts_with('.'))
}
