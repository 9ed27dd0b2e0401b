//! URL to filesystem path resolution.

use std::path::{Path, PathBuf};

/// Resolve a request URL to a file under `serve_root`.
///
/// - `/` and directory URLs map to `index.html`
/// - `/foo` maps to `foo.html` when there is no `foo` file
/// - anything escaping the root resolves to `None`
pub fn resolve_path(url: &str, serve_root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url);

    // Reject paths with suspicious patterns early
    if clean.split('/').any(|part| part == "..") {
        return None;
    }

    let root_canonical = serve_root.canonicalize().ok()?;
    let local = root_canonical.join(&clean);

    if let Some(found) = existing_file(&local, &root_canonical) {
        return Some(found);
    }

    // Extensionless page URL
    if !clean.is_empty() && !clean.ends_with(".html") {
        let page = root_canonical.join(format!("{clean}.html"));
        return existing_file(&page, &root_canonical);
    }

    None
}

/// `path` itself when it is a file, its `index.html` when it is a
/// directory; `None` outside `root` (symlinks included).
fn existing_file(path: &Path, root: &Path) -> Option<PathBuf> {
    let canonical = path.canonicalize().ok()?;
    if !canonical.starts_with(root) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }

    let index = canonical.join("index.html");
    index.is_file().then_some(index)
}

/// Normalize URL: decode, strip query string and fragment, trim slashes
fn normalize_url(url: &str) -> String {
    use percent_encoding::percent_decode_str;

    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    decoded.replace('\\', "/").trim_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("blog/post")).unwrap();
        fs::create_dir_all(root.join("static")).unwrap();
        fs::write(root.join("index.html"), "home").unwrap();
        fs::write(root.join("about.html"), "about").unwrap();
        fs::write(root.join("blog/post/index.html"), "post").unwrap();
        fs::write(root.join("blog/1.html"), "one").unwrap();
        fs::write(root.join("static/a b.css"), "css").unwrap();
        dir
    }

    fn resolve(url: &str, dir: &TempDir) -> Option<String> {
        resolve_path(url, dir.path()).map(|p| fs::read_to_string(p).unwrap())
    }

    #[test]
    fn test_root_and_directories() {
        let dir = site();
        assert_eq!(resolve("/", &dir).as_deref(), Some("home"));
        assert_eq!(resolve("/blog/post/", &dir).as_deref(), Some("post"));
        assert_eq!(resolve("/blog/post", &dir).as_deref(), Some("post"));
    }

    #[test]
    fn test_extensionless_pages() {
        let dir = site();
        assert_eq!(resolve("/about", &dir).as_deref(), Some("about"));
        assert_eq!(resolve("/about.html", &dir).as_deref(), Some("about"));
        assert_eq!(resolve("/blog/1?x=2", &dir).as_deref(), Some("one"));
    }

    #[test]
    fn test_encoded_names() {
        let dir = site();
        assert_eq!(resolve("/static/a%20b.css", &dir).as_deref(), Some("css"));
    }

    #[test]
    fn test_missing_and_traversal() {
        let dir = site();
        assert!(resolve("/nope", &dir).is_none());
        assert!(resolve("/blog", &dir).is_none());
        assert!(resolve("/../etc/passwd", &dir).is_none());
        assert!(resolve("/blog/%2e%2e/%2e%2e/secret", &dir).is_none());
    }
}
