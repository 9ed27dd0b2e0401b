//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! pages = "pages"       # Page files (relative to project root)
//! libs = "libs"         # Templates, data files and `extends` bases
//! static = "static"     # Copied verbatim to <output>/<static dir name>
//! output = "dist"       # Generated site
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Page file directory.
    pub pages: PathBuf,

    /// Library directory; loaded, never output.
    pub libs: PathBuf,

    /// Static assets directory.
    #[serde(rename = "static")]
    pub static_dir: PathBuf,

    /// Build output directory.
    pub output: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            pages: "pages".into(),
            libs: "libs".into(),
            static_dir: "static".into(),
            output: "dist".into(),
        }
    }
}
