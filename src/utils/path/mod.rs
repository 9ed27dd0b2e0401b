//! Path utilities.
//!
//! - [`fs`]: filesystem path normalization and editor temp-file detection

pub mod fs;

pub use fs::{is_editor_temp, is_hidden, is_temp_file, normalize_path};
