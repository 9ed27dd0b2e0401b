//! Page units and their resolution into output files.
//!
//! # Module Structure
//!
//! ```text
//! page/
//! ├── unit       # PageUnit trait, Query, Mapping
//! ├── render     # default {{ key }} substitution, markdown translate
//! ├── shape      # query result classification
//! ├── merge      # deep merge used by `extends`
//! ├── file       # TOML page-file loader (FilePage)
//! ├── discover   # pages/ walk, input filter, PageSource
//! ├── resolve    # unit → OutputDescriptor list
//! └── error      # LoadError, UnitError
//! ```

mod discover;
mod error;
mod file;
mod merge;
mod render;
mod resolve;
mod shape;
mod unit;

pub use discover::{Discovery, InputFilter, PageSource, UnitEntry, discover};
pub use error::{LoadError, UnitError};
pub use file::{Format, PageLoader};
pub use merge::merge_mappings;
pub use render::{markdown_to_html, render_variables, set_indent, value_to_string};
pub use resolve::{OutputDescriptor, UnitId, base_name, finalize, resolve};
pub use shape::{QueryShape, classify};
pub use unit::{Mapping, PageUnit, Query, UnitFactory};
