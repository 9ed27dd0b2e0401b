//! Configuration section definitions.
//!
//! Each module corresponds to a section in `tinyssg.toml`:
//!
//! | Module  | TOML Section | Purpose                        |
//! |---------|--------------|--------------------------------|
//! | `build` | `[build]`    | Source and output directories  |
//! | `serve` | `[serve]`    | Development server             |

mod build;
mod serve;

pub use build::BuildConfig;
pub use serve::ServeConfig;
