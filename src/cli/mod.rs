//! Command-line interface module.

mod args;
pub mod generate;
pub mod serve;

pub use args::{BuildArgs, Cli, Commands, ServeArgs};
