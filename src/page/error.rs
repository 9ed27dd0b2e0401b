//! Per-file and per-unit errors.
//!
//! Both kinds are isolated: they are collected into the pass report and never
//! stop other files or units from being resolved.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// A page source file could not be turned into units.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("syntax error in `{}`", path.display())]
    Syntax {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unit `{unit}` in `{}` is malformed", path.display())]
    Unit {
        path: PathBuf,
        unit: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("unit `{unit}` in `{}`: {message}", path.display())]
    Invalid {
        path: PathBuf,
        unit: String,
        message: String,
    },

    #[error("unit `{unit}` in `{}` extends `{base}`, which does not exist", path.display())]
    MissingBase {
        path: PathBuf,
        unit: String,
        base: String,
    },

    #[error("unit `{unit}` in `{}` has an `extends` cycle: {chain}", path.display())]
    ExtendsCycle {
        path: PathBuf,
        unit: String,
        chain: String,
    },

    #[error("unit `{unit}` in `{}` extends `{base}`, which failed to load", path.display())]
    Base {
        path: PathBuf,
        unit: String,
        base: String,
        #[source]
        source: Box<LoadError>,
    },
}

impl LoadError {
    /// The source file this error belongs to.
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. }
            | Self::Syntax { path, .. }
            | Self::Unit { path, .. }
            | Self::Invalid { path, .. }
            | Self::MissingBase { path, .. }
            | Self::ExtendsCycle { path, .. }
            | Self::Base { path, .. } => path,
        }
    }
}

/// A single unit failed to resolve.
#[derive(Debug, Error)]
pub enum UnitError {
    #[error("query failed")]
    Query(#[source] anyhow::Error),

    #[error(
        "query returned {found}; expected a mapping, a list of mappings, or a keyed list of mappings"
    )]
    InvalidQueryShape { found: String },

    #[error("element {index} has no `{key}` value to name its page")]
    MissingNameKey { key: String, index: usize },

    #[error("element {index}: `{key}` = {value} is not a usable page name")]
    InvalidName {
        key: String,
        index: usize,
        value: String,
    },

    #[error("elements {first} and {second} both produce the page name `{name}`")]
    DuplicateName {
        name: String,
        first: usize,
        second: usize,
    },

    #[error("render failed")]
    Render(#[source] anyhow::Error),
}
