//! Pass-level errors.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::page::UnitId;

/// Who wants to write a given output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claimant {
    Unit(UnitId),
    /// The mirrored static-assets tree.
    Static,
}

impl fmt::Display for Claimant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit(id) => write!(f, "{id}"),
            Self::Static => f.write_str("static files"),
        }
    }
}

/// An output path claimed more than once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub path: String,
    pub claimants: Vec<Claimant>,
}

impl fmt::Display for Collision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` <- ", self.path)?;
        for (i, claimant) in self.claimants.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{claimant}")?;
        }
        Ok(())
    }
}

/// Errors that abort a generation pass. The published tree is left as it was.
#[derive(Debug, Error)]
pub enum PassError {
    #[error("pages directory `{}` does not exist", .0.display())]
    PagesDirMissing(PathBuf),

    #[error("no page units found")]
    NoPages,

    #[error("output path collision: {}", join_collisions(.0))]
    PathCollision(Vec<Collision>),

    #[error("failed to write `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PassError {
    pub(super) fn write(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Write { path, source }
    }
}

fn join_collisions(collisions: &[Collision]) -> String {
    collisions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
