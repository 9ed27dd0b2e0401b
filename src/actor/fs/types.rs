use std::fmt;
use std::path::PathBuf;

/// Source directory an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    Pages,
    Libs,
    Static,
}

impl Origin {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pages => "pages",
            Self::Libs => "libs",
            Self::Static => "static",
        }
    }
}

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

/// One observed change under a watched source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub path: PathBuf,
    pub origin: Origin,
    pub kind: ChangeKind,
}

impl WatchEvent {
    pub fn new(path: impl Into<PathBuf>, origin: Origin, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            origin,
            kind,
        }
    }
}

impl fmt::Display for WatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({})",
            self.kind.label(),
            self.path.display(),
            self.origin.label()
        )
    }
}
