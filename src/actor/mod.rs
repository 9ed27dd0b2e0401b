//! Dev-mode watch and rebuild loop.
//!
//! ```text
//! notify ─→ FsWatcher ─(WatchEvent)─→ Coordinator ─→ Debouncer ─→ Rebuild
//! (thread)   (classify)                 (select!)     (timing)    (blocking task)
//! ```
//!
//! # Module Structure
//!
//! - `fs` - notify bridge, event classification, debouncer
//! - `coordinator` - dev state machine with single-flight rebuilds

pub mod coordinator;
pub mod fs;

pub use coordinator::{Coordinator, DevState, Rebuild, collect_watch_roots};
pub use fs::{ChangeKind, FsWatcher, Origin, WatchEvent};
