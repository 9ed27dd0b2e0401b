//! File-system watcher.
//!
//! Watches the pages, libs and static directories and forwards each relevant
//! change as a [`WatchEvent`]. The watcher is created before the initial
//! build so edits made while it runs are buffered, not lost.
//!
//! ```text
//! notify callback → std channel → bridge thread → tokio channel → classify → WatchEvent
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::RecommendedWatcher;
use tokio::sync::mpsc;

use crate::utils::path::{is_editor_temp, is_hidden, normalize_path};

// Restartable deadline and per-path dedup.
mod debouncer;
// Shared fs event types.
mod types;
// Watch root attach/re-attach lifecycle.
mod watch_roots;


pub use debouncer::Debouncer;
pub use types::{ChangeKind, Origin, WatchEvent};
use watch_roots::WatchRoots;

/// How often missing roots are re-attached.
const MAINTAIN_INTERVAL: Duration = Duration::from_secs(1);

/// Watches source roots and emits classified events.
pub struct FsWatcher {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    watcher: RecommendedWatcher,
    /// Watch-root consistency layer (attach/re-attach root directories)
    watch_roots: WatchRoots,
    /// Root → origin, longest root first
    origins: Vec<(PathBuf, Origin)>,
}

impl FsWatcher {
    /// Start watching `roots` immediately; events buffer until [`run`](Self::run).
    pub fn new(roots: Vec<(PathBuf, Origin)>) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let mut origins: Vec<_> = roots
            .into_iter()
            .map(|(path, origin)| (normalize_path(&path), origin))
            .collect();
        origins.sort_by_key(|(path, _)| std::cmp::Reverse(path.components().count()));

        // Missing roots are attached later, once they appear
        let mut watch_roots = WatchRoots::new(origins.iter().map(|(p, _)| p.clone()).collect());
        watch_roots.attach_existing(&mut watcher)?;

        Ok(Self {
            notify_rx,
            watcher,
            watch_roots,
            origins,
        })
    }

    /// Forward events to `tx` until the receiver is dropped.
    pub async fn run(self, tx: mpsc::Sender<WatchEvent>) {
        let Self {
            notify_rx,
            mut watcher,
            mut watch_roots,
            origins,
        } = self;

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        // notify only offers a blocking receiver
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        let mut maintain = tokio::time::interval(MAINTAIN_INTERVAL);
        loop {
            tokio::select! {
                event = async_rx.recv() => {
                    let Some(event) = event else { break };
                    for change in classify(&event, &origins) {
                        if tx.send(change).await.is_err() {
                            return;
                        }
                    }
                }
                _ = maintain.tick() => {
                    watch_roots.maintain(&mut watcher);
                    if tx.is_closed() {
                        break;
                    }
                }
            }
        }
    }
}

/// Turn a raw notify event into source-directory events.
///
/// Drops access and metadata-only events, editor temp files and paths
/// outside every root. Hidden files count only under the static root, since
/// the static mirror copies them.
fn classify(event: &notify::Event, origins: &[(PathBuf, Origin)]) -> Vec<WatchEvent> {
    use notify::EventKind;
    use notify::event::ModifyKind;

    let kind = match event.kind {
        EventKind::Create(_) => ChangeKind::Created,
        EventKind::Remove(_) => ChangeKind::Removed,
        // mtime/atime/chmod noise can trigger endless rebuild loops
        EventKind::Modify(ModifyKind::Metadata(_)) => return Vec::new(),
        EventKind::Modify(_) => ChangeKind::Modified,
        _ => return Vec::new(),
    };

    event
        .paths
        .iter()
        .filter(|path| !is_editor_temp(path))
        .filter_map(|path| {
            let path = normalize_path(path);
            let origin = origin_of(&path, origins)?;
            if origin != Origin::Static && is_hidden(&path) {
                return None;
            }
            Some(WatchEvent::new(path, origin, kind))
        })
        .collect()
}

fn origin_of(path: &Path, origins: &[(PathBuf, Origin)]) -> Option<Origin> {
    origins
        .iter()
        .find(|(root, _)| path.starts_with(root))
        .map(|(_, origin)| *origin)
}
