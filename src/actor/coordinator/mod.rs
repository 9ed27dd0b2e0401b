//! Dev-mode coordinator.
//!
//! Owns the debounce deadline and runs at most one rebuild at a time:
//!
//! ```text
//! Idle ──event──→ Debouncing ──deadline──→ Building ──done──→ Idle
//!                   ↑    │ event (restart)              │
//!                   └────┘        events while building └──→ Debouncing
//! ```
//!
//! Events that arrive while a build runs are collected and produce exactly
//! one follow-up build once the running one finishes.

mod runtime;
mod watch_paths;

use std::fmt;
use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::fs::{FsWatcher, WatchEvent};

pub use watch_paths::collect_watch_roots;

const CHANNEL_BUFFER: usize = 64;

/// Rebuild the site for a batch of debounced changes.
///
/// Runs on a blocking thread; failures are reported by the implementation.
pub trait Rebuild: Send + 'static {
    fn rebuild(&mut self, changes: &[WatchEvent]);
}

impl<F> Rebuild for F
where
    F: FnMut(&[WatchEvent]) + Send + 'static,
{
    fn rebuild(&mut self, changes: &[WatchEvent]) {
        self(changes)
    }
}

/// Where the watch loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevState {
    Idle,
    Debouncing,
    Building,
}

impl fmt::Display for DevState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Debouncing => "debouncing",
            Self::Building => "building",
        })
    }
}

/// Wires the file watcher to the rebuild loop.
pub struct Coordinator<R> {
    wait: Duration,
    rebuild: R,
    shutdown_rx: Option<Receiver<()>>,
}

impl<R: Rebuild> Coordinator<R> {
    pub fn new(wait: Duration, rebuild: R) -> Self {
        Self {
            wait,
            rebuild,
            shutdown_rx: None,
        }
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Run until shutdown or until the watcher stops.
    pub async fn run(self, watcher: FsWatcher) -> Result<()> {
        let (tx, rx) = mpsc::channel::<WatchEvent>(CHANNEL_BUFFER);
        let watch_handle = tokio::spawn(watcher.run(tx));

        crate::debug!("watch"; "start");
        runtime::drive(rx, self.wait, self.rebuild, self.shutdown_rx).await;

        watch_handle.abort();
        crate::debug!("watch"; "stopped");
        Ok(())
    }
}
