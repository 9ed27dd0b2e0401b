use std::path::PathBuf;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use super::types::{ChangeKind, WatchEvent};

/// Sleep used while nothing is pending.
const IDLE_SLEEP: Duration = Duration::from_secs(86400);

/// Pure debouncer: a restartable deadline plus per-path deduplication.
///
/// Every `add` pushes the deadline to `wait` after the newest event.
pub struct Debouncer {
    wait: Duration,
    /// Path → latest effective event
    pub(super) changes: FxHashMap<PathBuf, WatchEvent>,
    pub(super) last_event: Option<Instant>,
}

impl Debouncer {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            changes: FxHashMap::default(),
            last_event: None,
        }
    }

    /// Record an event and restart the deadline.
    ///
    /// Per-path rules:
    /// - Removed then Created/Modified: the restore wins
    /// - Modified then Removed: Removed
    /// - Created then Removed: nothing happened
    /// - anything else: first event wins
    pub fn add(&mut self, event: WatchEvent) {
        self.last_event = Some(Instant::now());

        let Some(existing) = self.changes.get(&event.path).map(|e| e.kind) else {
            crate::debug!("watch"; "{}", event);
            self.changes.insert(event.path.clone(), event);
            return;
        };

        match (existing, event.kind) {
            (ChangeKind::Removed, ChangeKind::Created | ChangeKind::Modified) => {
                crate::debug!("watch"; "restore: {}", event.path.display());
                self.changes.insert(event.path.clone(), event);
            }
            (ChangeKind::Modified, ChangeKind::Removed) => {
                crate::debug!("watch"; "upgrade modified->removed: {}", event.path.display());
                self.changes.insert(event.path.clone(), event);
            }
            (ChangeKind::Created, ChangeKind::Removed) => {
                crate::debug!("watch"; "discard created+removed: {}", event.path.display());
                self.changes.remove(&event.path);
            }
            _ => {}
        }
    }

    /// A deadline is armed.
    pub fn has_pending(&self) -> bool {
        self.last_event.is_some()
    }

    pub fn is_ready(&self) -> bool {
        self.last_event
            .is_some_and(|last| last.elapsed() >= self.wait)
    }

    /// Time left until the deadline, at least 1ms.
    pub fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return IDLE_SLEEP;
        };
        self.wait
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }

    /// Take the accumulated changes, sorted by path, once the deadline passed.
    ///
    /// Disarms the deadline even when every change cancelled out.
    pub fn take_if_ready(&mut self) -> Option<Vec<WatchEvent>> {
        if !self.is_ready() {
            return None;
        }
        self.last_event = None;

        let mut changes: Vec<_> = std::mem::take(&mut self.changes).into_values().collect();
        if changes.is_empty() {
            return None;
        }
        changes.sort_by(|a, b| a.path.cmp(&b.path));
        Some(changes)
    }

    /// Start a fresh wait for changes gathered while a build ran.
    pub fn restart(&mut self) {
        if self.last_event.is_some() {
            self.last_event = Some(Instant::now());
        }
    }
}
