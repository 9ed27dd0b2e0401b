//! Publish gate for the served output tree.
//!
//! Request handlers hold the read side while they resolve and read a file;
//! the writer holds the write side while it swaps a new tree in. A reader
//! therefore sees either the old tree or the new one, never a mix.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{RwLock, RwLockReadGuard};

#[derive(Debug, Default)]
pub struct PublishGate {
    lock: RwLock<()>,
    /// Number of successful publishes.
    generation: AtomicU64,
}

impl PublishGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold the current tree stable while reading from it.
    pub fn read(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read()
    }

    /// Run `swap` exclusively; bump the generation if it succeeds.
    pub fn publish<T, E>(&self, swap: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        let _guard = self.lock.write();
        let value = swap()?;
        self.generation.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}
