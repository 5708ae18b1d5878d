//! Atomically swappable holder for immutable engine snapshots.
//!
//! Readers clone the inner `Arc` once and keep working on that snapshot for the
//! whole call, so a concurrent `store` never exposes a half-updated catalog or
//! ruleset. The lock is only held for the pointer copy or swap.

use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug)]
pub struct SnapshotCell<T> {
    current: RwLock<Option<Arc<T>>>,
}

impl<T> Default for SnapshotCell<T> {
    fn default() -> Self {
        Self { current: RwLock::new(None) }
    }
}

impl<T> SnapshotCell<T> {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn loaded(value: T) -> Self {
        Self { current: RwLock::new(Some(Arc::new(value))) }
    }

    /// Current snapshot, or `None` before the first load.
    pub fn load(&self) -> Option<Arc<T>> {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replaces the snapshot and returns the previous one.
    pub fn store(&self, value: T) -> Option<Arc<T>> {
        self.swap(Arc::new(value))
    }

    pub fn swap(&self, value: Arc<T>) -> Option<Arc<T>> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        guard.replace(value)
    }

    pub fn clear(&self) -> Option<Arc<T>> {
        self.current.write().unwrap_or_else(PoisonError::into_inner).take()
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }
}
