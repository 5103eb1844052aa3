// src/watch/registry.rs

//! Bookkeeping for active watches: which descriptor covers which path.
//!
//! The registry is a bidirectional mapping from [`WatchDescriptor`] to the
//! absolute path it was registered for. Iteration order is insertion order,
//! which keeps teardown logs and subtree removal deterministic.

use std::path::{Path, PathBuf};

use crate::watch::inotify::WatchDescriptor;

/// Insertion-ordered mapping from watch descriptor to absolute path.
///
/// Paths stored here are absolute, normalized and carry no trailing
/// separator; callers normalize before inserting. The registry never talks
/// to the kernel: pairing `clear` with `Inotify::close` on teardown is the
/// caller's job.
#[derive(Debug, Default)]
pub struct WatchRegistry {
    entries: Vec<(WatchDescriptor, PathBuf)>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fresh descriptor-to-path entry.
    ///
    /// Precondition: `wd` is not already a key. The engine guarantees this by
    /// removing any covering watch before re-adding (see the subtree
    /// manager); the check here only guards against kernel descriptor reuse
    /// racing with stale bookkeeping.
    pub fn insert(&mut self, wd: WatchDescriptor, path: PathBuf) {
        debug_assert!(
            self.path_for(wd).is_none(),
            "descriptor {wd} already registered"
        );
        self.entries.push((wd, path));
    }

    /// Remove the entry for `wd`. No-op when the descriptor is unknown.
    pub fn remove(&mut self, wd: WatchDescriptor) {
        self.entries.retain(|(d, _)| *d != wd);
    }

    /// The path registered for `wd`, if any.
    pub fn path_for(&self, wd: WatchDescriptor) -> Option<&Path> {
        self.entries
            .iter()
            .find(|(d, _)| *d == wd)
            .map(|(_, p)| p.as_path())
    }

    /// All `(descriptor, path)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (WatchDescriptor, &Path)> {
        self.entries.iter().map(|(wd, p)| (*wd, p.as_path()))
    }

    /// Descriptors whose registered path equals `root` or lies below it.
    ///
    /// Returns an owned list so the caller can delete entries afterwards
    /// without holding a borrow (collect-then-delete, the idiom used when
    /// removing a subtree).
    pub fn descriptors_under(&self, root: &Path) -> Vec<WatchDescriptor> {
        self.entries
            .iter()
            .filter(|(_, p)| p == root || p.starts_with(root))
            .map(|(wd, _)| *wd)
            .collect()
    }

    /// Whether any descriptor is registered for exactly this path.
    pub fn contains_path(&self, path: &Path) -> bool {
        self.entries.iter().any(|(_, p)| p == path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries without touching the kernel.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
