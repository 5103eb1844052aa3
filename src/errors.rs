// src/errors.rs

//! Crate-wide error types.
//!
//! The watch engine reports structured [`WatchError`] values; the CLI layers
//! `anyhow` context on top of them.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use anyhow::{Context, Result};

/// Errors surfaced by the watch engine.
///
/// Failures the engine handles internally per policy — remove-watch errors,
/// fatal reads, stale descriptors, callback errors, interrupts — are logged
/// inside the loop and never appear here.
#[derive(Debug, Error)]
pub enum WatchError {
    /// Opening the inotify instance failed. Fatal at construction.
    #[error("failed to open inotify instance")]
    Init(#[source] io::Error),

    /// A watch target does not exist (or could not be classified, which the
    /// engine treats the same way).
    #[error("watch target does not exist: {}", .0.display())]
    TargetNotFound(PathBuf),

    /// A watch target exists but is neither a regular file nor a directory.
    #[error("watch target is neither a file nor a directory: {}", .0.display())]
    UnsupportedTarget(PathBuf),

    /// Registering a watch failed during initial setup.
    #[error("failed to add watch on {}", .path.display())]
    AddWatch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The engine was used after `dispose`.
    #[error("watcher has been disposed")]
    Disposed,
}
