// src/watch/status.rs

//! One-shot pre-flight check for watch targets.

use std::fs;
use std::path::Path;

/// What a path resolves to on disk, without following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStatus {
    /// The path does not exist, or could not be classified (permission
    /// denied, name too long, ...). The engine treats both the same way.
    Missing,
    /// A regular file.
    File,
    /// A directory.
    Directory,
    /// Anything else: symlink, socket, fifo, device.
    Other,
}

/// Classify `path` for the watch engine.
///
/// Uses `symlink_metadata` so a symlink reports as [`PathStatus::Other`]
/// rather than whatever it points at.
pub fn path_status(path: &Path) -> PathStatus {
    match fs::symlink_metadata(path) {
        Ok(meta) => {
            let ft = meta.file_type();
            if ft.is_file() {
                PathStatus::File
            } else if ft.is_dir() {
                PathStatus::Directory
            } else {
                PathStatus::Other
            }
        }
        Err(_) => PathStatus::Missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_file_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"x").unwrap();

        assert_eq!(path_status(dir.path()), PathStatus::Directory);
        assert_eq!(path_status(&file), PathStatus::File);
        assert_eq!(path_status(&dir.path().join("nope")), PathStatus::Missing);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_is_other() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"x").unwrap();
        let link = dir.path().join("a.link");
        std::os::unix::fs::symlink(&file, &link).unwrap();

        assert_eq!(path_status(&link), PathStatus::Other);
    }
}
