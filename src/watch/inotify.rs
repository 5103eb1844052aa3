// src/watch/inotify.rs

//! Thin typed wrapper over the Linux inotify syscalls.
//!
//! Each method maps one-to-one onto a syscall: `init` / `add_watch` /
//! `remove_watch` / `read_events` / `close`. No event interpretation happens
//! here; decoding the packed buffer returned by `read_events` is the job of
//! [`crate::watch::event`].

use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::RawFd;
use std::path::Path;

use tracing::{debug, warn};

/// Opaque kernel handle identifying a single active watch on one path.
///
/// Identity is the raw descriptor value issued by the kernel; equality and
/// hashing use that value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchDescriptor(pub(crate) i32);

impl WatchDescriptor {
    /// The raw descriptor value, mainly useful for logging.
    pub fn as_raw(self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for WatchDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Event bits requested on every `add_watch` call.
///
/// Covers content changes, metadata changes, renames in and out, child
/// create/delete, and deletion/rename of the watched entry itself. Symlinks
/// are not traversed (`IN_DONT_FOLLOW`).
pub const WATCH_MASK: u32 = libc::IN_MODIFY
    | libc::IN_ATTRIB
    | libc::IN_MOVED_FROM
    | libc::IN_MOVED_TO
    | libc::IN_CREATE
    | libc::IN_DELETE
    | libc::IN_DELETE_SELF
    | libc::IN_MOVE_SELF
    | libc::IN_DONT_FOLLOW;

/// One inotify instance.
///
/// The file descriptor is owned exclusively; `close` is idempotent and also
/// runs on drop. Reads are blocking (the instance is opened without
/// `IN_NONBLOCK`), which is what the engine's single-threaded loop wants.
#[derive(Debug)]
pub struct Inotify {
    fd: RawFd,
}

impl Inotify {
    /// Open a new inotify instance.
    pub fn init() -> io::Result<Self> {
        let fd = unsafe { libc::inotify_init1(libc::IN_CLOEXEC) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        debug!(fd, "opened inotify instance");
        Ok(Self { fd })
    }

    /// Register a watch on `path` with the given event mask.
    pub fn add_watch(&self, path: &Path, mask: u32) -> io::Result<WatchDescriptor> {
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let wd = unsafe { libc::inotify_add_watch(self.fd, c_path.as_ptr(), mask) };
        if wd < 0 {
            return Err(io::Error::last_os_error());
        }
        debug!(wd, path = %path.display(), "added watch");
        Ok(WatchDescriptor(wd))
    }

    /// Drop the watch behind `wd`.
    ///
    /// Fails with `EINVAL` when the descriptor is no longer valid, e.g. when
    /// the kernel already dropped it after the watched entry was deleted.
    pub fn remove_watch(&self, wd: WatchDescriptor) -> io::Result<()> {
        let rc = unsafe { libc::inotify_rm_watch(self.fd, wd.0) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        debug!(wd = wd.0, "removed watch");
        Ok(())
    }

    /// Block until at least one event is queued, then fill `buf` with one or
    /// more packed event records and return the number of bytes written.
    ///
    /// `Ok(0)` and most errors are fatal to the caller's read loop. `EINTR`
    /// is returned as-is so the loop can check its stop flag and decide.
    pub fn read_events(&self, buf: &mut [u8]) -> io::Result<usize> {
        let n = unsafe { libc::read(self.fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(n as usize)
    }

    /// Close the instance. Best-effort and idempotent; errors are logged,
    /// never propagated.
    pub fn close(&mut self) {
        if self.fd < 0 {
            return;
        }
        let rc = unsafe { libc::close(self.fd) };
        if rc < 0 {
            warn!(
                fd = self.fd,
                error = %io::Error::last_os_error(),
                "failed to close inotify instance"
            );
        } else {
            debug!(fd = self.fd, "closed inotify instance");
        }
        self.fd = -1;
    }
}

impl Drop for Inotify {
    fn drop(&mut self) {
        self.close();
    }
}
