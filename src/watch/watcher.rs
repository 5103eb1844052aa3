// src/watch/watcher.rs

//! The watch engine proper.
//!
//! [`FileWatcher`] owns one inotify instance and the registry of active
//! watches, keeps the watch set consistent as directory trees mutate, and
//! runs the blocking decode / debounce / dispatch loop. Everything happens
//! on the caller's thread: while the callback runs, no events are read, so
//! back-pressure lands in the kernel queue instead of user memory.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};
use std::time::{Duration, Instant};
use std::{env, fs};

use tracing::{debug, error, info, warn};

use crate::errors::WatchError;
use crate::report;
use crate::watch::event::{self, ChangeKind, EntryKind, FileChangeEvent, EVENT_HEADER_LEN};
use crate::watch::inotify::{Inotify, WatchDescriptor, WATCH_MASK};
use crate::watch::registry::WatchRegistry;
use crate::watch::status::{path_status, PathStatus};

/// Default window for collapsing bursts of identical events.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Scratch buffer for one read call: room for a few hundred records.
const READ_BUF_LEN: usize = 256 * EVENT_HEADER_LEN;

/// Latched by the process-wide Ctrl-C handler. `ctrlc` registers a handler
/// exactly once per process, so the flag is global and every run loop
/// observes it.
static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static HANDLER: Once = Once::new();

fn install_interrupt_handler() {
    HANDLER.call_once(|| {
        if let Err(err) = ctrlc::set_handler(|| INTERRUPTED.store(true, Ordering::SeqCst)) {
            warn!(error = %err, "could not install Ctrl-C handler");
        }
    });
}

/// Cancellation token for a running watch loop.
///
/// Cloneable and cheap; `stop` asks the loop to exit after its current read
/// returns. The Ctrl-C handler drives the same mechanism through a shared
/// flag.
#[derive(Debug, Clone)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Single-slot memory of the most recently dispatched event.
#[derive(Debug)]
struct LastDispatch {
    path: PathBuf,
    entry: EntryKind,
    kind: ChangeKind,
    dispatched_at: Instant,
}

impl LastDispatch {
    /// Record a dispatch. The timestamp is taken *after* the callback
    /// returned, so callback latency does not count against the window.
    fn after_dispatch(ev: &FileChangeEvent) -> Self {
        Self {
            path: ev.path.clone(),
            entry: ev.entry,
            kind: ev.kind,
            dispatched_at: Instant::now(),
        }
    }

    /// A follow-up event is suppressed iff it is structurally identical to
    /// the previous dispatch and arrives within the window.
    fn suppresses(&self, ev: &FileChangeEvent, window: Duration) -> bool {
        self.path == ev.path
            && self.entry == ev.entry
            && self.kind == ev.kind
            && self.dispatched_at.elapsed() <= window
    }
}

/// Resolve `path` to an absolute, lexically normalized form.
///
/// `.` components and trailing separators fall out; `..` is kept as-is and
/// symlinks are never resolved (watches are registered with `IN_DONT_FOLLOW`
/// and should refer to what the user named).
fn absolute(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    joined
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// The watch engine.
///
/// Created armed and empty; watches can be added or removed any time before
/// or during [`run`](Self::run) (during, only from the loop thread itself,
/// which is how directory create/delete post-processing uses it).
/// [`dispose`](Self::dispose) releases every descriptor and the instance and
/// is idempotent; it also runs on drop.
#[derive(Debug)]
pub struct FileWatcher {
    inotify: Inotify,
    registry: WatchRegistry,
    verbose: bool,
    debounce: Duration,
    stop: Arc<AtomicBool>,
    disposed: bool,
}

impl FileWatcher {
    /// Open a kernel instance and return an armed, empty engine.
    pub fn new() -> Result<Self, WatchError> {
        let inotify = Inotify::init().map_err(WatchError::Init)?;
        Ok(Self {
            inotify,
            registry: WatchRegistry::new(),
            verbose: false,
            debounce: DEFAULT_DEBOUNCE,
            stop: Arc::new(AtomicBool::new(false)),
            disposed: false,
        })
    }

    /// Toggle the terse `[OK]`/`[WARN]`/`[FAIL]` status lines.
    pub fn set_verbose(&mut self, verbose: bool) -> &mut Self {
        self.verbose = verbose;
        self
    }

    /// Override the debounce window (default 100 ms).
    pub fn set_debounce(&mut self, window: Duration) -> &mut Self {
        self.debounce = window;
        self
    }

    /// A token that asks a running loop to exit.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            flag: Arc::clone(&self.stop),
        }
    }

    /// Number of active watch descriptors.
    pub fn watch_count(&self) -> usize {
        self.registry.len()
    }

    /// The watched paths, in registration order.
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        self.registry.iter().map(|(_, p)| p.to_path_buf()).collect()
    }

    /// Start watching `path`, which must exist and be a regular file or a
    /// directory.
    ///
    /// A file whose parent directory is already watched is a no-op: the
    /// parent watch already delivers its events. Otherwise any previous
    /// watch on `path` or below it is torn down first, so repeating a call
    /// leaves the registry exactly as a single call would. With `recursive`
    /// set, every directory reachable under a directory `path` gets its own
    /// descriptor; plain files inside are covered by their directory's
    /// watch. Directories behind symlinks are not entered.
    pub fn add_filepath(
        &mut self,
        path: impl AsRef<Path>,
        recursive: bool,
    ) -> Result<&mut Self, WatchError> {
        if self.disposed {
            return Err(WatchError::Disposed);
        }
        let path = absolute(path.as_ref());

        match path_status(&path) {
            PathStatus::Missing => {
                if self.verbose {
                    report::fail(&format!("{} does not exist", path.display()));
                }
                Err(WatchError::TargetNotFound(path))
            }
            PathStatus::Other => {
                if self.verbose {
                    report::fail(&format!(
                        "{} is neither a file nor a directory",
                        path.display()
                    ));
                }
                Err(WatchError::UnsupportedTarget(path))
            }
            PathStatus::File => {
                if let Some(parent) = path.parent() {
                    if self.registry.contains_path(parent) {
                        debug!(
                            path = %path.display(),
                            "parent directory already watched; nothing to add"
                        );
                        return Ok(self);
                    }
                }
                self.watch_one(&path)?;
                Ok(self)
            }
            PathStatus::Directory => {
                self.watch_one(&path)?;
                if recursive {
                    self.add_subdirectories(&path)?;
                }
                Ok(self)
            }
        }
    }

    /// [`add_filepath`](Self::add_filepath) over a sequence.
    pub fn add_filepaths<I, P>(&mut self, paths: I, recursive: bool) -> Result<&mut Self, WatchError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for path in paths {
            self.add_filepath(path, recursive)?;
        }
        Ok(self)
    }

    /// Stop watching `path` and everything below it.
    ///
    /// Paths that were never watched are silently ignored; kernel-side
    /// removal failures are logged and swallowed.
    pub fn remove_filepath(&mut self, path: impl AsRef<Path>) -> &mut Self {
        if !self.disposed {
            let path = absolute(path.as_ref());
            self.remove_subtree(&path);
        }
        self
    }

    /// Run the blocking watch loop, invoking `callback` once per surviving
    /// event.
    ///
    /// Returns when the stop handle fires, on Ctrl-C, when the kernel read
    /// fails or reports end-of-stream, or after the callback returns an
    /// error (logged, not propagated). Fails immediately with
    /// [`WatchError::Disposed`] after `dispose`.
    pub fn run<F>(&mut self, mut callback: F) -> Result<(), WatchError>
    where
        F: FnMut(&FileChangeEvent) -> anyhow::Result<()>,
    {
        if self.disposed {
            return Err(WatchError::Disposed);
        }
        install_interrupt_handler();

        let mut buf = vec![0u8; READ_BUF_LEN];
        let mut last: Option<LastDispatch> = None;
        info!(watches = self.registry.len(), "watch loop started");

        'outer: loop {
            if self.should_stop() {
                info!("watch loop interrupted");
                break;
            }

            buf.fill(0);
            let n = match self.inotify.read_events(&mut buf) {
                Ok(0) => {
                    warn!("inotify read returned no data; ending watch loop");
                    if self.verbose {
                        report::fail("event stream closed");
                    }
                    break;
                }
                Ok(n) => n,
                // A signal interrupted the read; loop around so the stop
                // flag gets checked.
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    warn!(error = %err, "inotify read failed; ending watch loop");
                    if self.verbose {
                        report::fail(&format!("reading events failed: {err}"));
                    }
                    break;
                }
            };

            if self.should_stop() {
                info!("watch loop interrupted");
                break;
            }

            for raw in event::decode_events(&buf[..n]) {
                let Some(ev) = event::classify(&raw, &self.registry) else {
                    continue;
                };

                // Keep the watch set live before the event becomes visible
                // to the user.
                if ev.entry == EntryKind::Dir {
                    match ev.kind {
                        ChangeKind::Created => {
                            // The new directory is watched non-recursively:
                            // anything created inside it from now on raises
                            // its own events and is picked up inductively.
                            if let Err(err) = self.add_filepath(&ev.path, false) {
                                warn!(
                                    path = %ev.path.display(),
                                    error = %err,
                                    "could not watch newly created directory"
                                );
                            }
                        }
                        ChangeKind::Deleted => {
                            self.remove_subtree(&ev.path);
                        }
                        _ => {}
                    }
                }

                if let Some(prev) = &last {
                    if prev.suppresses(&ev, self.debounce) {
                        debug!(event = %ev, "debounced");
                        continue;
                    }
                }

                if self.verbose {
                    report::ok(&ev.to_string());
                }
                if let Err(err) = callback(&ev) {
                    error!(error = %err, "callback failed; ending watch loop");
                    if self.verbose {
                        report::fail(&format!("callback failed: {err}"));
                    }
                    break 'outer;
                }
                last = Some(LastDispatch::after_dispatch(&ev));
            }
        }

        info!("watch loop finished");
        Ok(())
    }

    /// Release every descriptor and close the kernel instance.
    ///
    /// Idempotent; failures are logged and swallowed. Also runs on drop.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        let descriptors: Vec<WatchDescriptor> =
            self.registry.iter().map(|(wd, _)| wd).collect();
        for wd in descriptors {
            if let Err(err) = self.inotify.remove_watch(wd) {
                debug!(wd = wd.as_raw(), error = %err, "remove_watch failed during dispose");
            }
        }
        self.registry.clear();
        self.inotify.close();
        self.disposed = true;
        info!("watcher disposed");
    }

    fn should_stop(&self) -> bool {
        self.stop.load(Ordering::SeqCst) || INTERRUPTED.load(Ordering::SeqCst)
    }

    /// Tear down any covering watch, then register `path` with the full
    /// event mask.
    fn watch_one(&mut self, path: &Path) -> Result<WatchDescriptor, WatchError> {
        self.remove_subtree(path);
        let wd = match self.inotify.add_watch(path, WATCH_MASK) {
            Ok(wd) => wd,
            Err(source) => {
                if self.verbose {
                    report::fail(&format!("failed to watch {}", path.display()));
                }
                return Err(WatchError::AddWatch {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        self.registry.insert(wd, path.to_path_buf());
        if self.verbose {
            report::ok(&format!("watching {}", path.display()));
        }
        Ok(wd)
    }

    /// Register every directory below `root`, depth-first.
    fn add_subdirectories(&mut self, root: &Path) -> Result<(), WatchError> {
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(path = %root.display(), error = %err, "could not enumerate directory");
                return Ok(());
            }
        };
        for entry in entries.flatten() {
            // `DirEntry::file_type` does not follow symlinks, so symlinked
            // directories are skipped here.
            let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
            if is_dir {
                self.add_filepath(entry.path(), true)?;
            }
        }
        Ok(())
    }

    /// Drop every descriptor covering `path` or anything below it, kernel
    /// side first, then from the registry.
    fn remove_subtree(&mut self, path: &Path) {
        for wd in self.registry.descriptors_under(path) {
            if let Err(err) = self.inotify.remove_watch(wd) {
                // Routine when the watched entry was already deleted: the
                // kernel drops the descriptor on its own and rm_watch sees
                // EINVAL.
                debug!(wd = wd.as_raw(), error = %err, "remove_watch failed");
            }
            self.registry.remove(wd);
        }
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        self.dispose();
    }
}
