// src/watch/event.rs

//! Decoding and classification of raw inotify event records.
//!
//! A single read on the inotify fd may return several records packed
//! back-to-back. Each record is a fixed 16-byte prefix (`i32 wd`, `u32 mask`,
//! `u32 cookie`, `u32 name_len`) followed by `name_len` bytes of NUL-padded
//! child name; the name is absent when the event pertains to the watched
//! entry itself.

use std::ffi::OsString;
use std::fmt;
use std::os::unix::ffi::OsStringExt;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::watch::inotify::WatchDescriptor;
use crate::watch::registry::WatchRegistry;

/// Byte length of the fixed record prefix.
pub const EVENT_HEADER_LEN: usize = 16;

/// One wire-level event record, as handed over by the kernel.
#[derive(Debug, Clone)]
pub struct RawEvent {
    pub wd: WatchDescriptor,
    pub mask: u32,
    pub cookie: u32,
    /// Child name relative to the watched directory, when the kernel
    /// provided one. Trailing NUL padding is already stripped.
    pub name: Option<OsString>,
}

/// The refined event taxonomy dispatched to the user callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Deleted,
    Changed,
    ChangedAttribs,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeKind::Created => "created",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Changed => "changed",
            ChangeKind::ChangedAttribs => "changed-attribs",
        };
        f.write_str(s)
    }
}

/// Whether the affected entry is a directory or a file, as reported by the
/// kernel (`IN_ISDIR`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntryKind::File => "file",
            EntryKind::Dir => "dir",
        })
    }
}

/// The object handed to the user callback.
#[derive(Debug, Clone)]
pub struct FileChangeEvent {
    /// Monotonic capture time at decode.
    pub timestamp: Instant,
    pub kind: ChangeKind,
    pub entry: EntryKind,
    /// Absolute path of the affected entry: the watched directory joined
    /// with the event's name suffix when present, else the watched path
    /// itself.
    pub path: PathBuf,
}

impl fmt::Display for FileChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.kind, self.entry, self.path.display())
    }
}

/// Native-endian u32 at `at`; the caller has already checked the bounds.
fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_ne_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

/// Walk `buf` and decode every complete record in it.
///
/// `buf` must be exactly the slice filled by one read call. A truncated
/// trailing record means the buffer and the kernel disagree about layout;
/// decoding stops there with a warning rather than misparse.
pub fn decode_events(buf: &[u8]) -> Vec<RawEvent> {
    let mut events = Vec::new();
    let mut offset = 0usize;

    while offset < buf.len() {
        if buf.len() - offset < EVENT_HEADER_LEN {
            warn!(
                offset,
                remaining = buf.len() - offset,
                "truncated inotify record header; discarding tail"
            );
            break;
        }

        let wd = read_u32(buf, offset) as i32;
        let mask = read_u32(buf, offset + 4);
        let cookie = read_u32(buf, offset + 8);
        let name_len = read_u32(buf, offset + 12) as usize;

        let record_end = offset + EVENT_HEADER_LEN + name_len;
        if record_end > buf.len() {
            warn!(
                offset,
                name_len,
                "truncated inotify record name; discarding tail"
            );
            break;
        }

        let name = if name_len > 0 {
            let raw = &buf[offset + EVENT_HEADER_LEN..record_end];
            // The kernel pads the name with NULs up to alignment.
            let trimmed: Vec<u8> = raw.iter().copied().take_while(|b| *b != 0).collect();
            if trimmed.is_empty() {
                None
            } else {
                Some(OsString::from_vec(trimmed))
            }
        } else {
            None
        };

        events.push(RawEvent {
            wd: WatchDescriptor(wd),
            mask,
            cookie,
            name,
        });
        offset = record_end;
    }

    events
}

/// Resolve and classify one raw record against the registry.
///
/// Returns `None` for records the engine does not surface: events whose
/// descriptor is no longer registered (a watch was removed while the event
/// sat in the kernel queue) and events outside the created / deleted /
/// changed / changed-attribs taxonomy.
pub fn classify(raw: &RawEvent, registry: &WatchRegistry) -> Option<FileChangeEvent> {
    let Some(base) = registry.path_for(raw.wd) else {
        trace!(wd = raw.wd.as_raw(), mask = raw.mask, "event for stale descriptor, skipping");
        return None;
    };

    if raw.mask & libc::IN_UNMOUNT != 0 {
        debug!(path = %base.display(), "backing filesystem unmounted");
    }

    // First matching rule wins.
    let kind = if raw.mask & libc::IN_CREATE != 0 {
        ChangeKind::Created
    } else if raw.mask & libc::IN_DELETE != 0 {
        ChangeKind::Deleted
    } else if raw.mask & libc::IN_MODIFY != 0 {
        ChangeKind::Changed
    } else if raw.mask & libc::IN_ATTRIB != 0 {
        ChangeKind::ChangedAttribs
    } else {
        return None;
    };

    let entry = if raw.mask & libc::IN_ISDIR != 0 {
        EntryKind::Dir
    } else {
        EntryKind::File
    };

    let path = match &raw.name {
        Some(name) => base.join(name),
        None => base.to_path_buf(),
    };

    Some(FileChangeEvent {
        timestamp: Instant::now(),
        kind,
        entry,
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    /// Encode one record the way the kernel lays it out, NUL-padding the
    /// name to 4-byte alignment.
    fn encode(wd: i32, mask: u32, cookie: u32, name: Option<&str>) -> Vec<u8> {
        let mut buf = Vec::new();
        let name_bytes = name.map(|n| n.as_bytes().to_vec()).unwrap_or_default();
        let padded_len = if name_bytes.is_empty() {
            0
        } else {
            (name_bytes.len() + 1 + 3) & !3
        };

        buf.extend_from_slice(&wd.to_ne_bytes());
        buf.extend_from_slice(&mask.to_ne_bytes());
        buf.extend_from_slice(&cookie.to_ne_bytes());
        buf.extend_from_slice(&(padded_len as u32).to_ne_bytes());
        buf.extend_from_slice(&name_bytes);
        buf.resize(buf.len() + padded_len - name_bytes.len(), 0);
        buf
    }

    fn registry_with(wd: i32, path: &str) -> WatchRegistry {
        let mut reg = WatchRegistry::new();
        reg.insert(WatchDescriptor(wd), PathBuf::from(path));
        reg
    }

    #[test]
    fn decodes_packed_records() {
        let mut buf = encode(1, libc::IN_MODIFY, 0, Some("a.txt"));
        buf.extend(encode(2, libc::IN_CREATE | libc::IN_ISDIR, 0, Some("sub")));
        buf.extend(encode(1, libc::IN_DELETE_SELF, 0, None));

        let events = decode_events(&buf);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].wd, WatchDescriptor(1));
        assert_eq!(events[0].name.as_deref(), Some("a.txt".as_ref()));
        assert_eq!(events[1].name.as_deref(), Some("sub".as_ref()));
        assert!(events[2].name.is_none());
    }

    #[test]
    fn truncated_tail_is_discarded() {
        let mut buf = encode(1, libc::IN_MODIFY, 0, Some("a.txt"));
        let full = buf.len();
        buf.extend(encode(2, libc::IN_MODIFY, 0, Some("b.txt")));
        buf.truncate(full + 7); // mid-header

        let events = decode_events(&buf);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn classify_joins_name_onto_watched_path() {
        let reg = registry_with(1, "/tmp/t");
        let raw = RawEvent {
            wd: WatchDescriptor(1),
            mask: libc::IN_MODIFY,
            cookie: 0,
            name: Some("a.txt".into()),
        };

        let ev = classify(&raw, &reg).unwrap();
        assert_eq!(ev.kind, ChangeKind::Changed);
        assert_eq!(ev.entry, EntryKind::File);
        assert_eq!(ev.path, Path::new("/tmp/t/a.txt"));
    }

    #[test]
    fn classify_without_name_uses_watched_path() {
        let reg = registry_with(1, "/tmp/t/a.txt");
        let raw = RawEvent {
            wd: WatchDescriptor(1),
            mask: libc::IN_ATTRIB,
            cookie: 0,
            name: None,
        };

        let ev = classify(&raw, &reg).unwrap();
        assert_eq!(ev.kind, ChangeKind::ChangedAttribs);
        assert_eq!(ev.path, Path::new("/tmp/t/a.txt"));
    }

    #[test]
    fn classification_priority_is_create_delete_modify_attrib() {
        let reg = registry_with(1, "/tmp/t");
        let raw = RawEvent {
            wd: WatchDescriptor(1),
            mask: libc::IN_CREATE | libc::IN_MODIFY | libc::IN_ATTRIB,
            cookie: 0,
            name: Some("x".into()),
        };
        assert_eq!(classify(&raw, &reg).unwrap().kind, ChangeKind::Created);
    }

    #[test]
    fn stale_descriptor_and_foreign_masks_are_dropped() {
        let reg = registry_with(1, "/tmp/t");

        let stale = RawEvent {
            wd: WatchDescriptor(99),
            mask: libc::IN_MODIFY,
            cookie: 0,
            name: Some("a".into()),
        };
        assert!(classify(&stale, &reg).is_none());

        // A pure rename record matches none of the four classification bits.
        let moved = RawEvent {
            wd: WatchDescriptor(1),
            mask: libc::IN_MOVED_TO,
            cookie: 7,
            name: Some("a".into()),
        };
        assert!(classify(&moved, &reg).is_none());

        let ignored = RawEvent {
            wd: WatchDescriptor(1),
            mask: libc::IN_IGNORED,
            cookie: 0,
            name: None,
        };
        assert!(classify(&ignored, &reg).is_none());
    }

    #[test]
    fn isdir_flag_selects_dir_entry_kind() {
        let reg = registry_with(1, "/tmp/t");
        let raw = RawEvent {
            wd: WatchDescriptor(1),
            mask: libc::IN_CREATE | libc::IN_ISDIR,
            cookie: 0,
            name: Some("sub".into()),
        };
        let ev = classify(&raw, &reg).unwrap();
        assert_eq!(ev.entry, EntryKind::Dir);
        assert_eq!(ev.path, Path::new("/tmp/t/sub"));
    }
}
