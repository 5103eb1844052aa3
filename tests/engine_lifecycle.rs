// tests/engine_lifecycle.rs

//! Registry-level behaviour of the engine surface: idempotence laws,
//! duplicate handling, pre-flight failures and disposal. No watch loop runs
//! here; everything is driven synchronously.

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use watchrun::errors::WatchError;
use watchrun::watch::FileWatcher;

type TestResult = Result<(), Box<dyn Error>>;

fn tree(dirs: &[&str], files: &[&str]) -> Result<TempDir, Box<dyn Error>> {
    let root = TempDir::new()?;
    for d in dirs {
        fs::create_dir_all(root.path().join(d))?;
    }
    for f in files {
        fs::write(root.path().join(f), b"seed")?;
    }
    Ok(root)
}

#[test]
fn recursive_add_covers_every_directory_in_the_tree() -> TestResult {
    let root = tree(&["a/b", "a/c"], &["a/f.txt", "a/b/g.txt"])?;
    let mut watcher = FileWatcher::new()?;
    watcher.add_filepath(root.path(), true)?;

    let mut watched = watcher.watched_paths();
    watched.sort();
    let mut expected: Vec<PathBuf> = vec![
        root.path().to_path_buf(),
        root.path().join("a"),
        root.path().join("a/b"),
        root.path().join("a/c"),
    ];
    expected.sort();
    assert_eq!(watched, expected);
    Ok(())
}

#[test]
fn adding_a_file_under_a_watched_directory_is_a_noop() -> TestResult {
    let root = tree(&[], &["a.txt"])?;
    let mut watcher = FileWatcher::new()?;
    watcher.add_filepath(root.path(), false)?;
    let before = watcher.watch_count();

    watcher.add_filepath(root.path().join("a.txt"), false)?;
    assert_eq!(watcher.watch_count(), before);
    Ok(())
}

#[test]
fn adding_a_lone_file_watches_the_file_itself() -> TestResult {
    let root = tree(&[], &["a.txt"])?;
    let mut watcher = FileWatcher::new()?;
    watcher.add_filepath(root.path().join("a.txt"), false)?;

    assert_eq!(watcher.watched_paths(), vec![root.path().join("a.txt")]);
    Ok(())
}

#[test]
fn rebuild_is_idempotent() -> TestResult {
    let root = tree(&["a/b"], &[])?;
    let mut watcher = FileWatcher::new()?;

    watcher.add_filepath(root.path(), true)?;
    let first = watcher.watched_paths();

    watcher.add_filepath(root.path(), true)?;
    assert_eq!(watcher.watched_paths(), first);
    Ok(())
}

#[test]
fn remove_is_idempotent_and_round_trips() -> TestResult {
    let root = tree(&["sub/deep"], &[])?;
    let other = TempDir::new()?;

    let mut watcher = FileWatcher::new()?;
    watcher.add_filepath(other.path(), false)?;
    let prior = watcher.watched_paths();

    watcher.add_filepath(root.path(), true)?;
    assert_eq!(watcher.watch_count(), prior.len() + 3);

    watcher.remove_filepath(root.path());
    assert_eq!(watcher.watched_paths(), prior);

    // Removing again, or removing something never watched, changes nothing.
    watcher.remove_filepath(root.path());
    watcher.remove_filepath("/no/such/path");
    assert_eq!(watcher.watched_paths(), prior);
    Ok(())
}

#[test]
fn missing_target_fails_the_add_call() -> TestResult {
    let root = TempDir::new()?;
    let mut watcher = FileWatcher::new()?;

    let err = watcher
        .add_filepath(root.path().join("nope"), false)
        .err()
        .expect("missing target must fail");
    assert!(matches!(err, WatchError::TargetNotFound(_)));
    assert_eq!(watcher.watch_count(), 0);
    Ok(())
}

#[cfg(unix)]
#[test]
fn symlink_target_is_unsupported() -> TestResult {
    let root = tree(&[], &["a.txt"])?;
    let link = root.path().join("a.link");
    std::os::unix::fs::symlink(root.path().join("a.txt"), &link)?;

    let mut watcher = FileWatcher::new()?;
    let err = watcher.add_filepath(&link, false).err().expect("symlink must fail");
    assert!(matches!(err, WatchError::UnsupportedTarget(_)));
    Ok(())
}

#[test]
fn dispose_is_idempotent_and_blocks_further_use() -> TestResult {
    let root = tree(&["sub"], &[])?;
    let mut watcher = FileWatcher::new()?;
    watcher.add_filepath(root.path(), true)?;
    assert_eq!(watcher.watch_count(), 2);

    watcher.dispose();
    assert_eq!(watcher.watch_count(), 0);
    watcher.dispose();

    let err = watcher
        .add_filepath(root.path(), false)
        .err()
        .expect("add after dispose must fail");
    assert!(matches!(err, WatchError::Disposed));

    let err = watcher.run(|_| Ok(())).err().expect("run after dispose must fail");
    assert!(matches!(err, WatchError::Disposed));
    Ok(())
}
