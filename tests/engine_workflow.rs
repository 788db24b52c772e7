//! Integration tests for the engine workflow.
//!
//! These tests run scan, resolve and undo end to end over real directory
//! trees:
//! - Exact grouping by content and extension
//! - Destination naming for colliding basenames
//! - Retry of transient move failures
//! - Undo restoring the original tree

use assert_fs::prelude::*;
use assert_fs::TempDir;
use doppelfiles::core::engine::Engine;
use doppelfiles::core::relocation::{FileMover, RelocationConfig, StdMover};
use doppelfiles::core::scanner::MediaCategory;
use doppelfiles::core::undo::UndoOutcome;
use predicates::prelude::*;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const AUDIO: [&str; 6] = ["mp3", "m4a", "wav", "flac", "aac", "ogg"];

fn engine(temp: &TempDir) -> Engine {
    Engine::builder()
        .log_dir(temp.child("logs").path())
        .exclude_dir(temp.child("dest").path())
        .build()
        .unwrap()
}

/// Every regular file under `root`, relative and sorted
fn tree(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    files.sort();
    files
}

#[test]
fn identical_audio_groups_by_extension() {
    let temp = TempDir::new().unwrap();
    let music = temp.child("music");
    music.child("song.mp3").write_binary(b"ID3 same audio").unwrap();
    music.child("copy.mp3").write_binary(b"ID3 same audio").unwrap();
    music.child("song.wav").write_binary(b"ID3 same audio").unwrap();

    let engine = engine(&temp);
    let outcome = engine
        .scan_and_group(music.path(), MediaCategory::Audio, AUDIO)
        .unwrap();

    assert_eq!(outcome.total_files, 3);
    assert_eq!(outcome.groups.len(), 1);
    let group = &outcome.groups[0];
    assert_eq!(group.members.len(), 2);
    assert!(group
        .paths()
        .iter()
        .all(|p| p.extension().is_some_and(|e| e == "mp3")));

    let dest = temp.child("dest");
    let report = engine.resolve(&outcome.groups, dest.path()).unwrap();

    // Scan order is by file name, so copy.mp3 comes first and is kept
    assert_eq!(report.relocated.len(), 1);
    music.child("copy.mp3").assert(predicate::path::exists());
    music.child("song.mp3").assert(predicate::path::missing());
    music.child("song.wav").assert(predicate::path::exists());
    dest.child("song.mp3").assert(predicate::path::exists());

    temp.child("logs/operations.log")
        .assert(predicate::str::contains("song.mp3|"));
}

#[test]
fn canonical_only_tree_has_no_groups() {
    let temp = TempDir::new().unwrap();
    let docs = temp.child("docs");
    docs.child("a.pdf").write_binary(b"first").unwrap();
    docs.child("b.pdf").write_binary(b"second").unwrap();
    docs.child("nested/c.pdf").write_binary(b"third").unwrap();

    let engine = engine(&temp);
    let outcome = engine
        .scan_and_group(docs.path(), MediaCategory::Document, ["pdf"])
        .unwrap();

    assert_eq!(outcome.total_files, 3);
    assert!(outcome.groups.is_empty());

    let report = engine.resolve(&outcome.groups, temp.child("dest").path()).unwrap();
    assert_eq!(report.moved_count(), 0);
    assert!(engine.operation_log().is_empty().unwrap());
}

#[test]
fn colliding_basenames_get_distinct_destinations() {
    let temp = TempDir::new().unwrap();
    let music = temp.child("music");
    for dir in ["a", "b", "c", "d"] {
        music
            .child(format!("{}/track.mp3", dir))
            .write_binary(b"same track")
            .unwrap();
    }

    let engine = engine(&temp);
    let outcome = engine
        .scan_and_group(music.path(), MediaCategory::Audio, AUDIO)
        .unwrap();
    let dest = temp.child("dest");
    let report = engine.resolve(&outcome.groups, dest.path()).unwrap();

    let mut targets: Vec<_> = report.relocated.iter().map(|m| m.to.clone()).collect();
    targets.sort();
    targets.dedup();
    assert_eq!(targets.len(), 3);

    dest.child("track.mp3").assert(predicate::path::exists());
    dest.child("track_1.mp3").assert(predicate::path::exists());
    dest.child("track_2.mp3").assert(predicate::path::exists());
    music.child("a/track.mp3").assert(predicate::path::exists());
}

#[test]
fn destination_is_not_rescanned() {
    let temp = TempDir::new().unwrap();
    let music = temp.child("music");
    music.child("a.mp3").write_binary(b"tune").unwrap();
    music.child("dest/old.mp3").write_binary(b"tune").unwrap();

    let engine = Engine::builder()
        .log_dir(temp.child("logs").path())
        .exclude_dir(music.child("dest").path())
        .build()
        .unwrap();
    let outcome = engine
        .scan_and_group(music.path(), MediaCategory::Audio, AUDIO)
        .unwrap();

    assert_eq!(outcome.total_files, 1);
    assert!(outcome.groups.is_empty());
}

#[test]
fn resolve_then_undo_restores_tree() {
    let temp = TempDir::new().unwrap();
    let music = temp.child("music");
    music.child("x/one.mp3").write_binary(b"alpha").unwrap();
    music.child("y/one.mp3").write_binary(b"alpha").unwrap();
    music.child("y/two.flac").write_binary(b"beta").unwrap();
    music.child("z/two.flac").write_binary(b"beta").unwrap();
    music.child("z/solo.ogg").write_binary(b"gamma").unwrap();
    let before = tree(music.path());

    let engine = engine(&temp);
    let outcome = engine
        .scan_and_group(music.path(), MediaCategory::Audio, AUDIO)
        .unwrap();
    assert_eq!(outcome.groups.len(), 2);

    let report = engine.resolve(&outcome.groups, temp.child("dest").path()).unwrap();
    assert_eq!(report.relocated.len(), 2);
    assert_ne!(tree(music.path()), before);

    let mut asked = None;
    let outcome = engine
        .undo(|count| {
            asked = Some(count);
            true
        })
        .unwrap();

    assert_eq!(asked, Some(2));
    let UndoOutcome::Completed(undo) = outcome else {
        panic!("expected undo to complete");
    };
    assert_eq!(undo.restored.len(), 2);
    assert!(undo.failures.is_empty());
    assert_eq!(tree(music.path()), before);
    temp.child("logs/operations.log")
        .assert(predicate::path::missing());

    // A second undo finds nothing
    assert!(matches!(
        engine.undo(|_| true).unwrap(),
        UndoOutcome::NothingToUndo
    ));
}

/// Fails with permission denied a fixed number of times, then moves
struct LockedThenFree {
    remaining: AtomicUsize,
    calls: Arc<AtomicUsize>,
}

impl FileMover for LockedThenFree {
    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let left = self.remaining.load(Ordering::SeqCst);
        if left > 0 {
            self.remaining.store(left - 1, Ordering::SeqCst);
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "file in use"));
        }
        StdMover.move_file(from, to)
    }
}

#[test]
fn transient_errors_are_retried() {
    let temp = TempDir::new().unwrap();
    let music = temp.child("music");
    music.child("a.mp3").write_binary(b"locked").unwrap();
    music.child("b.mp3").write_binary(b"locked").unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let engine = Engine::builder()
        .log_dir(temp.child("logs").path())
        .relocation_config(RelocationConfig {
            retry_delay: Duration::ZERO,
            ..Default::default()
        })
        .mover(Box::new(LockedThenFree {
            remaining: AtomicUsize::new(2),
            calls: Arc::clone(&calls),
        }))
        .build()
        .unwrap();

    let outcome = engine
        .scan_and_group(music.path(), MediaCategory::Audio, AUDIO)
        .unwrap();
    let dest = temp.child("dest");
    let report = engine.resolve(&outcome.groups, dest.path()).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(report.retries, 2);
    assert_eq!(report.relocated.len(), 1);
    assert!(report.quarantined.is_empty());
    assert!(report.errors.is_empty());
    assert_eq!(engine.operation_log().entries().unwrap().len(), 1);
    dest.child("problematic").assert(predicate::path::missing());
    temp.child("logs/errors.log").assert(predicate::path::missing());
}

#[test]
fn persistent_lock_sends_file_to_quarantine() {
    let temp = TempDir::new().unwrap();
    let music = temp.child("music");
    music.child("a.mp3").write_binary(b"stuck").unwrap();
    music.child("b.mp3").write_binary(b"stuck").unwrap();

    let engine = Engine::builder()
        .log_dir(temp.child("logs").path())
        .relocation_config(RelocationConfig {
            retry_delay: Duration::ZERO,
            ..Default::default()
        })
        .mover(Box::new(LockedThenFree {
            remaining: AtomicUsize::new(3),
            calls: Arc::new(AtomicUsize::new(0)),
        }))
        .build()
        .unwrap();

    let outcome = engine
        .scan_and_group(music.path(), MediaCategory::Audio, AUDIO)
        .unwrap();
    let dest = temp.child("dest");
    let report = engine.resolve(&outcome.groups, dest.path()).unwrap();

    assert!(report.relocated.is_empty());
    assert_eq!(report.quarantined.len(), 1);
    assert_eq!(report.errors.len(), 1);
    dest.child("problematic/b.mp3").assert(predicate::path::exists());
    temp.child("logs/errors.log")
        .assert(predicate::str::contains("b.mp3"));
}

/// Scans `music` holding `a.mp3` and a same-content file called `name`,
/// resolves, and checks that `name` was refused and left where it was
fn assert_unrecordable_duplicate_stays(name: &std::ffi::OsStr) {
    let temp = TempDir::new().unwrap();
    let music = temp.child("music");
    music.child("a.mp3").write_binary(b"same tune").unwrap();
    let odd = music.path().join(name);
    std::fs::write(&odd, b"same tune").unwrap();

    let engine = engine(&temp);
    let outcome = engine
        .scan_and_group(music.path(), MediaCategory::Audio, AUDIO)
        .unwrap();
    assert_eq!(outcome.groups.len(), 1);

    let dest = temp.child("dest");
    let report = engine.resolve(&outcome.groups, dest.path()).unwrap();

    assert!(report.relocated.is_empty());
    assert!(report.quarantined.is_empty());
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].path, odd);
    assert!(odd.exists());
    music.child("a.mp3").assert(predicate::path::exists());
    dest.child("problematic").assert(predicate::path::missing());
    temp.child("logs/operations.log")
        .assert(predicate::path::missing());
    temp.child("logs/errors.log")
        .assert(predicate::str::contains("not moved"));

    assert!(matches!(
        engine.undo(|_| true).unwrap(),
        UndoOutcome::NothingToUndo
    ));
}

#[test]
fn duplicate_named_with_separator_is_left_in_place() {
    assert_unrecordable_duplicate_stays(std::ffi::OsStr::new("b|c.mp3"));
}

#[test]
fn duplicate_named_with_line_break_is_left_in_place() {
    assert_unrecordable_duplicate_stays(std::ffi::OsStr::new("b\nc.mp3"));
}

#[cfg(unix)]
#[test]
fn duplicate_with_non_utf8_name_is_left_in_place() {
    use std::os::unix::ffi::OsStrExt;
    assert_unrecordable_duplicate_stays(std::ffi::OsStr::from_bytes(b"b\xff.mp3"));
}

#[test]
fn undo_keeps_entries_it_could_not_restore() {
    let temp = TempDir::new().unwrap();
    let music = temp.child("music");
    music.child("a.mp3").write_binary(b"tune").unwrap();
    music.child("b.mp3").write_binary(b"tune").unwrap();

    let engine = engine(&temp);
    let outcome = engine
        .scan_and_group(music.path(), MediaCategory::Audio, AUDIO)
        .unwrap();
    let dest = temp.child("dest");
    engine.resolve(&outcome.groups, dest.path()).unwrap();

    // Something else took the original name in the meantime
    music.child("b.mp3").write_binary(b"newer").unwrap();

    let UndoOutcome::Completed(undo) = engine.undo(|_| true).unwrap() else {
        panic!("expected undo to complete");
    };
    assert!(undo.restored.is_empty());
    assert_eq!(undo.retained, 1);
    dest.child("b.mp3").assert(predicate::path::exists());
    temp.child("logs/operations.log")
        .assert(predicate::str::contains("b.mp3|"));
    assert_eq!(engine.operation_log().entries().unwrap().len(), 1);
}
