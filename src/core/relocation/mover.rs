//! Filesystem move primitive.

use std::fs;
use std::io;
use std::path::Path;

/// Moves a single file; the destination is known to be free
pub trait FileMover: Send + Sync {
    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// `rename`, falling back to copy, size check and delete when source and
/// destination are on different filesystems.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdMover;

impl FileMover for StdMover {
    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(e) if needs_copy(&e) => copy_and_remove(from, to),
            Err(e) => Err(e),
        }
    }
}

/// Only a cross-device rename is retried as a copy. Every other error,
/// permission denied included, goes back to the caller untouched.
fn needs_copy(error: &io::Error) -> bool {
    error.kind() == io::ErrorKind::CrossesDevices
}

fn copy_and_remove(from: &Path, to: &Path) -> io::Result<()> {
    copy_and_remove_with(from, to, |from, to| fs::copy(from, to))
}

fn copy_and_remove_with<C>(from: &Path, to: &Path, copy: C) -> io::Result<()>
where
    C: FnOnce(&Path, &Path) -> io::Result<u64>,
{
    let source_size = fs::metadata(from)?.len();
    if let Err(e) = copy(from, to) {
        // A failed copy may have written part of the file
        let _ = fs::remove_file(to);
        return Err(e);
    }

    let dest_size = fs::metadata(to)?.len();
    if dest_size != source_size {
        // Incomplete copy: keep the source
        let _ = fs::remove_file(to);
        return Err(io::Error::other(format!(
            "copy verification failed: source {} bytes, destination {} bytes",
            source_size, dest_size
        )));
    }

    if let Err(e) = fs::remove_file(from) {
        // The source is still in place, so the copy must not linger
        let _ = fs::remove_file(to);
        return Err(e);
    }
    Ok(())
}
