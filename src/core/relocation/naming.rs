//! Collision-free destination names.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// First free path for `file_name` inside `dir`.
///
/// Tries `<dir>/<name>`, then `<stem>_1<.ext>`, `<stem>_2<.ext>`, ... until
/// nothing exists at the candidate path. Never returns an occupied path.
pub fn unique_destination(dir: &Path, file_name: &OsStr) -> PathBuf {
    let candidate = dir.join(file_name);
    if !occupied(&candidate) {
        return candidate;
    }

    let as_path = Path::new(file_name);
    let stem = as_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = as_path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1u64..)
        .map(|n| dir.join(format!("{}_{}{}", stem, n, extension)))
        .find(|candidate| !occupied(candidate))
        .unwrap_or(candidate)
}

/// Broken symlinks count as occupied
fn occupied(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}
