//! Snapshot / Compaction
//!
//! Bounds the growth of append logs by writing the full reconstructed
//! state to a fresh file.
//!
//! ## Files
//! - `{path}.0`: snapshot written by [`Storage::snapshot`]; the source log
//!   is never touched
//! - `{path}.compact`: temporary file used by in-place compaction and by
//!   json backend writes, renamed over `{path}` once synced
//! - `{path}.bak`: previous log, kept when `archive_on_compact` is set

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{DocStoreError, Result};
use crate::storage::Storage;

const SNAPSHOT_SUFFIX: &str = ".0";
const COMPACT_SUFFIX: &str = ".compact";
const ARCHIVE_SUFFIX: &str = ".bak";

/// `{path}.0`
pub fn snapshot_path(path: &Path) -> PathBuf {
    with_suffix(path, SNAPSHOT_SUFFIX)
}

/// `{path}.bak`
pub fn archive_path(path: &Path) -> PathBuf {
    with_suffix(path, ARCHIVE_SUFFIX)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Read the full state of `storage` and snapshot it
///
/// Returns the snapshot path, or `None` when the storage holds no data
/// yet (nothing is written in that case).
pub fn compact<S: Storage + ?Sized>(storage: &mut S) -> Result<Option<PathBuf>> {
    if !storage.supports_snapshot() {
        return Err(DocStoreError::Unsupported("snapshot"));
    }

    let state = match storage.read()? {
        Some(state) => state,
        None => return Ok(None),
    };

    storage.snapshot(&state)?;
    Ok(storage.path().map(snapshot_path))
}

/// Create or truncate `path`, write `parts` in order, then flush and sync
pub(crate) fn write_snapshot_file(path: &Path, parts: &[&[u8]]) -> Result<()> {
    let mut file = File::create(path)?;
    for part in parts {
        file.write_all(part)?;
    }
    file.flush()?;
    file.sync_all()?;
    Ok(())
}

/// Replace the log at `path` with `contents`
///
/// The new content is synced in a sibling file first and then renamed
/// over `path`, so a crash leaves either the old or the new log.
pub(crate) fn replace_log(path: &Path, contents: &[u8], archive: bool) -> Result<()> {
    let staging = with_suffix(path, COMPACT_SUFFIX);
    write_snapshot_file(&staging, &[contents])?;

    if archive {
        let archived = archive_path(path);
        fs::copy(path, &archived)?;
        debug!(path = %archived.display(), "archived log before compaction");
    }

    fs::rename(&staging, path)?;
    Ok(())
}
