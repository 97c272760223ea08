//! Path classification and directory listing

use crate::types::{CloneError, EntryKind};
use std::ffi::OsString;
use std::path::Path;
use tokio::fs;

/// Classify `path` as a file or a directory
///
/// Symlinks are followed. Anything that is not a directory (regular file,
/// fifo, device node) is reported as [`EntryKind::File`].
///
/// # Errors
/// * `CloneError::NotFound` if the path does not exist
/// * `CloneError::Io` for any other stat failure
pub async fn classify(path: &Path) -> Result<EntryKind, CloneError> {
    let metadata = fs::metadata(path)
        .await
        .map_err(|e| CloneError::lookup(path, e))?;
    Ok(EntryKind::from(&metadata))
}

/// Classify `path` without following a final symlink
///
/// A symlink is reported as [`EntryKind::File`] so that removal unlinks the
/// link itself and never descends into its target.
pub async fn classify_entry(path: &Path) -> Result<EntryKind, CloneError> {
    let metadata = fs::symlink_metadata(path)
        .await
        .map_err(|e| CloneError::lookup(path, e))?;
    if metadata.file_type().is_symlink() {
        return Ok(EntryKind::File);
    }
    Ok(EntryKind::from(&metadata))
}

/// List the names of the direct children of a directory
///
/// Names are sorted so that "first error" reporting over a level is stable.
pub async fn list_dir(path: &Path) -> Result<Vec<OsString>, CloneError> {
    let mut entries = fs::read_dir(path)
        .await
        .map_err(|e| CloneError::lookup(path, e))?;

    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| CloneError::io(path, e))?
    {
        names.push(entry.file_name());
    }
    names.sort();
    Ok(names)
}
