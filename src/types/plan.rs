//! ClonePlan and CloneStats - per-call state of a clone

use super::EntryKind;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Decisions made before copying starts. Lives for one clone() call only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClonePlan {
    /// What the source turned out to be
    pub source_kind: EntryKind,

    /// Name of the entry inside the destination root
    pub entry_name: OsString,

    /// `destination_root/entry_name`
    pub destination_path: PathBuf,

    /// Directory handed to the copier: the new entry for a directory source,
    /// the destination root itself for a file source
    pub copy_target: PathBuf,
}

impl ClonePlan {
    pub fn new(source_kind: EntryKind, destination_root: &Path, entry_name: OsString) -> Self {
        let destination_path = destination_root.join(&entry_name);
        let copy_target = match source_kind {
            EntryKind::Directory => destination_path.clone(),
            EntryKind::File => destination_root.to_path_buf(),
        };
        Self {
            source_kind,
            entry_name,
            destination_path,
            copy_target,
        }
    }
}

/// Counters collected while a clone runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloneStats {
    /// Leaf files handed to the copy strategy and completed
    pub files_copied: u64,
    /// Directories created, including the top-level entry
    pub dirs_created: u64,
    /// Bytes reported by the copy strategy
    pub bytes_copied: u64,
    /// Whether a pre-existing entry with the same name was removed
    pub replaced_existing: bool,
}
