//! Recursive removal of an existing path

use crate::scanner::{classify_entry, list_dir};
use crate::types::{CloneError, EntryKind};
use futures::future::{join_all, BoxFuture, FutureExt};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Remove `path` and everything beneath it
///
/// Directories are emptied by cleaning all children concurrently, then the
/// directory itself is removed. Files (and symlinks, which are never followed)
/// are unlinked.
///
/// # Errors
/// * `CloneError::NotFound` if `path` (or a child) vanished before classification
/// * `CloneError::Io` for any unlink/rmdir/readdir failure
///
/// When several children fail, the first one in name order is returned after
/// every sibling has settled.
pub async fn clean(path: impl AsRef<Path>) -> Result<(), CloneError> {
    clean_tree(path.as_ref().to_path_buf()).await
}

fn clean_tree(path: PathBuf) -> BoxFuture<'static, Result<(), CloneError>> {
    async move {
        match classify_entry(&path).await? {
            EntryKind::Directory => {
                let children = list_dir(&path).await?;
                let pending = children
                    .into_iter()
                    .map(|name| clean_tree(path.join(name)));
                join_all(pending)
                    .await
                    .into_iter()
                    .collect::<Result<Vec<()>, CloneError>>()?;

                fs::remove_dir(&path)
                    .await
                    .map_err(|e| CloneError::io(&path, e))?;
                log::trace!("Removed directory {}", path.display());
            }
            EntryKind::File => {
                fs::remove_file(&path)
                    .await
                    .map_err(|e| CloneError::io(&path, e))?;
                log::trace!("Removed file {}", path.display());
            }
        }
        Ok(())
    }
    .boxed()
}
