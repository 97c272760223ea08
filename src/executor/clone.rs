//! Clone orchestration: classify, reconcile the destination, then copy

use crate::executor::clean::clean;
use crate::executor::copy::Copier;
use crate::scanner::{classify, classify_entry, list_dir};
use crate::types::{CloneError, ClonePlan, CloneRequest, CloneStats, EntryKind};
use std::path::Path;
use tokio::fs;

/// Clone `request.source()` into `request.destination_root()`
///
/// 1. Classify the source
/// 2. List the destination root (must already exist)
/// 3. Directory source: clean any entry with the same name, then create it fresh
/// 4. File source: remove any entry with the same name
/// 5. Copy the source into the prepared target
///
/// Any failure aborts the clone. Nothing is rolled back: entries written
/// before the failure stay in place.
///
/// # Example
/// ```no_run
/// use treeclone::CloneRequest;
///
/// # async fn run() -> Result<(), treeclone::CloneError> {
/// let stats = treeclone::clone(&CloneRequest::new("/a", "/out")).await?;
/// println!("{} files copied", stats.files_copied);
/// # Ok(())
/// # }
/// ```
pub async fn clone(request: &CloneRequest) -> Result<CloneStats, CloneError> {
    request.validate()?;
    let entry_name = request.resolved_entry_name()?;
    let source = request.source();
    let destination_root = request.destination_root();

    let source_kind = classify(source).await?;
    let existing = list_dir(destination_root).await?;
    let plan = ClonePlan::new(source_kind, destination_root, entry_name);
    check_overlap(source, destination_root, &plan).await?;

    let replaced_existing = existing.iter().any(|name| *name == plan.entry_name);
    log::debug!(
        "Cloning {} {} -> {} (existing entry: {})",
        plan.source_kind,
        source.display(),
        plan.destination_path.display(),
        replaced_existing
    );

    match plan.source_kind {
        EntryKind::Directory => {
            if replaced_existing {
                clean(&plan.destination_path).await?;
            }
            fs::create_dir(&plan.destination_path)
                .await
                .map_err(|e| CloneError::io(&plan.destination_path, e))?;
        }
        EntryKind::File => {
            if replaced_existing {
                remove_conflicting_entry(&plan.destination_path).await?;
            }
        }
    }

    let copier = Copier::new(request.copy_strategy(), plan.entry_name.clone())
        .fail_fast(request.is_fail_fast())
        .max_concurrent_copies(request.copy_limit());
    copier.copy(source, &plan.copy_target).await?;

    let mut stats = copier.stats();
    if plan.source_kind.is_dir() {
        stats.dirs_created += 1;
    }
    stats.replaced_existing = replaced_existing;
    Ok(stats)
}

/// Remove the entry a file source is about to replace.
///
/// A plain unlink handles files and symlinks; a directory in the way is cleaned.
async fn remove_conflicting_entry(path: &Path) -> Result<(), CloneError> {
    match classify_entry(path).await? {
        EntryKind::File => fs::remove_file(path)
            .await
            .map_err(|e| CloneError::io(path, e)),
        EntryKind::Directory => clean(path).await,
    }
}

/// Refuse clones that would delete their own source or copy a tree into itself
async fn check_overlap(
    source: &Path,
    destination_root: &Path,
    plan: &ClonePlan,
) -> Result<(), CloneError> {
    let source = fs::canonicalize(source)
        .await
        .map_err(|e| CloneError::lookup(source, e))?;
    let destination = fs::canonicalize(destination_root)
        .await
        .map_err(|e| CloneError::lookup(destination_root, e))?
        .join(&plan.entry_name);

    if source.starts_with(&destination) {
        return Err(CloneError::Config(format!(
            "Destination {} would replace the source {}",
            destination.display(),
            source.display()
        )));
    }
    if plan.source_kind.is_dir() && destination.starts_with(&source) {
        return Err(CloneError::Config(format!(
            "Destination {} lies inside the source directory {}",
            destination.display(),
            source.display()
        )));
    }
    Ok(())
}
