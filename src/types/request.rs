//! CloneRequest - everything one clone() call needs, with explicit defaults

use super::CloneError;
use crate::executor::strategy::{CopyStrategy, StreamCopy};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Default upper bound on leaf copies running at the same time
pub const DEFAULT_MAX_CONCURRENT_COPIES: usize = 64;

/// Largest accepted bound on concurrent leaf copies
pub const MAX_CONCURRENT_COPIES: usize = Semaphore::MAX_PERMITS;

/// Reject copy limits outside `1..=MAX_CONCURRENT_COPIES`
pub fn check_copy_limit(limit: usize) -> Result<(), CloneError> {
    if limit == 0 {
        return Err(CloneError::Config(
            "max_concurrent_copies must be at least 1".to_string(),
        ));
    }
    if limit > MAX_CONCURRENT_COPIES {
        return Err(CloneError::Config(format!(
            "max_concurrent_copies must be at most {}, got {}",
            MAX_CONCURRENT_COPIES, limit
        )));
    }
    Ok(())
}

/// A single clone: copy `source` into `destination_root` as `entry_name`.
///
/// Defaults:
/// - `entry_name`: final path segment of `source`
/// - `strategy`: [`StreamCopy`]
/// - `fail_fast`: `false` (siblings keep running when one fails)
/// - `max_concurrent_copies`: [`DEFAULT_MAX_CONCURRENT_COPIES`]
///
/// # Example
/// ```no_run
/// use treeclone::{AtomicCopy, CloneRequest};
///
/// let request = CloneRequest::new("/data/site", "/srv/www")
///     .entry_name("current")
///     .strategy(AtomicCopy);
/// # let _ = request;
/// ```
#[derive(Clone)]
pub struct CloneRequest {
    source: PathBuf,
    destination_root: PathBuf,
    entry_name: Option<OsString>,
    strategy: Arc<dyn CopyStrategy>,
    fail_fast: bool,
    max_concurrent_copies: usize,
}

impl CloneRequest {
    pub fn new(source: impl Into<PathBuf>, destination_root: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination_root: destination_root.into(),
            entry_name: None,
            strategy: Arc::new(StreamCopy),
            fail_fast: false,
            max_concurrent_copies: DEFAULT_MAX_CONCURRENT_COPIES,
        }
    }

    /// Name the source gets inside the destination root
    pub fn entry_name(mut self, name: impl Into<OsString>) -> Self {
        self.entry_name = Some(name.into());
        self
    }

    /// Per-file transfer used for every leaf copy
    pub fn strategy<S: CopyStrategy + 'static>(mut self, strategy: S) -> Self {
        self.strategy = Arc::new(strategy);
        self
    }

    /// Same as [`CloneRequest::strategy`] for an already shared strategy
    pub fn shared_strategy(mut self, strategy: Arc<dyn CopyStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Cancel the remaining siblings of a directory level as soon as one fails
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn max_concurrent_copies(mut self, limit: usize) -> Self {
        self.max_concurrent_copies = limit;
        self
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination_root(&self) -> &Path {
        &self.destination_root
    }

    pub fn copy_strategy(&self) -> Arc<dyn CopyStrategy> {
        Arc::clone(&self.strategy)
    }

    pub fn is_fail_fast(&self) -> bool {
        self.fail_fast
    }

    pub fn copy_limit(&self) -> usize {
        self.max_concurrent_copies
    }

    /// Resolve the entry name, falling back to the source's final segment.
    ///
    /// The name must be a single normal path component.
    pub fn resolved_entry_name(&self) -> Result<OsString, CloneError> {
        let name = match &self.entry_name {
            Some(name) => name.clone(),
            None => self
                .source
                .file_name()
                .map(OsStr::to_os_string)
                .ok_or_else(|| {
                    CloneError::Config(format!(
                        "Cannot derive an entry name from source {}",
                        self.source.display()
                    ))
                })?,
        };

        let mut components = Path::new(&name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(name),
            _ => Err(CloneError::Config(format!(
                "Entry name must be a single path segment: {:?}",
                name
            ))),
        }
    }

    /// Check request-level settings before touching the filesystem
    pub fn validate(&self) -> Result<(), CloneError> {
        check_copy_limit(self.max_concurrent_copies)?;
        self.resolved_entry_name().map(|_| ())
    }
}

impl fmt::Debug for CloneRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloneRequest")
            .field("source", &self.source)
            .field("destination_root", &self.destination_root)
            .field("entry_name", &self.entry_name)
            .field("strategy", &self.strategy.name())
            .field("fail_fast", &self.fail_fast)
            .field("max_concurrent_copies", &self.max_concurrent_copies)
            .finish()
    }
}
