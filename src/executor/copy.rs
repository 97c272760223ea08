//! Concurrent recursive tree copy
//!
//! Every child of a directory level is processed concurrently. Subdirectories
//! are created before anything is copied into them; files go straight to the
//! configured [`CopyStrategy`].

use crate::executor::strategy::CopyStrategy;
use crate::scanner::{classify, list_dir};
use crate::types::{
    CloneError, CloneStats, EntryKind, DEFAULT_MAX_CONCURRENT_COPIES, MAX_CONCURRENT_COPIES,
};
use futures::future::{join_all, try_join_all, BoxFuture, FutureExt};
use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Semaphore;

/// Walks a source tree and materializes it under a destination directory
pub struct Copier {
    strategy: Arc<dyn CopyStrategy>,
    entry_name: OsString,
    fail_fast: bool,
    permits: Semaphore,
    files_copied: AtomicU64,
    dirs_created: AtomicU64,
    bytes_copied: AtomicU64,
}

impl Copier {
    /// `entry_name` names the destination file when the top-level source is a file
    pub fn new(strategy: Arc<dyn CopyStrategy>, entry_name: impl Into<OsString>) -> Self {
        Self {
            strategy,
            entry_name: entry_name.into(),
            fail_fast: false,
            permits: Semaphore::new(DEFAULT_MAX_CONCURRENT_COPIES),
            files_copied: AtomicU64::new(0),
            dirs_created: AtomicU64::new(0),
            bytes_copied: AtomicU64::new(0),
        }
    }

    /// Drop the in-flight siblings of a level as soon as one of them fails
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Bound the number of strategy calls running at once, clamped to
    /// `1..=MAX_CONCURRENT_COPIES`
    pub fn max_concurrent_copies(mut self, limit: usize) -> Self {
        self.permits = Semaphore::new(limit.clamp(1, MAX_CONCURRENT_COPIES));
        self
    }

    /// Materialize `src` under `dst`
    ///
    /// * directory `src`: `dst` is the existing directory receiving its children
    /// * file `src`: `dst` is the directory receiving `dst/entry_name`
    pub async fn copy(&self, src: &Path, dst: &Path) -> Result<(), CloneError> {
        match classify(src).await? {
            EntryKind::File => {
                self.copy_leaf(src.to_path_buf(), dst.join(&self.entry_name))
                    .await
            }
            EntryKind::Directory => {
                self.copy_children(src.to_path_buf(), dst.to_path_buf())
                    .await
            }
        }
    }

    /// Snapshot of the counters collected so far
    pub fn stats(&self) -> CloneStats {
        CloneStats {
            files_copied: self.files_copied.load(Ordering::Relaxed),
            dirs_created: self.dirs_created.load(Ordering::Relaxed),
            bytes_copied: self.bytes_copied.load(Ordering::Relaxed),
            replaced_existing: false,
        }
    }

    fn copy_children(&self, src: PathBuf, dst: PathBuf) -> BoxFuture<'_, Result<(), CloneError>> {
        async move {
            let names = list_dir(&src).await?;
            let children = names
                .into_iter()
                .map(|name| self.copy_child(src.join(&name), dst.join(&name)));
            self.settle(children).await
        }
        .boxed()
    }

    async fn copy_child(&self, src: PathBuf, dst: PathBuf) -> Result<(), CloneError> {
        match classify(&src).await? {
            EntryKind::Directory => {
                fs::create_dir(&dst)
                    .await
                    .map_err(|e| CloneError::io(&dst, e))?;
                self.dirs_created.fetch_add(1, Ordering::Relaxed);
                log::trace!("Created directory {}", dst.display());
                self.copy_children(src, dst).await
            }
            EntryKind::File => self.copy_leaf(src, dst).await,
        }
    }

    async fn copy_leaf(&self, src: PathBuf, dst: PathBuf) -> Result<(), CloneError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| CloneError::Runtime("copy limiter was closed".to_string()))?;

        log::trace!(
            "Copying {} -> {} ({})",
            src.display(),
            dst.display(),
            self.strategy.name()
        );
        let bytes = self.strategy.copy_file(&src, &dst).await?;

        self.files_copied.fetch_add(1, Ordering::Relaxed);
        self.bytes_copied.fetch_add(bytes, Ordering::Relaxed);
        Ok(())
    }

    /// Wait for one directory level.
    ///
    /// Default: every child runs to completion, then the first error in name
    /// order is returned. Fail-fast: the first error wins and the remaining
    /// siblings are dropped.
    async fn settle<I, F>(&self, children: I) -> Result<(), CloneError>
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = Result<(), CloneError>>,
    {
        if self.fail_fast {
            try_join_all(children).await?;
        } else {
            join_all(children)
                .await
                .into_iter()
                .collect::<Result<Vec<()>, CloneError>>()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::strategy::{FnStrategy, StreamCopy};
    use std::io::{Error as IoError, ErrorKind};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tempfile::TempDir;

    fn stream_copier(entry_name: &str) -> Copier {
        Copier::new(Arc::new(StreamCopy), entry_name)
    }

    #[tokio::test]
    async fn test_copy_directory_children_into_existing_dir() {
        let temp = TempDir::new().expect("create tempdir");
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        std::fs::create_dir_all(src.join("sub/deeper")).expect("create src dirs");
        std::fs::create_dir_all(src.join("empty")).expect("create empty dir");
        std::fs::write(src.join("x.txt"), b"hi").expect("write x");
        std::fs::write(src.join("sub/y.txt"), b"bye").expect("write y");
        std::fs::write(src.join("sub/deeper/z.txt"), b"zzz").expect("write z");
        std::fs::create_dir(&dst).expect("create dst");

        let copier = stream_copier("src");
        copier.copy(&src, &dst).await.expect("copy tree");

        assert_eq!(std::fs::read(dst.join("x.txt")).unwrap(), b"hi");
        assert_eq!(std::fs::read(dst.join("sub/y.txt")).unwrap(), b"bye");
        assert_eq!(std::fs::read(dst.join("sub/deeper/z.txt")).unwrap(), b"zzz");
        assert!(dst.join("empty").is_dir());

        let stats = copier.stats();
        assert_eq!(stats.files_copied, 3);
        assert_eq!(stats.dirs_created, 3);
        assert_eq!(stats.bytes_copied, 8);
    }

    #[tokio::test]
    async fn test_copy_file_uses_entry_name() {
        let temp = TempDir::new().expect("create tempdir");
        let src = temp.path().join("f.txt");
        let dst = temp.path().join("out");
        std::fs::write(&src, b"z").expect("write src");
        std::fs::create_dir(&dst).expect("create dst");

        stream_copier("renamed.txt")
            .copy(&src, &dst)
            .await
            .expect("copy file");

        assert_eq!(std::fs::read(dst.join("renamed.txt")).unwrap(), b"z");
        assert!(!dst.join("f.txt").exists());
    }

    #[tokio::test]
    async fn test_copy_missing_source_is_not_found() {
        let temp = TempDir::new().expect("create tempdir");
        let err = stream_copier("x")
            .copy(&temp.path().join("absent"), temp.path())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_copy_into_existing_subdirectory_fails() {
        let temp = TempDir::new().expect("create tempdir");
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        std::fs::create_dir_all(src.join("sub")).expect("create src sub");
        std::fs::create_dir_all(dst.join("sub")).expect("create dst sub");

        let err = stream_copier("src").copy(&src, &dst).await.unwrap_err();

        assert!(err.is_io_error());
        assert_eq!(err.path(), Some(dst.join("sub").as_path()));
    }

    #[tokio::test]
    async fn test_failure_does_not_cancel_siblings_by_default() {
        let temp = TempDir::new().expect("create tempdir");
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        std::fs::create_dir_all(&src).expect("create src");
        std::fs::create_dir_all(&dst).expect("create dst");
        for name in ["a.txt", "b.txt", "c.txt", "d.txt"] {
            std::fs::write(src.join(name), name.as_bytes()).expect("write src file");
        }

        let completed = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&completed);
        let strategy = FnStrategy::new(move |src: PathBuf, dst: PathBuf| {
            let seen = Arc::clone(&seen);
            async move {
                if src.ends_with("a.txt") {
                    return Err(CloneError::io(
                        dst,
                        IoError::new(ErrorKind::Other, "injected failure"),
                    ));
                }
                tokio::task::yield_now().await;
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(0)
            }
        });

        let err = Copier::new(Arc::new(strategy), "src")
            .copy(&src, &dst)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("injected failure"));
        assert_eq!(completed.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fail_fast_drops_slow_siblings() {
        let temp = TempDir::new().expect("create tempdir");
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        std::fs::create_dir_all(&src).expect("create src");
        std::fs::create_dir_all(&dst).expect("create dst");
        for name in ["a.txt", "b.txt", "c.txt", "d.txt"] {
            std::fs::write(src.join(name), name.as_bytes()).expect("write src file");
        }

        let completed = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&completed);
        let strategy = FnStrategy::new(move |src: PathBuf, dst: PathBuf| {
            let seen = Arc::clone(&seen);
            async move {
                if src.ends_with("a.txt") {
                    return Err(CloneError::io(
                        dst,
                        IoError::new(ErrorKind::Other, "injected failure"),
                    ));
                }
                tokio::time::sleep(Duration::from_millis(200)).await;
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(0)
            }
        });

        let err = Copier::new(Arc::new(strategy), "src")
            .fail_fast(true)
            .copy(&src, &dst)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("injected failure"));
        assert_eq!(completed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_oversized_copy_limit_is_clamped() {
        let temp = TempDir::new().expect("create tempdir");
        let src = temp.path().join("f.txt");
        let dst = temp.path().join("out");
        std::fs::write(&src, b"data").expect("write src");
        std::fs::create_dir(&dst).expect("create dst");

        let copier = stream_copier("f.txt").max_concurrent_copies(usize::MAX);
        copier.copy(&src, &dst).await.expect("copy file");

        assert_eq!(copier.stats().files_copied, 1);
        assert_eq!(std::fs::read(dst.join("f.txt")).unwrap(), b"data");
    }

    #[tokio::test]
    async fn test_copy_limit_bounds_concurrent_strategy_calls() {
        let temp = TempDir::new().expect("create tempdir");
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        std::fs::create_dir_all(src.join("nested")).expect("create src");
        std::fs::create_dir_all(&dst).expect("create dst");
        for i in 0..8 {
            std::fs::write(src.join(format!("f{}.txt", i)), b"x").expect("write file");
            std::fs::write(src.join(format!("nested/g{}.txt", i)), b"y").expect("write file");
        }

        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (running_c, peak_c) = (Arc::clone(&running), Arc::clone(&peak));
        let strategy = FnStrategy::new(move |src: PathBuf, dst: PathBuf| {
            let running = Arc::clone(&running_c);
            let peak = Arc::clone(&peak_c);
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::task::yield_now().await;
                let bytes = StreamCopy.copy_file(&src, &dst).await;
                running.fetch_sub(1, Ordering::SeqCst);
                bytes
            }
        });

        let copier = Copier::new(Arc::new(strategy), "src").max_concurrent_copies(2);
        copier.copy(&src, &dst).await.expect("copy tree");

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(copier.stats().files_copied, 16);
        assert_eq!(std::fs::read(dst.join("nested/g7.txt")).unwrap(), b"y");
    }
}
