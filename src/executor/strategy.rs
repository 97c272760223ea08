//! Per-file copy strategies
//!
//! The copier hands every leaf file to a [`CopyStrategy`]. [`StreamCopy`] is
//! the default; [`AtomicCopy`] writes through a temporary `.part` file and
//! renames it into place; [`FnStrategy`] wraps an async closure.

use crate::types::CloneError;
use async_trait::async_trait;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Transfer buffer size (128KB)
const BUFFER_SIZE: usize = 128 * 1024;

/// Copies the bytes of one file to one destination file path
///
/// `dst` is the full destination file path; its parent directory already
/// exists. Returns the number of bytes transferred.
#[async_trait]
pub trait CopyStrategy: Send + Sync {
    async fn copy_file(&self, src: &Path, dst: &Path) -> Result<u64, CloneError>;

    /// Short name used in logs
    fn name(&self) -> &'static str {
        "custom"
    }
}

/// Sequential read into a created-or-truncated destination.
///
/// A partially written destination is left in place on failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamCopy;

#[async_trait]
impl CopyStrategy for StreamCopy {
    async fn copy_file(&self, src: &Path, dst: &Path) -> Result<u64, CloneError> {
        let mut reader = File::open(src).await.map_err(|e| CloneError::io(src, e))?;
        let mut writer = File::create(dst).await.map_err(|e| CloneError::io(dst, e))?;

        let total = transfer(&mut reader, src, &mut writer, dst).await?;
        writer.flush().await.map_err(|e| CloneError::io(dst, e))?;
        Ok(total)
    }

    fn name(&self) -> &'static str {
        "stream"
    }
}

/// Write-then-rename copy.
///
/// 1. Stream into a hidden `.part` file next to the destination
/// 2. Sync it to disk
/// 3. Rename it over the destination
///
/// On failure the `.part` file is removed and the destination is untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtomicCopy;

#[async_trait]
impl CopyStrategy for AtomicCopy {
    async fn copy_file(&self, src: &Path, dst: &Path) -> Result<u64, CloneError> {
        let part_path = part_path_for(dst);

        let result = async {
            let mut reader = File::open(src).await.map_err(|e| CloneError::io(src, e))?;
            let mut part_file = File::create(&part_path)
                .await
                .map_err(|e| CloneError::io(&part_path, e))?;

            let total = transfer(&mut reader, src, &mut part_file, &part_path).await?;
            part_file
                .sync_all()
                .await
                .map_err(|e| CloneError::io(&part_path, e))?;
            drop(part_file);

            fs::rename(&part_path, dst)
                .await
                .map_err(|e| CloneError::io(dst, e))?;
            Ok::<u64, CloneError>(total)
        }
        .await;

        if result.is_err() {
            discard_part(&part_path).await;
        }
        result
    }

    fn name(&self) -> &'static str {
        "atomic"
    }
}

/// Strategy backed by an async closure taking `(src, dst)`
///
/// # Example
/// ```no_run
/// use treeclone::executor::strategy::FnStrategy;
///
/// let strategy = FnStrategy::new(|src, dst| async move {
///     tokio::fs::copy(&src, &dst)
///         .await
///         .map_err(|e| treeclone::CloneError::io(dst, e))
/// });
/// # let _ = strategy;
/// ```
pub struct FnStrategy<F> {
    f: F,
}

impl<F, Fut> FnStrategy<F>
where
    F: Fn(PathBuf, PathBuf) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<u64, CloneError>> + Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> CopyStrategy for FnStrategy<F>
where
    F: Fn(PathBuf, PathBuf) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<u64, CloneError>> + Send + 'static,
{
    async fn copy_file(&self, src: &Path, dst: &Path) -> Result<u64, CloneError> {
        (self.f)(src.to_path_buf(), dst.to_path_buf()).await
    }
}

/// Pump every byte from `reader` into `writer`, attributing errors to the side that failed
async fn transfer<R, W>(
    reader: &mut R,
    src: &Path,
    writer: &mut W,
    dst: &Path,
) -> Result<u64, CloneError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .await
            .map_err(|e| CloneError::io(src, e))?;
        if bytes_read == 0 {
            break;
        }

        writer
            .write_all(&buffer[..bytes_read])
            .await
            .map_err(|e| CloneError::io(dst, e))?;
        total_bytes += bytes_read as u64;
    }

    Ok(total_bytes)
}

/// `dir/name` -> `dir/.name.part`
fn part_path_for(dst: &Path) -> PathBuf {
    let mut part_name = std::ffi::OsString::from(".");
    if let Some(name) = dst.file_name() {
        part_name.push(name);
    }
    part_name.push(".part");
    dst.with_file_name(part_name)
}

async fn discard_part(part_path: &Path) {
    match fs::remove_file(part_path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!(
            "Failed to remove partial file {}: {}",
            part_path.display(),
            e
        ),
    }
}
