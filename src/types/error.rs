//! Error types for treeclone

use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error types for clone and clean operations
#[derive(Debug, Error)]
pub enum CloneError {
    /// Path was absent while classifying it or listing the destination root
    #[error("Path not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Any read/write/mkdir/unlink/rmdir failure
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Invalid request or configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Async runtime could not be started
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl CloneError {
    /// Wrap an IO failure that happened while operating on `path`.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CloneError::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a lookup failure (stat or readdir): a missing path becomes `NotFound`.
    pub fn lookup(path: &Path, source: io::Error) -> Self {
        if source.kind() == ErrorKind::NotFound {
            CloneError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            CloneError::io(path, source)
        }
    }

    /// Check if this error reports a missing path
    pub fn is_not_found(&self) -> bool {
        matches!(self, CloneError::NotFound { .. })
    }

    /// Check if this error is an IO failure
    pub fn is_io_error(&self) -> bool {
        matches!(self, CloneError::Io { .. })
    }

    /// Check if this error is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, CloneError::Config(_))
    }

    /// Path the error refers to, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            CloneError::NotFound { path } | CloneError::Io { path, .. } => Some(path),
            CloneError::Config(_) | CloneError::Runtime(_) => None,
        }
    }
}
