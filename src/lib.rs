//! # treeclone - Recursive directory cloning
//!
//! Copies a file or directory tree into a destination root under a chosen
//! name. Whatever already holds that name is removed first, then the tree is
//! copied with every directory level fanned out concurrently. Leaf files go
//! through a pluggable [`CopyStrategy`].

// Module declarations
pub mod commands;
pub mod config;
pub mod executor;
pub mod scanner;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use executor::{clean, clone, AtomicCopy, CopyStrategy, FnStrategy, StreamCopy};
pub use types::{CloneError, ClonePlan, CloneRequest, CloneStats, EntryKind};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
