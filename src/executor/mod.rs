//! Executor module for clone operations
//!
//! - [`clean`]: recursive removal of an existing path
//! - [`copy::Copier`]: concurrent recursive copy into a prepared destination
//! - [`strategy`]: pluggable per-file transfer
//! - [`clone()`]: the orchestration tying them together

pub mod clean;
pub mod clone;
pub mod copy;
pub mod strategy;

pub use clean::clean;
pub use clone::clone;
pub use copy::Copier;
pub use strategy::{AtomicCopy, CopyStrategy, FnStrategy, StreamCopy};
