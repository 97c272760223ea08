//! Core type definitions for treeclone

mod entry;
mod error;
mod plan;
mod request;

pub use entry::EntryKind;
pub use error::CloneError;
pub use plan::{ClonePlan, CloneStats};
pub use request::{
    check_copy_limit, CloneRequest, DEFAULT_MAX_CONCURRENT_COPIES, MAX_CONCURRENT_COPIES,
};
