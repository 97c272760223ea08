//! Filesystem inspection: classify paths and list directories

mod classify;

pub use classify::{classify, classify_entry, list_dir};
