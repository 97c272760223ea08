//! Command entry points used by the binary

pub mod clone;
