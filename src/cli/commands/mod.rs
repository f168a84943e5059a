//! Command implementations.

pub mod completions;
pub mod init;
pub mod serve;
pub mod version;
