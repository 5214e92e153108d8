//! Portable providers built on `tokio`

pub mod filesystem;
pub mod process;

pub use filesystem::HostFilesystemOperations;
pub use process::HostProcessOperations;
