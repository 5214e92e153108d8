//! Capability provider implementations

pub mod host;
pub mod memory;

#[cfg(windows)]
pub mod windows;
