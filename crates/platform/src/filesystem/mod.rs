//! Filesystem operations

use async_trait::async_trait;
use pvdrv_errors::PlatformError;
use std::path::Path;

use crate::core::PlatformContext;

/// Trait for filesystem operations
#[async_trait]
pub trait FilesystemOperations: Send + Sync {
    /// Check if a path exists
    async fn exists(&self, ctx: &PlatformContext, path: &Path) -> bool;

    async fn read_to_string(&self, ctx: &PlatformContext, path: &Path)
        -> Result<String, PlatformError>;

    /// Remove a single file; `false` when it did not exist
    async fn remove_file(&self, ctx: &PlatformContext, path: &Path) -> Result<bool, PlatformError>;

    /// Remove directory and all contents; `false` when it did not exist
    async fn remove_dir_all(&self, ctx: &PlatformContext, path: &Path)
        -> Result<bool, PlatformError>;
}
