//! Facts about the running system

use async_trait::async_trait;
use pvdrv_errors::PlatformError;
use pvdrv_types::{OsVersion, TargetArch};
use std::path::PathBuf;

#[async_trait]
pub trait SystemInfo: Send + Sync {
    /// Architecture of the operating system (not of this process)
    fn target_arch(&self) -> TargetArch;

    async fn os_version(&self) -> Result<OsVersion, PlatformError>;

    /// `%SystemRoot%\System32\drivers`
    fn drivers_dir(&self) -> PathBuf;
}
