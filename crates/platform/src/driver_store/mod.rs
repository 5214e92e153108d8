//! Driver store and Plug and Play install operations

use async_trait::async_trait;
use pvdrv_errors::PlatformError;
use pvdrv_types::{CopyPolicy, InstallFlags, WaitTimeout};
use std::path::Path;

use crate::core::PlatformContext;

/// Result of a successful driver install or bind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallOutcome {
    pub reboot_required: bool,
}

/// Outcome of waiting for in-flight device installs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitStatus {
    /// No installs pending
    Signaled,
    TimedOut,
    /// The wait itself failed
    Failed { code: u32, message: String },
}

/// Trait for driver store and PnP install operations
#[async_trait]
pub trait DriverStoreOperations: Send + Sync {
    /// Copy a driver package into the driver store without binding it
    async fn stage_package(
        &self,
        ctx: &PlatformContext,
        inf: &Path,
        inf_dir: &Path,
        policy: CopyPolicy,
    ) -> Result<(), PlatformError>;

    /// Install a package onto the device nodes it matches
    async fn install_package_on_node(
        &self,
        ctx: &PlatformContext,
        inf: &Path,
        flags: InstallFlags,
    ) -> Result<InstallOutcome, PlatformError>;

    /// Bind a package to every device presenting `hardware_id`
    async fn bind_package_to_hardware_id(
        &self,
        ctx: &PlatformContext,
        hardware_id: &str,
        inf: &Path,
        flags: InstallFlags,
    ) -> Result<InstallOutcome, PlatformError>;

    /// Block until no device installs are pending, or the timeout elapses
    async fn wait_no_pending_installs(&self, ctx: &PlatformContext, timeout: WaitTimeout)
        -> WaitStatus;
}
