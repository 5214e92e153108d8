//! Driver store staging and PnP installs (SetupAPI / newdev / cfgmgr32)

use async_trait::async_trait;
use pvdrv_errors::PlatformError;
use pvdrv_types::{CopyPolicy, InstallFlags, WaitTimeout};
use std::path::Path;
use windows::core::{BOOL, PCWSTR};
use windows::Win32::Devices::DeviceAndDriverInstallation::{
    CMP_WaitNoPendingInstallEvents, DiInstallDriverW, SetupCopyOEMInfW,
    UpdateDriverForPlugAndPlayDevicesW, DIINSTALLDRIVER_FLAGS, DIIRFLAG_FORCE_INF,
    INSTALLFLAG_FORCE, INSTALLFLAG_NONINTERACTIVE, SPOST_PATH, SP_COPY_NEWER_ONLY, SP_COPY_STYLE,
    UPDATEDRIVERFORPLUGANDPLAYDEVICES_FLAGS,
};
use windows::Win32::Foundation::{GetLastError, WAIT_OBJECT_0, WAIT_TIMEOUT};

use super::{join_error, to_wide, win32_code};
use crate::core::PlatformContext;
use crate::driver_store::{DriverStoreOperations, InstallOutcome, WaitStatus};
use crate::os_error::{describe_os_error, os_call_failed};

pub struct WindowsDriverStoreOperations;

impl WindowsDriverStoreOperations {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsDriverStoreOperations {
    fn default() -> Self {
        Self::new()
    }
}

fn update_flags(flags: InstallFlags) -> UPDATEDRIVERFORPLUGANDPLAYDEVICES_FLAGS {
    let mut value = UPDATEDRIVERFORPLUGANDPLAYDEVICES_FLAGS(0);
    if flags.force {
        value |= INSTALLFLAG_FORCE;
    }
    if flags.non_interactive {
        value |= INSTALLFLAG_NONINTERACTIVE;
    }
    value
}

fn install_flags(flags: InstallFlags) -> DIINSTALLDRIVER_FLAGS {
    if flags.force {
        DIIRFLAG_FORCE_INF
    } else {
        DIINSTALLDRIVER_FLAGS(0)
    }
}

#[async_trait]
impl DriverStoreOperations for WindowsDriverStoreOperations {
    async fn stage_package(
        &self,
        _ctx: &PlatformContext,
        inf: &Path,
        inf_dir: &Path,
        policy: CopyPolicy,
    ) -> Result<(), PlatformError> {
        let target = inf.display().to_string();
        let inf_w = to_wide(inf);
        let dir_w = to_wide(inf_dir);
        let style = match policy {
            CopyPolicy::NewerOnly => SP_COPY_NEWER_ONLY,
            CopyPolicy::Overwrite => SP_COPY_STYLE(0),
        };

        tokio::task::spawn_blocking(move || unsafe {
            SetupCopyOEMInfW(
                PCWSTR(inf_w.as_ptr()),
                PCWSTR(dir_w.as_ptr()),
                SPOST_PATH,
                style,
                None,
                None,
                None,
            )
        })
        .await
        .map_err(|e| join_error("stage_package", &e))?
        .map_err(|e| os_call_failed("stage_package", target, win32_code(&e)))
    }

    async fn install_package_on_node(
        &self,
        _ctx: &PlatformContext,
        inf: &Path,
        flags: InstallFlags,
    ) -> Result<InstallOutcome, PlatformError> {
        let target = inf.display().to_string();
        let inf_w = to_wide(inf);
        let di_flags = install_flags(flags);

        let result = tokio::task::spawn_blocking(move || {
            let mut reboot = BOOL(0);
            unsafe { DiInstallDriverW(None, PCWSTR(inf_w.as_ptr()), di_flags, Some(&mut reboot)) }
                .map(|()| reboot.as_bool())
        })
        .await
        .map_err(|e| join_error("install_package_on_node", &e))?;

        result
            .map(|reboot_required| InstallOutcome { reboot_required })
            .map_err(|e| os_call_failed("install_package_on_node", target, win32_code(&e)))
    }

    async fn bind_package_to_hardware_id(
        &self,
        _ctx: &PlatformContext,
        hardware_id: &str,
        inf: &Path,
        flags: InstallFlags,
    ) -> Result<InstallOutcome, PlatformError> {
        let target = format!("{hardware_id} ({})", inf.display());
        let hwid_w = to_wide(hardware_id);
        let inf_w = to_wide(inf);
        let update = update_flags(flags);

        let result = tokio::task::spawn_blocking(move || {
            let mut reboot = BOOL(0);
            unsafe {
                UpdateDriverForPlugAndPlayDevicesW(
                    None,
                    PCWSTR(hwid_w.as_ptr()),
                    PCWSTR(inf_w.as_ptr()),
                    update,
                    Some(&mut reboot),
                )
            }
            .map(|()| reboot.as_bool())
        })
        .await
        .map_err(|e| join_error("bind_package_to_hardware_id", &e))?;

        result
            .map(|reboot_required| InstallOutcome { reboot_required })
            .map_err(|e| os_call_failed("bind_package_to_hardware_id", target, win32_code(&e)))
    }

    async fn wait_no_pending_installs(
        &self,
        _ctx: &PlatformContext,
        timeout: WaitTimeout,
    ) -> WaitStatus {
        let millis = timeout.as_millis();
        let outcome = tokio::task::spawn_blocking(move || {
            let status = unsafe { CMP_WaitNoPendingInstallEvents(millis) };
            if status == WAIT_OBJECT_0.0 {
                WaitStatus::Signaled
            } else if status == WAIT_TIMEOUT.0 {
                WaitStatus::TimedOut
            } else {
                let code = unsafe { GetLastError() }.0;
                WaitStatus::Failed {
                    code,
                    message: describe_os_error(code),
                }
            }
        })
        .await;

        outcome.unwrap_or_else(|e| WaitStatus::Failed {
            code: 0,
            message: e.to_string(),
        })
    }
}
