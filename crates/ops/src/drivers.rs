//! Driver staging and installation
//!
//! Packages live at `{root}/{driver}/{x64|x86}/{driver}.inf`. Installs are
//! gated by the driver's milestone; staging is not, since the driver store
//! already ignores a package that is not newer than the staged one.

use crate::gate::ensure_no_installs_pending;
use crate::tables::{self, DriverDescriptor, DRIVERS};
use crate::{HardwareIdBinding, OpsCtx};
use pvdrv_errors::{Error, InstallError, OpsError, PlatformError};
use pvdrv_events::{AppEvent, DriverEvent, EventEmitter, FailureContext};
use pvdrv_platform::InstallOutcome;
use pvdrv_types::{
    CopyPolicy, DeviceIdentity, DriverFailure, InstallFlags, InstallReport, StageReport,
    TargetArch,
};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Location of a driver's INF file inside the package tree
#[must_use]
pub fn package_inf(root: &Path, driver: &str, arch: TargetArch) -> PathBuf {
    root.join(driver)
        .join(arch.package_dir())
        .join(format!("{driver}.inf"))
}

fn lookup(driver: &str) -> Result<&'static DriverDescriptor, Error> {
    tables::driver(driver).ok_or_else(|| {
        OpsError::UnknownDriver {
            driver: driver.to_string(),
        }
        .into()
    })
}

async fn existing_package(ctx: &OpsCtx, root: &Path, driver: &str) -> Result<PathBuf, Error> {
    let inf = package_inf(root, driver, ctx.arch);
    if ctx
        .platform
        .filesystem()
        .exists(ctx.platform_context(), &inf)
        .await
    {
        Ok(inf)
    } else {
        Err(InstallError::MissingPackage {
            path: inf.display().to_string(),
        }
        .into())
    }
}

fn install_failed(driver: &str, err: &PlatformError) -> Error {
    InstallError::DriverInstallFailed {
        driver: driver.to_string(),
        code: err.os_code().unwrap_or_default(),
        message: err.to_string(),
    }
    .into()
}

/// Install every driver whose milestone is unset, in install order.
///
/// A failing driver is recorded in the report and the flow moves on to the
/// next one; its milestone stays unset so the next run retries it.
///
/// # Errors
///
/// Returns an error if the milestone ledger cannot be read or written, or
/// `InstallError::WaitPrimitive` if the install-pending wait itself fails.
pub async fn install_all(ctx: &OpsCtx, root: &Path) -> Result<InstallReport, Error> {
    let start = Instant::now();
    ctx.emit_operation_started("install");

    let mut report = InstallReport::default();
    for descriptor in &DRIVERS {
        if ctx.state.is_set(descriptor.milestone).await? {
            ctx.emit(AppEvent::Driver(DriverEvent::InstallSkipped {
                driver: descriptor.name.to_string(),
                milestone: descriptor.milestone.key().to_string(),
            }));
            report.skipped.push(descriptor.name.to_string());
            continue;
        }

        match install_package(ctx, root, descriptor).await {
            Ok(outcome) => {
                ctx.state.set(descriptor.milestone).await?;
                report.reboot_required |= outcome.reboot_required;
                report.installed.push(descriptor.name.to_string());
            }
            // A broken wait primitive fails every later driver the same way
            Err(err @ Error::Install(InstallError::WaitPrimitive { .. })) => {
                ctx.emit_operation_failed("install", err.to_string());
                return Err(err);
            }
            Err(err) => {
                ctx.emit(AppEvent::Driver(DriverEvent::InstallFailed {
                    driver: descriptor.name.to_string(),
                    failure: FailureContext::from_error(&err),
                }));
                report.failed.push(DriverFailure {
                    driver: descriptor.name.to_string(),
                    error: err.to_string(),
                });
            }
        }
    }

    report.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    ctx.emit_operation_completed("install", report.is_complete());
    Ok(report)
}

/// Install a single driver, honouring its milestone.
///
/// Returns `None` when the milestone was already set.
///
/// # Errors
///
/// Returns an error for an unknown driver name, a missing package, a gate
/// that does not clear, or a failed install.
pub async fn install_driver(
    ctx: &OpsCtx,
    root: &Path,
    driver: &str,
) -> Result<Option<InstallOutcome>, Error> {
    let descriptor = lookup(driver)?;
    if ctx.state.is_set(descriptor.milestone).await? {
        ctx.emit(AppEvent::Driver(DriverEvent::InstallSkipped {
            driver: descriptor.name.to_string(),
            milestone: descriptor.milestone.key().to_string(),
        }));
        return Ok(None);
    }

    let outcome = install_package(ctx, root, descriptor).await?;
    ctx.state.set(descriptor.milestone).await?;
    Ok(Some(outcome))
}

async fn install_package(
    ctx: &OpsCtx,
    root: &Path,
    descriptor: &DriverDescriptor,
) -> Result<InstallOutcome, Error> {
    ensure_no_installs_pending(ctx, &format!("installing {}", descriptor.name)).await?;
    let inf = existing_package(ctx, root, descriptor.name).await?;

    ctx.emit(AppEvent::Driver(DriverEvent::InstallStarted {
        driver: descriptor.name.to_string(),
        inf: inf.display().to_string(),
    }));

    let outcome = ctx
        .platform
        .driver_store()
        .install_package_on_node(ctx.platform_context(), &inf, InstallFlags::default())
        .await
        .map_err(|e| install_failed(descriptor.name, &e))?;

    ctx.emit(AppEvent::Driver(DriverEvent::InstallCompleted {
        driver: descriptor.name.to_string(),
        reboot_required: outcome.reboot_required,
    }));
    Ok(outcome)
}

/// Bind a driver to the hardware ID its package declares for `device`.
///
/// Used when the device is not yet enumerated, so the install has to name
/// the exact ID.
///
/// # Errors
///
/// Returns `InstallError::HardwareIdNotFound` when the install section has
/// no ID for `device`, and the usual package and install errors otherwise.
pub async fn install_on_hardware_id(
    ctx: &OpsCtx,
    device: DeviceIdentity,
    root: &Path,
    driver: &str,
) -> Result<HardwareIdBinding, Error> {
    let descriptor = lookup(driver)?;
    let inf = existing_package(ctx, root, descriptor.name).await?;

    let text = ctx
        .platform
        .filesystem()
        .read_to_string(ctx.platform_context(), &inf)
        .await
        .map_err(|e| InstallError::PackageUnreadable {
            path: inf.display().to_string(),
            message: e.to_string(),
        })?;

    let hardware_id = crate::inf::find_hardware_id(&text, ctx.arch, device)?.ok_or_else(|| {
        InstallError::HardwareIdNotFound {
            driver: descriptor.name.to_string(),
            device: device.to_string(),
            inf: inf.display().to_string(),
        }
    })?;

    ctx.emit(AppEvent::Driver(DriverEvent::HardwareIdResolved {
        driver: descriptor.name.to_string(),
        device: device.to_string(),
        hardware_id: hardware_id.clone(),
    }));

    ensure_no_installs_pending(ctx, &format!("binding {}", descriptor.name)).await?;

    ctx.emit(AppEvent::Driver(DriverEvent::InstallStarted {
        driver: descriptor.name.to_string(),
        inf: inf.display().to_string(),
    }));
    let outcome = ctx
        .platform
        .driver_store()
        .bind_package_to_hardware_id(
            ctx.platform_context(),
            &hardware_id,
            &inf,
            InstallFlags::default(),
        )
        .await
        .map_err(|e| install_failed(descriptor.name, &e))?;
    ctx.emit(AppEvent::Driver(DriverEvent::InstallCompleted {
        driver: descriptor.name.to_string(),
        reboot_required: outcome.reboot_required,
    }));

    Ok(HardwareIdBinding {
        driver: descriptor.name.to_string(),
        device,
        hardware_id,
        reboot_required: outcome.reboot_required,
    })
}

/// Copy a driver package into the driver store without binding it.
///
/// An OS failure is reported through a `StageFailed` event carrying the OS
/// code and yields `false`; it is not raised.
///
/// # Errors
///
/// Returns `InstallError::MissingPackage` when the INF file does not exist.
pub async fn stage_to_driver_store(
    ctx: &OpsCtx,
    root: &Path,
    driver: &str,
    policy: CopyPolicy,
) -> Result<bool, Error> {
    let inf = existing_package(ctx, root, driver).await?;
    let inf_dir = inf.parent().unwrap_or(root);

    match ctx
        .platform
        .driver_store()
        .stage_package(ctx.platform_context(), &inf, inf_dir, policy)
        .await
    {
        Ok(()) => {
            ctx.emit(AppEvent::Driver(DriverEvent::StageCompleted {
                driver: driver.to_string(),
                inf: inf.display().to_string(),
            }));
            Ok(true)
        }
        Err(err) => {
            ctx.emit(AppEvent::Driver(DriverEvent::StageFailed {
                driver: driver.to_string(),
                inf: inf.display().to_string(),
                code: err.os_code().unwrap_or_default(),
                message: err.to_string(),
            }));
            Ok(false)
        }
    }
}

/// Stage every driver package in install order.
///
/// # Errors
///
/// Returns an error if the install-pending gate does not clear.
pub async fn stage_all(ctx: &OpsCtx, root: &Path) -> Result<StageReport, Error> {
    let start = Instant::now();
    ctx.emit_operation_started("stage");
    ensure_no_installs_pending(ctx, "staging").await?;

    let mut report = StageReport::default();
    for descriptor in &DRIVERS {
        match stage_to_driver_store(ctx, root, descriptor.name, ctx.config.install.copy_policy)
            .await
        {
            Ok(true) => report.staged.push(descriptor.name.to_string()),
            Ok(false) => report.failed.push(descriptor.name.to_string()),
            Err(Error::Install(err)) => {
                ctx.emit_warning_with_context(err.to_string(), descriptor.name);
                report.failed.push(descriptor.name.to_string());
            }
            Err(err) => return Err(err),
        }
    }

    report.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    ctx.emit_operation_completed("stage", report.failed.is_empty());
    Ok(report)
}
