//! Removing what the legacy uninstaller leaves behind
//!
//! Every step here is best-effort; only the bus device removal is reported
//! as an error, and even that does not fail the stage.

use super::{best_effort, remnant_absent};
use crate::tables::{
    LEGACY_BUS_DEVICE, LEGACY_INSTALL_DIR_VALUE, LEGACY_TOOLS_KEY, LEGACY_UNINSTALL_ENTRY,
};
use crate::OpsCtx;
use pvdrv_config::constants::UNINSTALL_KEY;
use pvdrv_errors::{Error, PlatformError};
use pvdrv_events::{AppEvent, CleanupEvent, EventEmitter};
use pvdrv_platform::RegKeyPath;
use pvdrv_types::{CleanupReport, CleanupStage};
use std::path::PathBuf;

const STAGE: CleanupStage = CleanupStage::UninstallLegacy;

/// Registry views to look in, 32-bit first on a 64-bit OS
fn views(ctx: &OpsCtx, path: &str) -> Vec<RegKeyPath> {
    if ctx.arch.is_64bit() {
        vec![RegKeyPath::wow64_32(path), RegKeyPath::native(path)]
    } else {
        vec![RegKeyPath::native(path)]
    }
}

async fn legacy_install_dir(ctx: &OpsCtx) -> Result<Option<PathBuf>, PlatformError> {
    for key in views(ctx, LEGACY_TOOLS_KEY) {
        let value = ctx
            .platform
            .registry()
            .get_value(&key, LEGACY_INSTALL_DIR_VALUE)
            .await?;
        if let Some(dir) = value.as_ref().and_then(|v| v.as_str()) {
            let dir = dir.trim();
            if !dir.is_empty() {
                return Ok(Some(PathBuf::from(dir)));
            }
        }
    }
    Ok(None)
}

pub(super) async fn uninstall_legacy(
    ctx: &OpsCtx,
    report: &mut CleanupReport,
) -> Result<(), Error> {
    let registry = ctx.platform.registry();

    // Read before the keys go away
    let install_dir = best_effort(
        ctx,
        report,
        STAGE,
        "read install directory",
        legacy_install_dir(ctx),
    )
    .await
    .flatten();

    for entry in views(ctx, UNINSTALL_KEY) {
        let entry = entry.join(LEGACY_UNINSTALL_ENTRY);
        let step = format!("delete {entry}");
        if best_effort(ctx, report, STAGE, &step, registry.delete_subkey_tree(&entry)).await
            == Some(false)
        {
            remnant_absent(ctx, "uninstall entry", entry.to_string());
        }
    }

    if let Some(dir) = install_dir {
        let step = format!("remove {}", dir.display());
        let removed = best_effort(
            ctx,
            report,
            STAGE,
            &step,
            ctx.platform
                .filesystem()
                .remove_dir_all(ctx.platform_context(), &dir),
        )
        .await;
        if removed == Some(false) {
            remnant_absent(ctx, "install directory", dir.display().to_string());
        }
    }

    match ctx
        .platform
        .devices()
        .remove_device(ctx.platform_context(), LEGACY_BUS_DEVICE)
        .await
    {
        Ok(true) => ctx.emit(AppEvent::Cleanup(CleanupEvent::DeviceRemoved {
            hardware_id: LEGACY_BUS_DEVICE.to_string(),
        })),
        Ok(false) => remnant_absent(ctx, "device", LEGACY_BUS_DEVICE),
        Err(err) => {
            ctx.emit_error(format!("failed to remove {LEGACY_BUS_DEVICE}: {err}"));
            report
                .warnings
                .push(format!("remove {LEGACY_BUS_DEVICE}: {err}"));
        }
    }

    Ok(())
}
