//! Purging leftover devices, service keys and driver binaries

use super::{best_effort, remnant_absent};
use crate::tables::{purge_services, DRIVER_BINARIES, PURGE_HARDWARE_IDS};
use crate::OpsCtx;
use pvdrv_config::constants::SERVICES_KEY;
use pvdrv_errors::Error;
use pvdrv_events::{AppEvent, CleanupEvent, EventEmitter};
use pvdrv_platform::RegKeyPath;
use pvdrv_types::{CleanupReport, CleanupStage, Workaround2k8};

pub(super) async fn purge_remnants(
    ctx: &OpsCtx,
    workaround_2k8: Workaround2k8,
    report: &mut CleanupReport,
) -> Result<(), Error> {
    let os = ctx.platform.system().os_version().await?;
    let workaround = workaround_2k8.resolve(os);
    if workaround {
        ctx.emit_debug(format!(
            "OS version {os}: keeping bus and filter services for the reinstall"
        ));
    }

    let devices = ctx.platform.devices();
    for hardware_id in PURGE_HARDWARE_IDS {
        if devices
            .remove_device(ctx.platform_context(), hardware_id)
            .await?
        {
            ctx.emit(AppEvent::Cleanup(CleanupEvent::DeviceRemoved {
                hardware_id: hardware_id.to_string(),
            }));
        } else {
            remnant_absent(ctx, "device", hardware_id);
        }
    }

    let services = RegKeyPath::native(SERVICES_KEY);
    for service in purge_services(workaround) {
        if !ctx
            .platform
            .registry()
            .delete_subkey_tree(&services.join(service))
            .await?
        {
            remnant_absent(ctx, "service", *service);
        }
    }

    let drivers_dir = ctx.platform.system().drivers_dir();
    for name in DRIVER_BINARIES {
        let path = drivers_dir.join(format!("{name}.sys"));
        let step = format!("delete {}", path.display());
        let removed = best_effort(
            ctx,
            report,
            CleanupStage::PurgeRemnants,
            &step,
            ctx.platform
                .filesystem()
                .remove_file(ctx.platform_context(), &path),
        )
        .await;
        if removed == Some(false) {
            remnant_absent(ctx, "driver binary", path.display().to_string());
        }
    }

    Ok(())
}
