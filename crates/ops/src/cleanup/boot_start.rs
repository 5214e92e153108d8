//! Demoting legacy services and clearing the emulated device unplug request

use super::remnant_absent;
use crate::tables::{BOOT_START_SERVICES, MANUAL_START, UNPLUG_VALUES};
use crate::OpsCtx;
use pvdrv_config::constants::{SERVICES_KEY, UNPLUG_KEY};
use pvdrv_errors::Error;
use pvdrv_events::{AppEvent, CleanupEvent, EventEmitter};
use pvdrv_platform::{RegKeyPath, RegValue};

pub(super) async fn disable_boot_start(ctx: &OpsCtx) -> Result<(), Error> {
    let registry = ctx.platform.registry();
    let services = RegKeyPath::native(SERVICES_KEY);

    for service in BOOT_START_SERVICES {
        let key = services.join(service);
        let Some(start) = registry.get_value(&key, "Start").await? else {
            remnant_absent(ctx, "service", service);
            continue;
        };

        let previous = start.as_dword();
        if previous == Some(MANUAL_START) {
            continue;
        }
        registry
            .set_value(&key, "Start", &RegValue::Dword(MANUAL_START))
            .await?;
        ctx.emit(AppEvent::Cleanup(CleanupEvent::ServiceStartChanged {
            service: service.to_string(),
            previous: previous.unwrap_or_default(),
        }));
    }

    let unplug = RegKeyPath::native(UNPLUG_KEY);
    for value in UNPLUG_VALUES {
        if !registry.delete_value(&unplug, value).await? {
            remnant_absent(ctx, "unplug value", value);
        }
    }
    Ok(())
}
