//! Install-pending gate

use crate::OpsCtx;
use pvdrv_errors::{Error, InstallError};
use pvdrv_events::{AppEvent, DriverEvent, EventEmitter};
use pvdrv_platform::WaitStatus;
use pvdrv_types::WaitTimeout;

/// Wait until the PnP manager has no device installs in flight.
///
/// Returns `true` once nothing is pending and `false` when `timeout`
/// elapsed first.
///
/// # Errors
///
/// Returns `InstallError::WaitPrimitive` if the wait call itself failed.
pub async fn block_until_no_drivers_installing(
    ctx: &OpsCtx,
    timeout: WaitTimeout,
) -> Result<bool, Error> {
    ctx.emit(AppEvent::Driver(DriverEvent::GateWaiting {
        timeout: timeout.to_string(),
    }));

    match ctx
        .platform
        .driver_store()
        .wait_no_pending_installs(ctx.platform_context(), timeout)
        .await
    {
        WaitStatus::Signaled => {
            ctx.emit(AppEvent::Driver(DriverEvent::GateCleared));
            Ok(true)
        }
        WaitStatus::TimedOut => {
            ctx.emit(AppEvent::Driver(DriverEvent::GateTimedOut {
                timeout: timeout.to_string(),
            }));
            Ok(false)
        }
        WaitStatus::Failed { code, message } => {
            Err(InstallError::WaitPrimitive { code, message }.into())
        }
    }
}

/// Run the gate with the configured timeout and fail when it does not clear
pub(crate) async fn ensure_no_installs_pending(ctx: &OpsCtx, operation: &str) -> Result<(), Error> {
    if block_until_no_drivers_installing(ctx, ctx.config.gate_timeout()).await? {
        Ok(())
    } else {
        Err(InstallError::InstallsPending {
            operation: operation.to_string(),
        }
        .into())
    }
}

/// Wait on the gate and report the outcome
///
/// # Errors
///
/// Returns `InstallError::WaitPrimitive` if the wait call itself failed.
pub async fn wait(ctx: &OpsCtx, timeout: WaitTimeout) -> Result<crate::GateReport, Error> {
    let cleared = block_until_no_drivers_installing(ctx, timeout).await?;
    Ok(crate::GateReport {
        cleared,
        timeout: timeout.to_string(),
    })
}
