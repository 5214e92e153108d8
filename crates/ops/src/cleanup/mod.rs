//! Legacy installation cleanup
//!
//! Five stages run in a fixed order, each gated by its own milestone. A
//! stage sets its milestone only after all of its side effects succeeded;
//! the first failing stage ends the run because later stages assume the
//! earlier ones are done.

mod boot_start;
mod filters;
mod legacy;
mod msis;
mod purge;

pub use filters::strip_filters;

use crate::OpsCtx;
use pvdrv_errors::{CleanupError, Error, PlatformError, UserFacingError};
use pvdrv_events::{AppEvent, CleanupEvent, EventEmitter, FailureContext};
use pvdrv_platform::RegKeyPath;
use pvdrv_types::{CleanupReport, CleanupStage, Workaround2k8};
use std::future::Future;
use std::time::Instant;

/// Remove every trace of the legacy tools, skipping stages already done.
///
/// `workaround_2k8` decides which service keys the purge stage keeps; `Auto`
/// enables the reduced list on Windows Server 2008.
///
/// # Errors
///
/// Returns the error of the first stage that fails. Its milestone and those
/// of later stages stay unset.
pub async fn system_clean(
    ctx: &OpsCtx,
    workaround_2k8: Workaround2k8,
) -> Result<CleanupReport, Error> {
    let start = Instant::now();
    ctx.emit_operation_started("clean");

    let mut report = CleanupReport::default();
    for stage in CleanupStage::SEQUENCE {
        if ctx.state.is_set(stage.milestone()).await? {
            ctx.emit(AppEvent::Cleanup(CleanupEvent::StageSkipped { stage }));
            report.skipped.push(stage);
            continue;
        }

        ctx.emit(AppEvent::Cleanup(CleanupEvent::StageStarted { stage }));
        let stage_start = Instant::now();

        let result = match stage {
            CleanupStage::RemoveFromFilters => filters::remove_from_filters(ctx).await,
            CleanupStage::DisableBootStart => boot_start::disable_boot_start(ctx).await,
            CleanupStage::UninstallMsis => msis::uninstall_msis(ctx, &mut report).await,
            CleanupStage::UninstallLegacy => legacy::uninstall_legacy(ctx, &mut report).await,
            CleanupStage::PurgeRemnants => {
                purge::purge_remnants(ctx, workaround_2k8, &mut report).await
            }
        };

        if let Err(err) = result {
            ctx.emit(AppEvent::Cleanup(CleanupEvent::StageFailed {
                stage,
                failure: FailureContext::from_error(&err),
            }));
            ctx.emit_operation_failed("clean", err.to_string());
            return Err(err);
        }

        ctx.state.set(stage.milestone()).await?;
        ctx.emit(AppEvent::Cleanup(CleanupEvent::StageCompleted {
            stage,
            duration_ms: u64::try_from(stage_start.elapsed().as_millis()).unwrap_or(u64::MAX),
        }));
        report.completed.push(stage);
    }

    report.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    ctx.emit_operation_completed("clean", true);
    Ok(report)
}

/// Await `step`; on failure emit a `BestEffortFailed` warning, note it in
/// the report and carry on with `None`.
pub(crate) async fn best_effort<T, E, F>(
    ctx: &OpsCtx,
    report: &mut CleanupReport,
    stage: CleanupStage,
    step: &str,
    op: F,
) -> Option<T>
where
    F: Future<Output = Result<T, E>>,
    E: UserFacingError,
{
    match op.await {
        Ok(value) => Some(value),
        Err(err) => {
            ctx.emit(AppEvent::Cleanup(CleanupEvent::BestEffortFailed {
                stage,
                step: step.to_string(),
                failure: FailureContext::from_error(&err),
            }));
            report
                .warnings
                .push(format!("{step}: {}", err.user_message()));
            None
        }
    }
}

fn registry_access(key: &RegKeyPath, err: &PlatformError) -> Error {
    CleanupError::RegistryAccess {
        key: key.to_string(),
        code: err.os_code().unwrap_or_default(),
        message: err.to_string(),
    }
    .into()
}

fn remnant_absent(ctx: &OpsCtx, kind: &str, name: impl Into<String>) {
    ctx.emit(AppEvent::Cleanup(CleanupEvent::RemnantAbsent {
        kind: kind.to_string(),
        name: name.into(),
    }));
}
