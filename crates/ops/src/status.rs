//! Milestone ledger listing

use crate::{OpsCtx, StatusReport};
use pvdrv_errors::Error;

/// Every milestone with its state and the time it was recorded
///
/// # Errors
///
/// Returns an error if the milestone ledger cannot be read.
pub async fn status(ctx: &OpsCtx) -> Result<StatusReport, Error> {
    Ok(StatusReport {
        milestones: ctx.state.snapshot().await?,
    })
}
