#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! High-level operations orchestration for pvdrv
//!
//! This crate sits between the CLI and the capability providers. It owns the
//! two resumable flows (driver install and legacy cleanup), the
//! install-pending gate and the uninstall retry policy. Every irreversible
//! step is gated by a milestone in the injected [`pvdrv_state::FlagStore`].

mod cleanup;
mod context;
mod drivers;
mod gate;
mod inf;
mod msi;
mod retry;
mod status;
pub mod tables;
mod types;

pub use cleanup::{strip_filters, system_clean};
pub use context::{OpsContextBuilder, OpsCtx};
pub use drivers::{
    install_all, install_driver, install_on_hardware_id, package_inf, stage_all,
    stage_to_driver_store,
};
pub use gate::{block_until_no_drivers_installing, wait};
pub use inf::find_hardware_id;
pub use msi::resolve_product_code;
pub use retry::{uninstall_product, RetryBudget, UninstallOutcome};
pub use status::status;
pub use types::{GateReport, HardwareIdBinding, StatusReport};

use pvdrv_errors::Error;
use pvdrv_types::{CleanupReport, InstallReport, StageReport};

/// Operation result that can be serialized for CLI output
#[derive(Clone, Debug, serde::Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OperationResult {
    /// Driver install report
    InstallReport(InstallReport),
    /// Driver store staging report
    StageReport(StageReport),
    /// Driver bound to an explicit hardware ID
    HardwareIdBinding(HardwareIdBinding),
    /// Legacy cleanup report
    CleanupReport(CleanupReport),
    /// Install-pending gate outcome
    Gate(GateReport),
    /// Milestone ledger
    Status(StatusReport),
}

impl OperationResult {
    /// Convert to JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| {
            pvdrv_errors::OpsError::SerializationError {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Check if this is a success result
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self {
            OperationResult::InstallReport(report) => report.is_complete(),
            OperationResult::StageReport(report) => report.failed.is_empty(),
            OperationResult::Gate(gate) => gate.cleared,
            OperationResult::HardwareIdBinding(_)
            | OperationResult::CleanupReport(_)
            | OperationResult::Status(_) => true,
        }
    }
}
