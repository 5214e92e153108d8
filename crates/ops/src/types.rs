//! Result types returned to the CLI

use pvdrv_types::{DeviceIdentity, MilestoneStatus};
use serde::Serialize;

/// A driver bound to an explicit hardware ID
#[derive(Clone, Debug, Serialize)]
pub struct HardwareIdBinding {
    pub driver: String,
    pub device: DeviceIdentity,
    pub hardware_id: String,
    pub reboot_required: bool,
}

/// Outcome of waiting on the install-pending gate
#[derive(Clone, Debug, Serialize)]
pub struct GateReport {
    /// Pending installs finished before the timeout
    pub cleared: bool,
    pub timeout: String,
}

/// Milestone ledger listing
#[derive(Clone, Debug, Serialize)]
pub struct StatusReport {
    pub milestones: Vec<MilestoneStatus>,
}

impl StatusReport {
    #[must_use]
    pub fn completed(&self) -> usize {
        self.milestones.iter().filter(|m| m.set).count()
    }
}
