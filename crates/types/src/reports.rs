//! Report type definitions for operations

use crate::CleanupStage;
use serde::{Deserialize, Serialize};

/// Result of the driver install/update flow
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InstallReport {
    /// Drivers installed during this run
    pub installed: Vec<String>,
    /// Drivers whose milestone was already set
    pub skipped: Vec<String>,
    /// Drivers that failed, with the error message
    pub failed: Vec<DriverFailure>,
    /// Any install asked for a reboot before the driver binds
    pub reboot_required: bool,
    /// Total execution time
    pub duration_ms: u64,
}

impl InstallReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A driver that could not be installed
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriverFailure {
    pub driver: String,
    pub error: String,
}

/// Result of staging packages into the driver store
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StageReport {
    pub staged: Vec<String>,
    pub failed: Vec<String>,
    pub duration_ms: u64,
}

/// Result of the legacy cleanup flow
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Stages executed during this run
    pub completed: Vec<CleanupStage>,
    /// Stages whose milestone was already set
    pub skipped: Vec<CleanupStage>,
    /// Product codes removed by the MSI stage
    pub products_removed: Vec<String>,
    /// Best-effort steps that failed and were passed over
    pub warnings: Vec<String>,
    pub reboot_required: bool,
    pub duration_ms: u64,
}
