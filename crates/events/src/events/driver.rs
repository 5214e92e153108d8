//! Driver staging, install gate and install events

use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Events emitted by the driver orchestrator and the install-pending gate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DriverEvent {
    /// Waiting for in-flight device installs to drain
    GateWaiting {
        /// Rendered timeout (`infinite` or `<n>s`)
        timeout: String,
    },

    /// No device installs pending
    GateCleared,

    /// The gate timed out while installs were still pending
    GateTimedOut { timeout: String },

    /// Package staging into the driver store finished
    StageCompleted { driver: String, inf: String },

    /// Package staging failed; the OS code is kept for diagnostics
    StageFailed {
        driver: String,
        inf: String,
        code: u32,
        message: String,
    },

    /// Driver install started
    InstallStarted { driver: String, inf: String },

    /// Driver install completed
    InstallCompleted {
        driver: String,
        reboot_required: bool,
    },

    /// Driver skipped because its milestone is already set
    InstallSkipped { driver: String, milestone: String },

    /// Driver install failed; the flow continues with the next driver
    InstallFailed {
        driver: String,
        failure: FailureContext,
    },

    /// Hardware ID recovered from a package install section
    HardwareIdResolved {
        driver: String,
        device: String,
        hardware_id: String,
    },
}
