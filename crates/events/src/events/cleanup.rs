//! Legacy cleanup pipeline events

use serde::{Deserialize, Serialize};

use super::FailureContext;
use pvdrv_types::CleanupStage;

/// Events emitted while removing a legacy installation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CleanupEvent {
    /// Cleanup stage started
    StageStarted { stage: CleanupStage },

    /// Cleanup stage finished and its milestone was recorded
    StageCompleted { stage: CleanupStage, duration_ms: u64 },

    /// Cleanup stage skipped because its milestone is already set
    StageSkipped { stage: CleanupStage },

    /// Cleanup stage failed; later stages do not run
    StageFailed {
        stage: CleanupStage,
        failure: FailureContext,
    },

    /// Legacy filter entries were removed from a class node value
    FiltersRewritten {
        class_key: String,
        value: String,
        removed: Vec<String>,
    },

    /// A legacy service start type was changed to manual
    ServiceStartChanged { service: String, previous: u32 },

    /// Display name resolved to an installed product code
    ProductResolved {
        display_name: String,
        product_code: String,
    },

    /// Uninstall attempt started (1-based)
    UninstallAttempt {
        product_code: String,
        attempt: u32,
        max_attempts: u32,
    },

    /// Uninstall attempt failed and another one is scheduled
    UninstallRetryScheduled {
        product_code: String,
        attempt: u32,
        exit_code: i32,
        delay_secs: u64,
    },

    /// Uninstall succeeded
    UninstallSucceeded {
        product_code: String,
        exit_code: i32,
        reboot_required: bool,
    },

    /// A best-effort sub-step failed and was skipped
    BestEffortFailed {
        stage: CleanupStage,
        step: String,
        failure: FailureContext,
    },

    /// A device matching a legacy hardware ID was removed
    DeviceRemoved { hardware_id: String },

    /// A remnant that was scheduled for removal was not present
    RemnantAbsent { kind: String, name: String },
}
