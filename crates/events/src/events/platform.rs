//! Capability provider events

use serde::{Deserialize, Serialize};

/// External process events raised by the process launcher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum PlatformEvent {
    /// Process execution started
    ProcessStarted {
        /// Program being executed
        command: String,
        /// Command arguments
        args: Vec<String>,
    },

    /// Process exited (any exit code)
    ProcessCompleted {
        command: String,
        exit_code: i32,
        duration_ms: u64,
    },

    /// Process could not be spawned or awaited
    ProcessFailed {
        command: String,
        error_message: String,
        duration_ms: u64,
    },
}
