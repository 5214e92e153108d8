use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pvdrv_types::Milestone;

/// Milestone ledger events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StateEvent {
    /// Ledger opened
    Opened { location: String, milestones_set: usize },

    /// Milestone recorded after its step succeeded
    MilestoneSet {
        milestone: Milestone,
        set_at: DateTime<Utc>,
    },
}
