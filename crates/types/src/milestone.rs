//! Milestone ledger keys

use chrono::{DateTime, Utc};
use pvdrv_errors::StateError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named, persisted completion marker for one idempotent workflow step.
///
/// The set is closed. Milestones only ever move from unset to set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Milestone {
    XenBusInstalled,
    XenIfaceInstalled,
    XenVifInstalled,
    XenVbdInstalled,
    XenNetInstalled,
    RemovedFromFilters,
    BootStartDisabled,
    MSIsUninstalled,
    XenLegacyUninstalled,
    CleanedUp,
}

impl Milestone {
    /// Every milestone, in declaration order
    pub const ALL: [Milestone; 10] = [
        Self::XenBusInstalled,
        Self::XenIfaceInstalled,
        Self::XenVifInstalled,
        Self::XenVbdInstalled,
        Self::XenNetInstalled,
        Self::RemovedFromFilters,
        Self::BootStartDisabled,
        Self::MSIsUninstalled,
        Self::XenLegacyUninstalled,
        Self::CleanedUp,
    ];

    /// Stable key used by persistent stores
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::XenBusInstalled => "XenBusInstalled",
            Self::XenIfaceInstalled => "XenIfaceInstalled",
            Self::XenVifInstalled => "XenVifInstalled",
            Self::XenVbdInstalled => "XenVbdInstalled",
            Self::XenNetInstalled => "XenNetInstalled",
            Self::RemovedFromFilters => "RemovedFromFilters",
            Self::BootStartDisabled => "BootStartDisabled",
            Self::MSIsUninstalled => "MSIsUninstalled",
            Self::XenLegacyUninstalled => "XenLegacyUninstalled",
            Self::CleanedUp => "CleanedUp",
        }
    }
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Milestone {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.key() == s)
            .ok_or_else(|| StateError::UnknownMilestone {
                name: s.to_string(),
            })
    }
}

/// Snapshot of one milestone as seen by the `status` command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestoneStatus {
    pub milestone: Milestone,
    pub set: bool,
    pub set_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_through_from_str() {
        for milestone in Milestone::ALL {
            assert_eq!(milestone.key().parse::<Milestone>().unwrap(), milestone);
        }
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = "XenLiteInstalled".parse::<Milestone>().unwrap_err();
        assert!(matches!(err, StateError::UnknownMilestone { name } if name == "XenLiteInstalled"));
    }
}
