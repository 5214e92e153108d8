//! Cleanup stage sequence

use crate::Milestone;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One stage of the legacy removal pipeline.
///
/// Declaration order is execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupStage {
    RemoveFromFilters,
    DisableBootStart,
    UninstallMsis,
    UninstallLegacy,
    PurgeRemnants,
}

impl CleanupStage {
    pub const SEQUENCE: [CleanupStage; 5] = [
        Self::RemoveFromFilters,
        Self::DisableBootStart,
        Self::UninstallMsis,
        Self::UninstallLegacy,
        Self::PurgeRemnants,
    ];

    /// Milestone that records completion of this stage
    #[must_use]
    pub fn milestone(self) -> Milestone {
        match self {
            Self::RemoveFromFilters => Milestone::RemovedFromFilters,
            Self::DisableBootStart => Milestone::BootStartDisabled,
            Self::UninstallMsis => Milestone::MSIsUninstalled,
            Self::UninstallLegacy => Milestone::XenLegacyUninstalled,
            Self::PurgeRemnants => Milestone::CleanedUp,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::RemoveFromFilters => "remove_from_filters",
            Self::DisableBootStart => "disable_boot_start",
            Self::UninstallMsis => "uninstall_msis",
            Self::UninstallLegacy => "uninstall_legacy",
            Self::PurgeRemnants => "purge_remnants",
        }
    }
}

impl fmt::Display for CleanupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_stage_has_its_own_milestone() {
        let milestones: HashSet<_> = CleanupStage::SEQUENCE
            .iter()
            .map(|s| s.milestone())
            .collect();
        assert_eq!(milestones.len(), CleanupStage::SEQUENCE.len());
    }

    #[test]
    fn sequence_matches_declaration_order() {
        let mut sorted = CleanupStage::SEQUENCE;
        sorted.sort();
        assert_eq!(sorted, CleanupStage::SEQUENCE);
    }
}
