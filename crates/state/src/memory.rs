//! Process-local milestone ledger

use crate::FlagStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pvdrv_errors::Error;
use pvdrv_types::{Milestone, MilestoneStatus};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Ledger kept in memory; lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    flags: RwLock<BTreeMap<Milestone, DateTime<Utc>>>,
}

impl MemoryFlagStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `milestones` already recorded
    #[must_use]
    pub fn with_set(milestones: impl IntoIterator<Item = Milestone>) -> Self {
        let now = Utc::now();
        Self {
            flags: RwLock::new(milestones.into_iter().map(|m| (m, now)).collect()),
        }
    }

    /// Recorded milestones in declaration order
    pub async fn set_milestones(&self) -> Vec<Milestone> {
        self.flags.read().await.keys().copied().collect()
    }
}

#[async_trait]
impl FlagStore for MemoryFlagStore {
    async fn is_set(&self, milestone: Milestone) -> Result<bool, Error> {
        Ok(self.flags.read().await.contains_key(&milestone))
    }

    async fn set(&self, milestone: Milestone) -> Result<(), Error> {
        self.flags
            .write()
            .await
            .entry(milestone)
            .or_insert_with(Utc::now);
        Ok(())
    }

    async fn snapshot(&self) -> Result<Vec<MilestoneStatus>, Error> {
        let flags = self.flags.read().await;
        Ok(Milestone::ALL
            .iter()
            .map(|milestone| MilestoneStatus {
                milestone: *milestone,
                set: flags.contains_key(milestone),
                set_at: flags.get(milestone).copied(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_is_idempotent_and_keeps_first_timestamp() {
        let store = MemoryFlagStore::new();
        store.set(Milestone::CleanedUp).await.unwrap();
        let first = store.snapshot().await.unwrap();
        store.set(Milestone::CleanedUp).await.unwrap();
        let second = store.snapshot().await.unwrap();

        let at = |s: &[MilestoneStatus]| {
            s.iter()
                .find(|m| m.milestone == Milestone::CleanedUp)
                .and_then(|m| m.set_at)
        };
        assert_eq!(at(&first), at(&second));
        assert_eq!(store.set_milestones().await, vec![Milestone::CleanedUp]);
    }
}
