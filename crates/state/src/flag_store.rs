//! The milestone ledger contract

use async_trait::async_trait;
use pvdrv_errors::Error;
use pvdrv_types::{Milestone, MilestoneStatus};

/// Durable mapping from milestone to "completed"
///
/// Implementations must make `set` idempotent and must never forget a
/// milestone once `set` has returned `Ok`.
#[async_trait]
pub trait FlagStore: Send + Sync {
    async fn is_set(&self, milestone: Milestone) -> Result<bool, Error>;

    /// Record `milestone` as completed. Setting it again keeps the first timestamp.
    async fn set(&self, milestone: Milestone) -> Result<(), Error>;

    /// Every milestone with its state, in declaration order
    async fn snapshot(&self) -> Result<Vec<MilestoneStatus>, Error>;
}
