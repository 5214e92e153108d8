//! SQLite-backed milestone ledger

use crate::{queries, FlagStore};
use async_trait::async_trait;
use chrono::Utc;
use pvdrv_errors::Error;
use pvdrv_events::{AppEvent, EventEmitter, EventSender, StateEvent};
use pvdrv_types::{Milestone, MilestoneStatus};
use sqlx::{Pool, Sqlite};
use std::collections::HashMap;
use std::path::Path;

/// Milestone ledger stored in a `SQLite` database
#[derive(Clone)]
pub struct StateManager {
    pool: Pool<Sqlite>,
    tx: Option<EventSender>,
}

impl StateManager {
    /// Open (or create) the ledger at `db_path`
    ///
    /// # Errors
    ///
    /// Returns an error if database setup or migrations fail.
    pub async fn open(db_path: &Path, tx: Option<EventSender>) -> Result<Self, Error> {
        let pool = crate::create_pool(db_path).await?;
        crate::run_migrations(&pool).await?;

        let manager = Self { pool, tx };
        let milestones_set = {
            let mut conn = manager.pool.acquire().await?;
            queries::list_milestones(&mut conn).await?.len()
        };
        manager.emit(AppEvent::State(StateEvent::Opened {
            location: db_path.display().to_string(),
            milestones_set,
        }));
        Ok(manager)
    }

    /// Create a state manager with an existing pool and event sender
    #[must_use]
    pub fn with_pool(pool: Pool<Sqlite>, tx: Option<EventSender>) -> Self {
        Self { pool, tx }
    }

    /// Close the pool, flushing the WAL
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl EventEmitter for StateManager {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

#[async_trait]
impl FlagStore for StateManager {
    async fn is_set(&self, milestone: Milestone) -> Result<bool, Error> {
        let mut conn = self.pool.acquire().await?;
        queries::is_set(&mut conn, milestone).await
    }

    async fn set(&self, milestone: Milestone) -> Result<(), Error> {
        let set_at = Utc::now();
        let mut conn = self.pool.acquire().await?;
        if queries::insert_milestone(&mut conn, milestone, set_at).await? {
            self.emit(AppEvent::State(StateEvent::MilestoneSet { milestone, set_at }));
        }
        Ok(())
    }

    async fn snapshot(&self) -> Result<Vec<MilestoneStatus>, Error> {
        let mut conn = self.pool.acquire().await?;
        let recorded: HashMap<_, _> = queries::list_milestones(&mut conn)
            .await?
            .into_iter()
            .collect();

        Ok(Milestone::ALL
            .iter()
            .map(|&milestone| {
                let set_at = recorded.get(&milestone).copied();
                MilestoneStatus {
                    milestone,
                    set: set_at.is_some(),
                    set_at,
                }
            })
            .collect())
    }
}
