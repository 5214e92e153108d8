#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Milestone ledger for pvdrv
//!
//! Every irreversible workflow step is gated by a [`Milestone`]. This crate
//! persists which milestones are set so a rerun after a crash or reboot skips
//! completed steps. The ledger only grows: the [`FlagStore`] contract has no
//! way to clear a milestone.
//!
//! [`Milestone`]: pvdrv_types::Milestone

pub mod flag_store;
pub mod manager;
pub mod memory;
pub mod queries;

pub use flag_store::FlagStore;
pub use manager::StateManager;
pub use memory::MemoryFlagStore;

use pvdrv_errors::{Error, StateError};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::time::Duration;

/// Create a new `SQLite` connection pool
///
/// # Errors
///
/// Returns an error if the database connection fails or configuration is invalid.
pub async fn create_pool(db_path: &Path) -> Result<Pool<Sqlite>, Error> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::io_with_path(&e, parent))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(2)
        .connect_with(options)
        .await
        .map_err(|e| {
            Error::from(StateError::DatabaseError {
                message: e.to_string(),
            })
        })?;

    if let Ok(mut conn) = pool.acquire().await {
        // A milestone write must survive a hard reset that follows it
        let _ = sqlx::query("PRAGMA synchronous = FULL")
            .execute(&mut *conn)
            .await;
        let _ = sqlx::query("PRAGMA wal_autocheckpoint = 100")
            .execute(&mut *conn)
            .await;
    }

    Ok(pool)
}

/// Run database migrations
///
/// # Errors
///
/// Returns an error if any migration fails to execute.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<(), Error> {
    sqlx::migrate!("./migrations").run(pool).await.map_err(|e| {
        StateError::MigrationFailed {
            message: e.to_string(),
        }
        .into()
    })
}
