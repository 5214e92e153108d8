//! Runtime SQL queries for the milestone table

use chrono::{DateTime, Utc};
use pvdrv_errors::{Error, StateError};
use pvdrv_types::Milestone;
use sqlx::{query, Row, Sqlite, SqliteConnection};

/// Whether a row exists for `milestone`
pub async fn is_set(conn: &mut SqliteConnection, milestone: Milestone) -> Result<bool, Error> {
    let row = query("SELECT 1 FROM milestones WHERE name = ?1")
        .bind(milestone.key())
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.is_some())
}

/// Insert `milestone` unless present; returns `true` when a row was added
pub async fn insert_milestone(
    conn: &mut SqliteConnection,
    milestone: Milestone,
    set_at: DateTime<Utc>,
) -> Result<bool, Error> {
    let result = query("INSERT OR IGNORE INTO milestones (name, set_at) VALUES (?1, ?2)")
        .bind(milestone.key())
        .bind(set_at.timestamp())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Every recorded milestone with its timestamp
///
/// Rows with names outside the known set are rejected rather than ignored.
pub async fn list_milestones(
    conn: &mut SqliteConnection,
) -> Result<Vec<(Milestone, DateTime<Utc>)>, Error> {
    let rows = query::<Sqlite>("SELECT name, set_at FROM milestones ORDER BY set_at, name")
        .fetch_all(&mut *conn)
        .await?;

    rows.into_iter()
        .map(|row| -> Result<(Milestone, DateTime<Utc>), Error> {
            let name: String = row.get("name");
            let set_at: i64 = row.get("set_at");
            let milestone = name.parse::<Milestone>()?;
            let set_at = DateTime::from_timestamp(set_at, 0).ok_or_else(|| {
                StateError::StateCorrupted {
                    message: format!("invalid timestamp {set_at} for {name}"),
                }
            })?;
            Ok((milestone, set_at))
        })
        .collect()
}
