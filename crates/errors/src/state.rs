//! Milestone ledger error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum StateError {
    #[error("database error: {message}")]
    DatabaseError { message: String },

    #[error("migration failed: {message}")]
    MigrationFailed { message: String },

    #[error("unknown milestone: {name}")]
    UnknownMilestone { name: String },

    #[error("state corrupted: {message}")]
    StateCorrupted { message: String },
}

impl UserFacingError for StateError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::DatabaseError { .. } => "state.database",
            Self::MigrationFailed { .. } => "state.migration",
            Self::UnknownMilestone { .. } => "state.unknown_milestone",
            Self::StateCorrupted { .. } => "state.corrupted",
        })
    }
}
