#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for pvdrv
//!
//! This crate provides fine-grained error types organized by domain.
//! All error types implement Clone so they can travel inside events.

use std::borrow::Cow;

use thiserror::Error;

pub mod cleanup;
pub mod config;
pub mod install;
pub mod ops;
pub mod platform;
pub mod state;

// Re-export all error types at the root
pub use cleanup::CleanupError;
pub use config::ConfigError;
pub use install::InstallError;
pub use ops::OpsError;
pub use platform::PlatformError;
pub use state::StateError;

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("install error: {0}")]
    Install(#[from] InstallError),

    #[error("cleanup error: {0}")]
    Cleanup(#[from] CleanupError),

    #[error("ops error: {0}")]
    Ops(#[from] OpsError),

    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("I/O error: {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
        path: Option<std::path::PathBuf>,
    },
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create an Io error with an associated path
    pub fn io_with_path(err: &std::io::Error, path: impl Into<std::path::PathBuf>) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: Some(path.into()),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: None,
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::State(StateError::DatabaseError {
            message: err.to_string(),
        })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {err}"))
    }
}

/// Result type alias for pvdrv operations
pub type Result<T> = std::result::Result<T, Error>;

/// Minimal interface for rendering user-facing error information without
/// requiring heavyweight envelopes.
pub trait UserFacingError {
    /// Short message suitable for CLI output.
    fn user_message(&self) -> Cow<'_, str>;

    /// Optional remediation hint.
    fn user_hint(&self) -> Option<&'static str> {
        None
    }

    /// Whether retrying the same operation is likely to succeed.
    fn is_retryable(&self) -> bool {
        false
    }

    /// Stable error code for structured reporting.
    fn user_code(&self) -> Option<&'static str> {
        None
    }
}

impl UserFacingError for Error {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Error::Install(err) => err.user_message(),
            Error::Cleanup(err) => err.user_message(),
            Error::Platform(err) => err.user_message(),
            Error::Config(err) => err.user_message(),
            Error::Io { message, .. } => Cow::Owned(message.clone()),
            _ => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Error::Install(err) => err.user_hint(),
            Error::Cleanup(err) => err.user_hint(),
            Error::Platform(err) => err.user_hint(),
            Error::Config(err) => err.user_hint(),
            Error::State(_) => Some("Check that the state database is writable."),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Error::Install(err) => err.is_retryable(),
            Error::Cleanup(err) => err.is_retryable(),
            Error::Platform(err) => err.is_retryable(),
            Error::Io { .. } => true,
            _ => false,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Error::State(err) => err.user_code(),
            Error::Config(err) => err.user_code(),
            Error::Install(err) => err.user_code(),
            Error::Cleanup(err) => err.user_code(),
            Error::Ops(err) => err.user_code(),
            Error::Platform(err) => err.user_code(),
            Error::Internal(_) => Some("error.internal"),
            Error::Io { .. } => Some("error.io"),
        }
    }
}
