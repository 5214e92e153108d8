//! Capability provider errors
//!
//! Every variant that originates in an OS call carries the platform error
//! code together with its translated message.

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

/// Errors raised by the OS binding layer
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    #[error("{operation} failed on {target}: os error {code}: {message}")]
    OsCallFailed {
        operation: String,
        target: String,
        code: u32,
        message: String,
    },

    #[error("registry {operation} failed on {key}: os error {code}: {message}")]
    RegistryOperationFailed {
        operation: String,
        key: String,
        code: u32,
        message: String,
    },

    #[error("filesystem operation failed: {operation} on {path} - {message}")]
    FilesystemOperationFailed {
        operation: String,
        path: String,
        message: String,
    },

    #[error("process execution failed: {command} - {message}")]
    ProcessExecutionFailed { command: String, message: String },

    #[error("platform capability not available: {capability}")]
    CapabilityUnavailable { capability: String },

    #[error("unexpected registry value type for {key}\\{value}: expected {expected}")]
    UnexpectedValueType {
        key: String,
        value: String,
        expected: String,
    },
}

impl PlatformError {
    /// Platform error code, when the failure came from an OS call
    #[must_use]
    pub fn os_code(&self) -> Option<u32> {
        match self {
            Self::OsCallFailed { code, .. } | Self::RegistryOperationFailed { code, .. } => {
                Some(*code)
            }
            _ => None,
        }
    }
}

impl UserFacingError for PlatformError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::CapabilityUnavailable { .. } => {
                Some("This operation is only available on a Windows guest.")
            }
            Self::RegistryOperationFailed { code: 5, .. } | Self::OsCallFailed { code: 5, .. } => {
                Some("Run pvdrv from an elevated (administrator) prompt.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::OsCallFailed { .. } | Self::ProcessExecutionFailed { .. }
        )
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::OsCallFailed { .. } => "platform.os_call_failed",
            Self::RegistryOperationFailed { .. } => "platform.registry_failed",
            Self::FilesystemOperationFailed { .. } => "platform.filesystem_failed",
            Self::ProcessExecutionFailed { .. } => "platform.process_failed",
            Self::CapabilityUnavailable { .. } => "platform.capability_unavailable",
            Self::UnexpectedValueType { .. } => "platform.unexpected_value_type",
        })
    }
}
