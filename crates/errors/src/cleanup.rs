//! Legacy cleanup error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CleanupError {
    #[error("cannot open registry key {key}: os error {code}: {message}")]
    RegistryAccess {
        key: String,
        code: u32,
        message: String,
    },

    #[error("uninstall of {product_code} failed after {attempts} attempts (last exit code {exit_code})")]
    UninstallFailed {
        product_code: String,
        exit_code: i32,
        attempts: u32,
    },

    #[error("enumerating installed products failed: os error {code}: {message}")]
    ProductEnumeration { code: u32, message: String },
}

impl UserFacingError for CleanupError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::RegistryAccess { .. } => Some("Run pvdrv from an elevated (administrator) prompt."),
            Self::UninstallFailed { .. } => {
                Some("Check the Windows Installer log; completed stages are skipped on the next run.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::UninstallFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::RegistryAccess { .. } => "cleanup.registry_access",
            Self::UninstallFailed { .. } => "cleanup.uninstall_failed",
            Self::ProductEnumeration { .. } => "cleanup.product_enumeration",
        })
    }
}
