//! Driver install error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum InstallError {
    #[error("driver package not found: {path}")]
    MissingPackage { path: String },

    #[error("no {device} hardware ID in the install section of {inf} ({driver})")]
    HardwareIdNotFound {
        driver: String,
        device: String,
        inf: String,
    },

    #[error("waiting for pending device installs failed: os error {code}: {message}")]
    WaitPrimitive { code: u32, message: String },

    #[error("failed to install {driver}: os error {code}: {message}")]
    DriverInstallFailed {
        driver: String,
        code: u32,
        message: String,
    },

    #[error("timed out waiting for pending device installs before {operation}")]
    InstallsPending { operation: String },

    #[error("failed to read driver package {path}: {message}")]
    PackageUnreadable { path: String, message: String },
}

impl UserFacingError for InstallError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingPackage { .. } => {
                Some("Check --driver-root; packages are expected at <root>/<driver>/<x64|x86>/<driver>.inf.")
            }
            Self::HardwareIdNotFound { .. } => {
                Some("The package does not target this device; check the device identity.")
            }
            Self::InstallsPending { .. } => {
                Some("Another device install is still running; retry once it finishes.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DriverInstallFailed { .. } | Self::InstallsPending { .. }
        )
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::MissingPackage { .. } => "install.missing_package",
            Self::HardwareIdNotFound { .. } => "install.hardware_id_not_found",
            Self::WaitPrimitive { .. } => "install.wait_primitive",
            Self::DriverInstallFailed { .. } => "install.driver_install_failed",
            Self::InstallsPending { .. } => "install.installs_pending",
            Self::PackageUnreadable { .. } => "install.package_unreadable",
        })
    }
}
