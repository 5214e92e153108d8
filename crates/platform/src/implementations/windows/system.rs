//! System facts for a Windows host

use async_trait::async_trait;
use pvdrv_errors::PlatformError;
use pvdrv_types::{OsVersion, TargetArch};
use std::path::PathBuf;

use super::registry::WindowsRegistryOperations;
use crate::registry::{RegKeyPath, RegistryOperations};
use crate::system::SystemInfo;

const CURRENT_VERSION_KEY: &str = r"SOFTWARE\Microsoft\Windows NT\CurrentVersion";

pub struct WindowsSystemInfo {
    registry: WindowsRegistryOperations,
}

impl WindowsSystemInfo {
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: WindowsRegistryOperations::new(),
        }
    }
}

impl Default for WindowsSystemInfo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SystemInfo for WindowsSystemInfo {
    fn target_arch(&self) -> TargetArch {
        // A 32-bit process on a 64-bit OS sees the real architecture in PROCESSOR_ARCHITEW6432
        let arch = std::env::var("PROCESSOR_ARCHITEW6432")
            .or_else(|_| std::env::var("PROCESSOR_ARCHITECTURE"))
            .unwrap_or_default();
        match arch.to_ascii_uppercase().as_str() {
            "AMD64" | "ARM64" | "IA64" => TargetArch::X64,
            _ => TargetArch::X86,
        }
    }

    async fn os_version(&self) -> Result<OsVersion, PlatformError> {
        let key = RegKeyPath::native(CURRENT_VERSION_KEY);

        // Windows 10 and later freeze CurrentVersion at 6.3
        let major = self.registry.get_value(&key, "CurrentMajorVersionNumber").await?;
        let minor = self.registry.get_value(&key, "CurrentMinorVersionNumber").await?;
        if let (Some(major), Some(minor)) = (
            major.as_ref().and_then(|v| v.as_dword()),
            minor.as_ref().and_then(|v| v.as_dword()),
        ) {
            return Ok(OsVersion::new(major, minor));
        }

        let version = self.registry.get_value(&key, "CurrentVersion").await?;
        let text = version
            .as_ref()
            .and_then(|v| v.as_str())
            .ok_or_else(|| PlatformError::UnexpectedValueType {
                key: key.to_string(),
                value: "CurrentVersion".to_string(),
                expected: "REG_SZ".to_string(),
            })?;
        text.parse()
            .map_err(|message: String| PlatformError::UnexpectedValueType {
                key: key.to_string(),
                value: "CurrentVersion".to_string(),
                expected: message,
            })
    }

    fn drivers_dir(&self) -> PathBuf {
        let root = std::env::var_os("SystemRoot").unwrap_or_else(|| r"C:\Windows".into());
        PathBuf::from(root).join("System32").join("drivers")
    }
}
