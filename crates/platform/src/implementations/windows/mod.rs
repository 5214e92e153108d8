//! Native Windows providers
//!
//! Thin wrappers over SetupAPI, the configuration manager, the registry and
//! Windows Installer. Blocking calls run on the blocking thread pool.
#![allow(unsafe_code)]

pub mod device;
pub mod driver_store;
pub mod msi;
pub mod registry;
pub mod system;

pub use device::WindowsDeviceOperations;
pub use driver_store::WindowsDriverStoreOperations;
pub use msi::WindowsMsiOperations;
pub use registry::WindowsRegistryOperations;
pub use system::WindowsSystemInfo;

use pvdrv_errors::PlatformError;
use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;

/// NUL-terminated UTF-16 copy of `s`
pub(crate) fn to_wide(s: impl AsRef<OsStr>) -> Vec<u16> {
    s.as_ref()
        .encode_wide()
        .chain(std::iter::once(0))
        .collect()
}

/// String up to the first NUL
pub(crate) fn from_wide(buf: &[u16]) -> String {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..len])
}

/// Win32 error code carried by a `windows::core::Error`
pub(crate) fn win32_code(err: &windows::core::Error) -> u32 {
    #[allow(clippy::cast_sign_loss)]
    let hr = err.code().0 as u32;
    // HRESULT_FROM_WIN32 wraps the code as 0x8007xxxx
    if hr & 0xFFFF_0000 == 0x8007_0000 {
        hr & 0xFFFF
    } else {
        hr
    }
}

pub(crate) fn join_error(operation: &str, err: &tokio::task::JoinError) -> PlatformError {
    PlatformError::OsCallFailed {
        operation: operation.to_string(),
        target: "blocking task".to_string(),
        code: 0,
        message: err.to_string(),
    }
}
