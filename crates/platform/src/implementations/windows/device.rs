//! Device removal through SetupAPI device information sets

use async_trait::async_trait;
use pvdrv_errors::PlatformError;
use windows::core::PCWSTR;
use windows::Win32::Devices::DeviceAndDriverInstallation::{
    SetupDiDestroyDeviceInfoList, SetupDiEnumDeviceInfo, SetupDiGetClassDevsW,
    SetupDiGetDeviceRegistryPropertyW, SetupDiRemoveDevice, DIGCF_ALLCLASSES, HDEVINFO,
    SPDRP_HARDWAREID, SP_DEVINFO_DATA,
};
use windows::Win32::Foundation::ERROR_NO_MORE_ITEMS;

use super::{join_error, win32_code};
use crate::core::PlatformContext;
use crate::device::DeviceOperations;
use crate::os_error::os_call_failed;

// Hardware ID lists are short; this covers every device seen in practice
const HARDWARE_ID_BUFFER: usize = 4096;

pub struct WindowsDeviceOperations;

impl WindowsDeviceOperations {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsDeviceOperations {
    fn default() -> Self {
        Self::new()
    }
}

struct DeviceInfoSet(HDEVINFO);

impl Drop for DeviceInfoSet {
    fn drop(&mut self) {
        unsafe {
            let _ = SetupDiDestroyDeviceInfoList(self.0);
        }
    }
}

fn hardware_ids(set: &DeviceInfoSet, data: &SP_DEVINFO_DATA) -> Vec<String> {
    let mut buf = vec![0u8; HARDWARE_ID_BUFFER];
    let mut required = 0u32;
    let ok = unsafe {
        SetupDiGetDeviceRegistryPropertyW(
            set.0,
            data,
            SPDRP_HARDWAREID,
            None,
            Some(buf.as_mut_slice()),
            Some(&mut required),
        )
    };
    if ok.is_err() {
        // Devices without hardware IDs (or with oversized lists) never match
        return Vec::new();
    }
    let used = (required as usize).min(buf.len());
    let units: Vec<u16> = buf[..used]
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    units
        .split(|&c| c == 0)
        .filter(|s| !s.is_empty())
        .map(String::from_utf16_lossy)
        .collect()
}

fn remove_matching(pattern: &str) -> Result<bool, PlatformError> {
    let pattern = pattern.to_ascii_uppercase();
    let set = unsafe { SetupDiGetClassDevsW(None, PCWSTR::null(), None, DIGCF_ALLCLASSES) }
        .map(DeviceInfoSet)
        .map_err(|e| os_call_failed("enumerate_devices", pattern.clone(), win32_code(&e)))?;

    let mut removed = false;
    for index in 0u32.. {
        let mut data = SP_DEVINFO_DATA {
            #[allow(clippy::cast_possible_truncation)]
            cbSize: std::mem::size_of::<SP_DEVINFO_DATA>() as u32,
            ..Default::default()
        };
        if let Err(e) = unsafe { SetupDiEnumDeviceInfo(set.0, index, &mut data) } {
            if win32_code(&e) == ERROR_NO_MORE_ITEMS.0 {
                break;
            }
            return Err(os_call_failed("enumerate_devices", pattern, win32_code(&e)));
        }

        let matches = hardware_ids(&set, &data)
            .iter()
            .any(|id| id.to_ascii_uppercase().starts_with(&pattern));
        if matches {
            unsafe { SetupDiRemoveDevice(set.0, &mut data) }
                .map_err(|e| os_call_failed("remove_device", pattern.clone(), win32_code(&e)))?;
            removed = true;
        }
    }
    Ok(removed)
}

#[async_trait]
impl DeviceOperations for WindowsDeviceOperations {
    async fn remove_device(
        &self,
        _ctx: &PlatformContext,
        hardware_id: &str,
    ) -> Result<bool, PlatformError> {
        let pattern = hardware_id.to_string();
        tokio::task::spawn_blocking(move || remove_matching(&pattern))
            .await
            .map_err(|e| join_error("remove_device", &e))?
    }
}
