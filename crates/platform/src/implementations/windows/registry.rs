//! Registry access through the Win32 registry API

use async_trait::async_trait;
use pvdrv_errors::PlatformError;
use windows::core::{PCWSTR, PWSTR};
use windows::Win32::Foundation::{
    ERROR_FILE_NOT_FOUND, ERROR_MORE_DATA, ERROR_NO_MORE_ITEMS, ERROR_SUCCESS, WIN32_ERROR,
};
use windows::Win32::System::Registry::{
    RegCloseKey, RegDeleteTreeW, RegDeleteValueW, RegEnumKeyExW, RegOpenKeyExW, RegQueryValueExW,
    RegSetValueExW, HKEY, HKEY_LOCAL_MACHINE, KEY_READ, KEY_WOW64_32KEY, KEY_WOW64_64KEY,
    KEY_WRITE, REG_BINARY, REG_DWORD, REG_EXPAND_SZ, REG_MULTI_SZ, REG_SAM_FLAGS, REG_SZ,
    REG_VALUE_TYPE,
};

use super::{from_wide, to_wide};
use crate::os_error::registry_failed;
use crate::registry::{RegKeyPath, RegValue, RegistryOperations, RegistryView};

// Longest key name the registry allows, plus the terminator
const MAX_KEY_NAME: usize = 256;

pub struct WindowsRegistryOperations;

impl WindowsRegistryOperations {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsRegistryOperations {
    fn default() -> Self {
        Self::new()
    }
}

struct OwnedKey(HKEY);

impl Drop for OwnedKey {
    fn drop(&mut self) {
        unsafe {
            let _ = RegCloseKey(self.0);
        }
    }
}

fn view_flag(view: RegistryView) -> REG_SAM_FLAGS {
    match view {
        RegistryView::Native => KEY_WOW64_64KEY,
        RegistryView::Wow64_32 => KEY_WOW64_32KEY,
    }
}

/// Open `key`; `None` when it does not exist
fn open(key: &RegKeyPath, access: REG_SAM_FLAGS) -> Result<Option<OwnedKey>, PlatformError> {
    let path = to_wide(&key.path);
    let mut handle = HKEY::default();
    let status = unsafe {
        RegOpenKeyExW(
            HKEY_LOCAL_MACHINE,
            PCWSTR(path.as_ptr()),
            None,
            access | view_flag(key.view),
            &mut handle,
        )
    };
    match status {
        ERROR_SUCCESS => Ok(Some(OwnedKey(handle))),
        ERROR_FILE_NOT_FOUND => Ok(None),
        WIN32_ERROR(code) => Err(registry_failed("open", key, code)),
    }
}

/// Split `a\b\c` into (`a\b`, `c`)
fn split_parent(key: &RegKeyPath) -> Option<(RegKeyPath, String)> {
    let path = key.path.trim_end_matches('\\');
    let (parent, leaf) = path.rsplit_once('\\')?;
    Some((
        RegKeyPath {
            view: key.view,
            path: parent.to_string(),
        },
        leaf.to_string(),
    ))
}

fn decode_value(kind: REG_VALUE_TYPE, data: &[u8]) -> RegValue {
    let wide = || -> Vec<u16> {
        data.chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect()
    };
    match kind {
        REG_DWORD if data.len() >= 4 => {
            RegValue::Dword(u32::from_le_bytes([data[0], data[1], data[2], data[3]]))
        }
        REG_SZ => RegValue::String(from_wide(&wide())),
        REG_EXPAND_SZ => RegValue::ExpandString(from_wide(&wide())),
        REG_MULTI_SZ => RegValue::MultiString(
            wide()
                .split(|&c| c == 0)
                .filter(|s| !s.is_empty())
                .map(String::from_utf16_lossy)
                .collect(),
        ),
        _ => RegValue::Binary(data.to_vec()),
    }
}

fn encode_value(value: &RegValue) -> (REG_VALUE_TYPE, Vec<u8>) {
    let wide_bytes = |units: Vec<u16>| -> Vec<u8> {
        units.into_iter().flat_map(u16::to_le_bytes).collect()
    };
    match value {
        RegValue::Dword(v) => (REG_DWORD, v.to_le_bytes().to_vec()),
        RegValue::String(s) => (REG_SZ, wide_bytes(to_wide(s))),
        RegValue::ExpandString(s) => (REG_EXPAND_SZ, wide_bytes(to_wide(s))),
        RegValue::MultiString(items) => {
            let mut units: Vec<u16> = Vec::new();
            for item in items {
                units.extend(item.encode_utf16());
                units.push(0);
            }
            units.push(0);
            (REG_MULTI_SZ, wide_bytes(units))
        }
        RegValue::Binary(bytes) => (REG_BINARY, bytes.clone()),
    }
}

fn query(handle: &OwnedKey, key: &RegKeyPath, name: &str) -> Result<Option<RegValue>, PlatformError> {
    let name_w = to_wide(name);
    let mut kind = REG_VALUE_TYPE::default();
    let mut size = 0u32;
    let status = unsafe {
        RegQueryValueExW(
            handle.0,
            PCWSTR(name_w.as_ptr()),
            None,
            Some(&mut kind),
            None,
            Some(&mut size),
        )
    };
    match status {
        ERROR_SUCCESS => {}
        ERROR_FILE_NOT_FOUND => return Ok(None),
        WIN32_ERROR(code) => return Err(registry_failed("query", key, code)),
    }

    loop {
        let mut data = vec![0u8; size as usize];
        let status = unsafe {
            RegQueryValueExW(
                handle.0,
                PCWSTR(name_w.as_ptr()),
                None,
                Some(&mut kind),
                Some(data.as_mut_ptr()),
                Some(&mut size),
            )
        };
        match status {
            ERROR_SUCCESS => {
                data.truncate(size as usize);
                return Ok(Some(decode_value(kind, &data)));
            }
            // The value grew between the two calls
            ERROR_MORE_DATA => continue,
            ERROR_FILE_NOT_FOUND => return Ok(None),
            WIN32_ERROR(code) => return Err(registry_failed("query", key, code)),
        }
    }
}

#[async_trait]
impl RegistryOperations for WindowsRegistryOperations {
    async fn subkeys(&self, key: &RegKeyPath) -> Result<Vec<String>, PlatformError> {
        let handle = open(key, KEY_READ)?
            .ok_or_else(|| registry_failed("open", key, ERROR_FILE_NOT_FOUND.0))?;

        let mut names = Vec::new();
        for index in 0u32.. {
            let mut buf = [0u16; MAX_KEY_NAME];
            #[allow(clippy::cast_possible_truncation)]
            let mut len = MAX_KEY_NAME as u32;
            let status = unsafe {
                RegEnumKeyExW(
                    handle.0,
                    index,
                    Some(PWSTR(buf.as_mut_ptr())),
                    &mut len,
                    None,
                    None,
                    None,
                    None,
                )
            };
            match status {
                ERROR_SUCCESS => names.push(String::from_utf16_lossy(&buf[..len as usize])),
                ERROR_NO_MORE_ITEMS => break,
                WIN32_ERROR(code) => return Err(registry_failed("enumerate", key, code)),
            }
        }
        Ok(names)
    }

    async fn get_value(
        &self,
        key: &RegKeyPath,
        name: &str,
    ) -> Result<Option<RegValue>, PlatformError> {
        match open(key, KEY_READ)? {
            Some(handle) => query(&handle, key, name),
            None => Ok(None),
        }
    }

    async fn set_value(
        &self,
        key: &RegKeyPath,
        name: &str,
        value: &RegValue,
    ) -> Result<(), PlatformError> {
        let handle = open(key, KEY_WRITE)?
            .ok_or_else(|| registry_failed("open", key, ERROR_FILE_NOT_FOUND.0))?;
        let name_w = to_wide(name);
        let (kind, data) = encode_value(value);
        let status =
            unsafe { RegSetValueExW(handle.0, PCWSTR(name_w.as_ptr()), None, kind, Some(&data)) };
        match status {
            ERROR_SUCCESS => Ok(()),
            WIN32_ERROR(code) => Err(registry_failed("set", key, code)),
        }
    }

    async fn delete_value(&self, key: &RegKeyPath, name: &str) -> Result<bool, PlatformError> {
        let Some(handle) = open(key, KEY_WRITE)? else {
            return Ok(false);
        };
        let name_w = to_wide(name);
        let status = unsafe { RegDeleteValueW(handle.0, PCWSTR(name_w.as_ptr())) };
        match status {
            ERROR_SUCCESS => Ok(true),
            ERROR_FILE_NOT_FOUND => Ok(false),
            WIN32_ERROR(code) => Err(registry_failed("delete_value", key, code)),
        }
    }

    async fn delete_subkey_tree(&self, key: &RegKeyPath) -> Result<bool, PlatformError> {
        let (parent, leaf) =
            split_parent(key).ok_or_else(|| registry_failed("delete_tree", key, 87))?;
        let Some(handle) = open(&parent, KEY_READ | KEY_WRITE)? else {
            return Ok(false);
        };
        let leaf_w = to_wide(&leaf);
        let status = unsafe { RegDeleteTreeW(handle.0, PCWSTR(leaf_w.as_ptr())) };
        match status {
            ERROR_SUCCESS => Ok(true),
            ERROR_FILE_NOT_FOUND => Ok(false),
            WIN32_ERROR(code) => Err(registry_failed("delete_tree", key, code)),
        }
    }
}
