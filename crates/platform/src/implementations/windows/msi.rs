//! Installed product catalog through Windows Installer

use async_trait::async_trait;
use pvdrv_errors::PlatformError;
use windows::core::{w, PCWSTR, PWSTR};
use windows::Win32::Foundation::{
    ERROR_MORE_DATA, ERROR_NO_MORE_ITEMS, ERROR_SUCCESS, ERROR_UNKNOWN_PRODUCT,
    ERROR_UNKNOWN_PROPERTY,
};
use windows::Win32::System::ApplicationInstallationAndServicing::{
    MsiEnumProductsW, MsiGetProductInfoW,
};

use super::{from_wide, to_wide};
use crate::msi::MsiOperations;
use crate::os_error::os_call_failed;

// A product code GUID in braces plus the terminator
const PRODUCT_CODE_LEN: usize = 39;

pub struct WindowsMsiOperations;

impl WindowsMsiOperations {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsMsiOperations {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MsiOperations for WindowsMsiOperations {
    async fn enum_product(&self, index: u32) -> Result<Option<String>, PlatformError> {
        let mut buf = [0u16; PRODUCT_CODE_LEN];
        let status = unsafe { MsiEnumProductsW(index, PWSTR(buf.as_mut_ptr())) };
        match status {
            s if s == ERROR_SUCCESS.0 => Ok(Some(from_wide(&buf))),
            s if s == ERROR_NO_MORE_ITEMS.0 => Ok(None),
            code => Err(os_call_failed("enum_product", format!("index {index}"), code)),
        }
    }

    async fn product_display_name(
        &self,
        product_code: &str,
    ) -> Result<Option<String>, PlatformError> {
        let code_w = to_wide(product_code);
        let mut capacity = 256u32;
        loop {
            let mut buf = vec![0u16; capacity as usize + 1];
            let mut len = capacity + 1;
            let status = unsafe {
                MsiGetProductInfoW(
                    PCWSTR(code_w.as_ptr()),
                    w!("InstalledProductName"),
                    Some(PWSTR(buf.as_mut_ptr())),
                    Some(&mut len),
                )
            };
            match status {
                s if s == ERROR_SUCCESS.0 => return Ok(Some(from_wide(&buf))),
                s if s == ERROR_MORE_DATA.0 => capacity = len,
                s if s == ERROR_UNKNOWN_PRODUCT.0 || s == ERROR_UNKNOWN_PROPERTY.0 => {
                    return Ok(None)
                }
                code => return Err(os_call_failed("product_display_name", product_code, code)),
            }
        }
    }
}
