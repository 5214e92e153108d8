//! Installed product catalog (Windows Installer)

use async_trait::async_trait;
use pvdrv_errors::PlatformError;

#[async_trait]
pub trait MsiOperations: Send + Sync {
    /// Product code at cursor position `index`; `None` once the catalog is exhausted
    async fn enum_product(&self, index: u32) -> Result<Option<String>, PlatformError>;

    /// Display name of an installed product, if it has one
    async fn product_display_name(&self, product_code: &str)
        -> Result<Option<String>, PlatformError>;
}
