//! Device removal

use async_trait::async_trait;
use pvdrv_errors::PlatformError;

use crate::core::PlatformContext;

#[async_trait]
pub trait DeviceOperations: Send + Sync {
    /// Remove every device whose hardware IDs start with `hardware_id`
    /// (case-insensitive). Returns `false` when nothing matched.
    async fn remove_device(
        &self,
        ctx: &PlatformContext,
        hardware_id: &str,
    ) -> Result<bool, PlatformError>;
}
