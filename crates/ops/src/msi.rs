//! Product code lookup by display name

use crate::OpsCtx;
use pvdrv_errors::{CleanupError, Error};
use pvdrv_events::{AppEvent, CleanupEvent, EventEmitter};

/// Find the installed product whose display name equals `display_name`
/// (case-insensitive). `None` when the catalog ends without a match.
///
/// # Errors
///
/// Returns `CleanupError::ProductEnumeration` with the OS code when the
/// catalog cursor fails for any reason other than running out of products.
pub async fn resolve_product_code(ctx: &OpsCtx, display_name: &str) -> Result<Option<String>, Error> {
    let msi = ctx.platform.msi();

    let mut index = 0;
    loop {
        let product_code = match msi.enum_product(index).await {
            Ok(Some(code)) => code,
            Ok(None) => return Ok(None),
            Err(err) => {
                return Err(CleanupError::ProductEnumeration {
                    code: err.os_code().unwrap_or_default(),
                    message: err.to_string(),
                }
                .into())
            }
        };

        let name = msi.product_display_name(&product_code).await?;
        if name.is_some_and(|n| n.eq_ignore_ascii_case(display_name)) {
            ctx.emit(AppEvent::Cleanup(CleanupEvent::ProductResolved {
                display_name: display_name.to_string(),
                product_code: product_code.clone(),
            }));
            return Ok(Some(product_code));
        }
        index += 1;
    }
}
