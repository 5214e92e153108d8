//! Uninstalling the legacy installer packages

use crate::msi::resolve_product_code;
use crate::retry::{uninstall_product, RetryBudget};
use crate::tables::LEGACY_PRODUCTS;
use crate::OpsCtx;
use pvdrv_errors::Error;
use pvdrv_types::CleanupReport;

use super::remnant_absent;

pub(super) async fn uninstall_msis(ctx: &OpsCtx, report: &mut CleanupReport) -> Result<(), Error> {
    let mut product_codes: Vec<String> = Vec::new();
    for display_name in LEGACY_PRODUCTS {
        match resolve_product_code(ctx, display_name).await? {
            Some(code) if !product_codes.contains(&code) => product_codes.push(code),
            Some(_) => {}
            None => remnant_absent(ctx, "product", display_name),
        }
    }

    let budget = RetryBudget::new(ctx.config.cleanup.uninstall_attempts);
    for product_code in product_codes {
        let outcome = uninstall_product(ctx, &product_code, budget).await?;
        report.reboot_required |= outcome.reboot_required;
        report.products_removed.push(product_code);
    }
    Ok(())
}
