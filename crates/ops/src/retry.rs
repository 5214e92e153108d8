//! Uninstalling legacy products with retry and exponential backoff

use crate::OpsCtx;
use pvdrv_errors::{CleanupError, Error};
use pvdrv_events::{AppEvent, CleanupEvent, EventEmitter};
use pvdrv_platform::PlatformCommand;
use serde::Serialize;
use std::time::Duration;

/// `ERROR_SUCCESS_REBOOT_INITIATED`
pub const EXIT_REBOOT_INITIATED: i32 = 1641;
/// `ERROR_SUCCESS_REBOOT_REQUIRED`
pub const EXIT_REBOOT_REQUIRED: i32 = 3010;

/// Number of attempts, with `2^i` seconds of sleep after failed attempt `i`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    attempts: u32,
}

impl RetryBudget {
    /// At least one attempt is always made
    #[must_use]
    pub fn new(attempts: u32) -> Self {
        Self {
            attempts: attempts.max(1),
        }
    }

    #[must_use]
    pub fn attempts(self) -> u32 {
        self.attempts
    }

    /// Sleep after the failed attempt with zero-based index `index`
    #[must_use]
    pub fn delay(index: u32) -> Duration {
        Duration::from_secs(2u64.saturating_pow(index))
    }
}

/// Exit of a successful uninstall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UninstallOutcome {
    pub exit_code: i32,
    pub attempts: u32,
    pub reboot_required: bool,
}

fn success(exit_code: i32) -> Option<bool> {
    match exit_code {
        0 => Some(false),
        EXIT_REBOOT_INITIATED | EXIT_REBOOT_REQUIRED => Some(true),
        _ => None,
    }
}

/// Run `msiexec /x {product_code} /qn /norestart` until it succeeds or the
/// budget runs out. No sleep follows the final attempt.
///
/// # Errors
///
/// Returns `CleanupError::UninstallFailed` with the last exit code once every
/// attempt failed, or a platform error if the uninstaller could not be started.
pub async fn uninstall_product(
    ctx: &OpsCtx,
    product_code: &str,
    budget: RetryBudget,
) -> Result<UninstallOutcome, Error> {
    let msiexec = ctx.config.cleanup.msiexec.display().to_string();
    let max_attempts = budget.attempts();

    let mut index = 0;
    loop {
        let attempt = index + 1;
        ctx.emit(AppEvent::Cleanup(CleanupEvent::UninstallAttempt {
            product_code: product_code.to_string(),
            attempt,
            max_attempts,
        }));

        let command = PlatformCommand::new(&msiexec).args(["/x", product_code, "/qn", "/norestart"]);
        let exit_code = ctx
            .platform
            .process()
            .run(ctx.platform_context(), command)
            .await?;

        if let Some(reboot_required) = success(exit_code) {
            ctx.emit(AppEvent::Cleanup(CleanupEvent::UninstallSucceeded {
                product_code: product_code.to_string(),
                exit_code,
                reboot_required,
            }));
            return Ok(UninstallOutcome {
                exit_code,
                attempts: attempt,
                reboot_required,
            });
        }

        if attempt >= max_attempts {
            return Err(CleanupError::UninstallFailed {
                product_code: product_code.to_string(),
                exit_code,
                attempts: attempt,
            }
            .into());
        }

        let delay = RetryBudget::delay(index);
        ctx.emit(AppEvent::Cleanup(CleanupEvent::UninstallRetryScheduled {
            product_code: product_code.to_string(),
            attempt,
            exit_code,
            delay_secs: delay.as_secs(),
        }));
        tokio::time::sleep(delay).await;
        index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_doubles_from_one_second() {
        let delays: Vec<u64> = (0..4).map(|i| RetryBudget::delay(i).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8]);
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        assert_eq!(RetryBudget::new(0).attempts(), 1);
    }

    #[test]
    fn reboot_codes_are_successes() {
        assert_eq!(success(0), Some(false));
        assert_eq!(success(1641), Some(true));
        assert_eq!(success(3010), Some(true));
        assert_eq!(success(1603), None);
    }
}
