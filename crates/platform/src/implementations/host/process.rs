//! Process execution through `tokio::process`

use async_trait::async_trait;
use pvdrv_errors::PlatformError;
use pvdrv_events::{AppEvent, PlatformEvent};
use std::time::{Duration, Instant};
use tokio::process::Command;

use crate::core::PlatformContext;
use crate::process::{PlatformCommand, ProcessOperations};

/// Host implementation of process operations
pub struct HostProcessOperations;

impl HostProcessOperations {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for HostProcessOperations {
    fn default() -> Self {
        Self::new()
    }
}

fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl ProcessOperations for HostProcessOperations {
    async fn run(&self, ctx: &PlatformContext, cmd: PlatformCommand) -> Result<i32, PlatformError> {
        let start = Instant::now();
        ctx.emit_event(AppEvent::Platform(PlatformEvent::ProcessStarted {
            command: cmd.program().to_string(),
            args: cmd.get_args().to_vec(),
        }));

        let result = Command::new(cmd.program())
            .args(cmd.get_args())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| PlatformError::ProcessExecutionFailed {
                command: cmd.to_string(),
                message: e.to_string(),
            });

        let duration_ms = duration_to_millis(start.elapsed());
        match result {
            Ok(status) => {
                // A missing code means the process was terminated by a signal
                let exit_code = status.code().unwrap_or(-1);
                ctx.emit_event(AppEvent::Platform(PlatformEvent::ProcessCompleted {
                    command: cmd.program().to_string(),
                    exit_code,
                    duration_ms,
                }));
                Ok(exit_code)
            }
            Err(e) => {
                ctx.emit_event(AppEvent::Platform(PlatformEvent::ProcessFailed {
                    command: cmd.program().to_string(),
                    error_message: e.to_string(),
                    duration_ms,
                }));
                Err(e)
            }
        }
    }
}
