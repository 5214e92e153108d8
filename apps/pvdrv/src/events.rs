//! Event handling and status display

use crate::logging::log_event_with_tracing;
use console::Style;
use pvdrv_events::{AppEvent, CleanupEvent, DriverEvent, GeneralEvent};

/// How a status line is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Status,
    Warning,
    Error,
}

/// Event handler for user feedback
pub struct EventHandler {
    colors_enabled: bool,
    /// Status lines are suppressed when stdout carries JSON
    quiet: bool,
}

impl EventHandler {
    pub fn new(colors_enabled: bool, quiet: bool) -> Self {
        Self {
            colors_enabled,
            quiet,
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, event: &AppEvent) {
        log_event_with_tracing(event);

        if self.quiet {
            return;
        }

        if let Some((kind, line)) = status_line(event) {
            match kind {
                LineKind::Status => self.show_status(&line),
                LineKind::Warning => self.show_warning(&line),
                LineKind::Error => self.show_error(&line),
            }
        }
    }

    fn show_status(&self, message: &str) {
        eprintln!("{message}");
    }

    fn show_warning(&self, message: &str) {
        if self.colors_enabled {
            eprintln!("{}", Style::new().yellow().apply_to(message));
        } else {
            eprintln!("{message}");
        }
    }

    fn show_error(&self, message: &str) {
        if self.colors_enabled {
            eprintln!("{}", Style::new().red().bold().apply_to(message));
        } else {
            eprintln!("{message}");
        }
    }
}

fn status_line(event: &AppEvent) -> Option<(LineKind, String)> {
    use LineKind::{Error, Status, Warning};

    let line = match event {
        AppEvent::General(GeneralEvent::Warning { message, context }) => match context {
            Some(context) => (Warning, format!("warning: {message} ({context})")),
            None => (Warning, format!("warning: {message}")),
        },
        AppEvent::General(GeneralEvent::Error { message, details }) => match details {
            Some(details) => (Error, format!("error: {message}: {details}")),
            None => (Error, format!("error: {message}")),
        },
        AppEvent::General(GeneralEvent::OperationFailed { operation, error }) => {
            (Error, format!("{operation} failed: {error}"))
        }

        AppEvent::Driver(DriverEvent::GateTimedOut { timeout }) => (
            Warning,
            format!("device installs still pending after {timeout}"),
        ),
        AppEvent::Driver(DriverEvent::InstallStarted { driver, .. }) => {
            (Status, format!("Installing {driver}"))
        }
        AppEvent::Driver(DriverEvent::InstallCompleted {
            driver,
            reboot_required,
        }) => {
            if *reboot_required {
                (Status, format!("Installed {driver} (reboot required)"))
            } else {
                (Status, format!("Installed {driver}"))
            }
        }
        AppEvent::Driver(DriverEvent::InstallSkipped { driver, .. }) => {
            (Status, format!("{driver} already installed"))
        }
        AppEvent::Driver(DriverEvent::InstallFailed { driver, failure }) => {
            (Error, format!("Install of {driver} failed: {}", failure.message))
        }
        AppEvent::Driver(DriverEvent::StageCompleted { driver, .. }) => {
            (Status, format!("Staged {driver}"))
        }
        AppEvent::Driver(DriverEvent::StageFailed {
            driver, message, ..
        }) => (Error, format!("Staging {driver} failed: {message}")),

        AppEvent::Cleanup(CleanupEvent::StageStarted { stage }) => {
            (Status, format!("Cleanup: {stage}"))
        }
        AppEvent::Cleanup(CleanupEvent::StageSkipped { stage }) => {
            (Status, format!("Cleanup: {stage} already done"))
        }
        AppEvent::Cleanup(CleanupEvent::StageFailed { stage, failure }) => {
            (Error, format!("Cleanup stage {stage} failed: {}", failure.message))
        }
        AppEvent::Cleanup(CleanupEvent::UninstallAttempt {
            product_code,
            attempt,
            max_attempts,
        }) => (
            Status,
            format!("Uninstalling {product_code} (attempt {attempt}/{max_attempts})"),
        ),
        AppEvent::Cleanup(CleanupEvent::UninstallRetryScheduled {
            exit_code,
            delay_secs,
            ..
        }) => (
            Warning,
            format!("msiexec exited with {exit_code}, retrying in {delay_secs}s"),
        ),
        AppEvent::Cleanup(CleanupEvent::BestEffortFailed {
            stage,
            step,
            failure,
        }) => (
            Warning,
            format!("{stage}: {step} skipped: {}", failure.message),
        ),
        AppEvent::Cleanup(CleanupEvent::DeviceRemoved { hardware_id }) => {
            (Status, format!("Removed device {hardware_id}"))
        }

        _ => return None,
    };
    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pvdrv_events::FailureContext;
    use pvdrv_types::CleanupStage;

    #[test]
    fn retry_is_shown_as_warning() {
        let event = AppEvent::Cleanup(CleanupEvent::UninstallRetryScheduled {
            product_code: "{ABC}".to_string(),
            attempt: 2,
            exit_code: 1618,
            delay_secs: 2,
        });
        let (kind, line) = status_line(&event).unwrap();
        assert_eq!(kind, LineKind::Warning);
        assert_eq!(line, "msiexec exited with 1618, retrying in 2s");
    }

    #[test]
    fn stage_failure_is_an_error_line() {
        let event = AppEvent::Cleanup(CleanupEvent::StageFailed {
            stage: CleanupStage::UninstallMsis,
            failure: FailureContext::new(None::<String>, "boom", None::<String>, true),
        });
        let (kind, line) = status_line(&event).unwrap();
        assert_eq!(kind, LineKind::Error);
        assert!(line.contains("uninstall_msis"));
    }

    #[test]
    fn gate_chatter_is_not_displayed() {
        assert!(status_line(&AppEvent::Driver(DriverEvent::GateCleared)).is_none());
        assert!(status_line(&AppEvent::General(GeneralEvent::debug("x"))).is_none());
    }

    #[test]
    fn quiet_handler_accepts_events() {
        let mut handler = EventHandler::new(false, true);
        handler.handle_event(&AppEvent::Driver(DriverEvent::InstallStarted {
            driver: "xenbus".to_string(),
            inf: "xenbus.inf".to_string(),
        }));
    }
}
