//! Structured logging integration for events
//!
//! Converts domain events into tracing records with structured fields so the
//! JSON log file carries every product code, stage and OS error code.

use pvdrv_events::{
    AppEvent, CleanupEvent, DriverEvent, GeneralEvent, PlatformEvent, StateEvent,
};
use tracing::{debug, error, info, warn};

/// Log an `AppEvent` using the tracing infrastructure with structured fields
pub fn log_event_with_tracing(event: &AppEvent) {
    let source = event.event_source();
    let source = source.as_str();

    match event {
        AppEvent::General(general) => match general {
            GeneralEvent::Warning { message, context } => {
                warn!(source, context = ?context, "{message}");
            }
            GeneralEvent::Error { message, details } => {
                error!(source, details = ?details, "{message}");
            }
            GeneralEvent::DebugLog { message, context } => {
                debug!(source, context = ?context, "{message}");
            }
            GeneralEvent::OperationStarted { operation } => {
                info!(source, operation = %operation, "Operation started");
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                info!(source, operation = %operation, success, "Operation completed");
            }
            GeneralEvent::OperationFailed { operation, error } => {
                error!(source, operation = %operation, error = %error, "Operation failed");
            }
        },

        AppEvent::Driver(driver_event) => match driver_event {
            DriverEvent::GateWaiting { timeout } => {
                debug!(source, timeout = %timeout, "Waiting for pending device installs");
            }
            DriverEvent::GateCleared => {
                debug!(source, "No device installs pending");
            }
            DriverEvent::GateTimedOut { timeout } => {
                warn!(source, timeout = %timeout, "Device installs still pending after timeout");
            }
            DriverEvent::StageCompleted { driver, inf } => {
                info!(source, driver = %driver, inf = %inf, "Package staged");
            }
            DriverEvent::StageFailed {
                driver,
                inf,
                code,
                message,
            } => {
                error!(
                    source,
                    driver = %driver,
                    inf = %inf,
                    os_code = code,
                    message = %message,
                    "Package staging failed"
                );
            }
            DriverEvent::InstallStarted { driver, inf } => {
                info!(source, driver = %driver, inf = %inf, "Driver install started");
            }
            DriverEvent::InstallCompleted {
                driver,
                reboot_required,
            } => {
                info!(source, driver = %driver, reboot_required, "Driver installed");
            }
            DriverEvent::InstallSkipped { driver, milestone } => {
                info!(source, driver = %driver, milestone = %milestone, "Driver already installed");
            }
            DriverEvent::InstallFailed { driver, failure } => {
                error!(
                    source,
                    driver = %driver,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Driver install failed"
                );
            }
            DriverEvent::HardwareIdResolved {
                driver,
                device,
                hardware_id,
            } => {
                info!(
                    source,
                    driver = %driver,
                    device = %device,
                    hardware_id = %hardware_id,
                    "Hardware ID resolved"
                );
            }
        },

        AppEvent::Cleanup(cleanup_event) => log_cleanup_event(source, cleanup_event),

        AppEvent::Platform(platform_event) => match platform_event {
            PlatformEvent::ProcessStarted { command, args } => {
                debug!(source, command = %command, args = ?args, "Process started");
            }
            PlatformEvent::ProcessCompleted {
                command,
                exit_code,
                duration_ms,
            } => {
                info!(source, command = %command, exit_code, duration_ms, "Process exited");
            }
            PlatformEvent::ProcessFailed {
                command,
                error_message,
                duration_ms,
            } => {
                error!(
                    source,
                    command = %command,
                    error = %error_message,
                    duration_ms,
                    "Process failed to run"
                );
            }
        },

        AppEvent::State(state_event) => match state_event {
            StateEvent::Opened {
                location,
                milestones_set,
            } => {
                info!(source, location = %location, milestones_set, "Milestone ledger opened");
            }
            StateEvent::MilestoneSet { milestone, set_at } => {
                info!(source, milestone = %milestone, set_at = %set_at, "Milestone recorded");
            }
        },
    }
}

fn log_cleanup_event(source: &str, event: &CleanupEvent) {
    match event {
        CleanupEvent::StageStarted { stage } => {
            info!(source, stage = %stage, "Cleanup stage started");
        }
        CleanupEvent::StageCompleted { stage, duration_ms } => {
            info!(source, stage = %stage, duration_ms, "Cleanup stage completed");
        }
        CleanupEvent::StageSkipped { stage } => {
            info!(source, stage = %stage, "Cleanup stage already completed");
        }
        CleanupEvent::StageFailed { stage, failure } => {
            error!(
                source,
                stage = %stage,
                retryable = failure.retryable,
                code = ?failure.code,
                message = %failure.message,
                hint = ?failure.hint,
                "Cleanup stage failed"
            );
        }
        CleanupEvent::FiltersRewritten {
            class_key,
            value,
            removed,
        } => {
            debug!(source, class_key = %class_key, value = %value, removed = ?removed, "Filters rewritten");
        }
        CleanupEvent::ServiceStartChanged { service, previous } => {
            debug!(source, service = %service, previous, "Service start type set to manual");
        }
        CleanupEvent::ProductResolved {
            display_name,
            product_code,
        } => {
            info!(source, display_name = %display_name, product_code = %product_code, "Product resolved");
        }
        CleanupEvent::UninstallAttempt {
            product_code,
            attempt,
            max_attempts,
        } => {
            info!(source, product_code = %product_code, attempt, max_attempts, "Uninstall attempt");
        }
        CleanupEvent::UninstallRetryScheduled {
            product_code,
            attempt,
            exit_code,
            delay_secs,
        } => {
            warn!(
                source,
                product_code = %product_code,
                attempt,
                exit_code,
                delay_secs,
                "Uninstall failed, retrying"
            );
        }
        CleanupEvent::UninstallSucceeded {
            product_code,
            exit_code,
            reboot_required,
        } => {
            info!(source, product_code = %product_code, exit_code, reboot_required, "Product uninstalled");
        }
        CleanupEvent::BestEffortFailed {
            stage,
            step,
            failure,
        } => {
            warn!(
                source,
                stage = %stage,
                step = %step,
                code = ?failure.code,
                message = %failure.message,
                "Best-effort step failed"
            );
        }
        CleanupEvent::DeviceRemoved { hardware_id } => {
            info!(source, hardware_id = %hardware_id, "Device removed");
        }
        CleanupEvent::RemnantAbsent { kind, name } => {
            debug!(source, kind = %kind, name = %name, "Remnant not present");
        }
    }
}
