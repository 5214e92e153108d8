use serde::{Deserialize, Serialize};

use crate::EventSource;
use pvdrv_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    /// Stable error code, when the error has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod cleanup;
pub mod driver;
pub mod general;
pub mod platform;
pub mod state;

pub use cleanup::*;
pub use driver::*;
pub use general::*;
pub use platform::*;
pub use state::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (warnings, errors, operations)
    General(GeneralEvent),

    /// Driver staging, install gate and install events
    Driver(DriverEvent),

    /// Legacy cleanup pipeline events
    Cleanup(CleanupEvent),

    /// Capability provider events (external processes)
    Platform(PlatformEvent),

    /// Milestone ledger events
    State(StateEvent),
}

impl AppEvent {
    /// Identify the source domain for this event
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::General(_) => EventSource::GENERAL,
            Self::Driver(_) => EventSource::DRIVER,
            Self::Cleanup(_) => EventSource::CLEANUP,
            Self::Platform(_) => EventSource::PLATFORM,
            Self::State(_) => EventSource::STATE,
        }
    }

    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::General(GeneralEvent::Error { .. } | GeneralEvent::OperationFailed { .. })
            | Self::Driver(DriverEvent::InstallFailed { .. } | DriverEvent::StageFailed { .. })
            | Self::Cleanup(CleanupEvent::StageFailed { .. })
            | Self::Platform(PlatformEvent::ProcessFailed { .. }) => Level::ERROR,

            Self::General(GeneralEvent::Warning { .. })
            | Self::Driver(DriverEvent::GateTimedOut { .. })
            | Self::Cleanup(
                CleanupEvent::BestEffortFailed { .. } | CleanupEvent::UninstallRetryScheduled { .. },
            ) => Level::WARN,

            Self::General(GeneralEvent::DebugLog { .. })
            | Self::Driver(DriverEvent::GateWaiting { .. } | DriverEvent::GateCleared)
            | Self::Cleanup(
                CleanupEvent::FiltersRewritten { .. }
                | CleanupEvent::ServiceStartChanged { .. }
                | CleanupEvent::RemnantAbsent { .. },
            )
            | Self::Platform(PlatformEvent::ProcessStarted { .. }) => Level::DEBUG,

            _ => Level::INFO,
        }
    }

    /// Get the log target for this event
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::General(_) => "pvdrv::events::general",
            Self::Driver(_) => "pvdrv::events::driver",
            Self::Cleanup(_) => "pvdrv::events::cleanup",
            Self::Platform(_) => "pvdrv::events::platform",
            Self::State(_) => "pvdrv::events::state",
        }
    }
}
