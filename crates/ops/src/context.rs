//! Operations context for dependency injection

use pvdrv_config::Config;
use pvdrv_errors::{Error, OpsError};
use pvdrv_events::{EventEmitter, EventSender};
use pvdrv_platform::{Platform, PlatformContext};
use pvdrv_state::FlagStore;
use pvdrv_types::TargetArch;
use std::sync::Arc;

/// Operations context providing access to all system components
pub struct OpsCtx {
    /// Capability providers
    pub platform: Platform,
    /// Milestone ledger
    pub state: Arc<dyn FlagStore>,
    /// Event sender for progress reporting
    pub tx: EventSender,
    /// System configuration
    pub config: Config,
    /// Architecture of the running OS, resolved once when the context is built
    pub arch: TargetArch,
    platform_ctx: PlatformContext,
}

impl OpsCtx {
    // No public constructor - use OpsContextBuilder instead

    /// Context handed to capability calls; carries the same event sender
    #[must_use]
    pub fn platform_context(&self) -> &PlatformContext {
        &self.platform_ctx
    }
}

impl EventEmitter for OpsCtx {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.tx)
    }
}

/// Builder for operations context
pub struct OpsContextBuilder {
    platform: Option<Platform>,
    state: Option<Arc<dyn FlagStore>>,
    tx: Option<EventSender>,
    config: Option<Config>,
    arch: Option<TargetArch>,
}

impl OpsContextBuilder {
    /// Create new context builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            platform: None,
            state: None,
            tx: None,
            config: None,
            arch: None,
        }
    }

    /// Set capability providers
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Set milestone ledger
    #[must_use]
    pub fn with_state(mut self, state: Arc<dyn FlagStore>) -> Self {
        self.state = Some(state);
        self
    }

    /// Set event sender
    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Set configuration
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Override the architecture reported by the platform
    #[must_use]
    pub fn with_arch(mut self, arch: TargetArch) -> Self {
        self.arch = Some(arch);
        self
    }

    /// Build the context
    ///
    /// # Errors
    ///
    /// Returns an error if any required component is missing.
    pub fn build(self) -> Result<OpsCtx, Error> {
        let platform = self
            .platform
            .ok_or_else(|| OpsError::MissingComponent {
                component: "platform".to_string(),
            })?;

        let state = self.state.ok_or_else(|| OpsError::MissingComponent {
            component: "state".to_string(),
        })?;

        let tx = self.tx.ok_or_else(|| OpsError::MissingComponent {
            component: "event_sender".to_string(),
        })?;

        let config = self.config.ok_or_else(|| OpsError::MissingComponent {
            component: "config".to_string(),
        })?;

        let arch = self
            .arch
            .unwrap_or_else(|| platform.system().target_arch());
        let platform_ctx = platform.create_context(Some(tx.clone()));

        Ok(OpsCtx {
            platform,
            state,
            tx,
            config,
            arch,
            platform_ctx,
        })
    }
}

impl Default for OpsContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
