//! System setup and initialization

use crate::error::CliError;
use pvdrv_config::Config;
use pvdrv_events::EventSender;
use pvdrv_platform::Platform;
use pvdrv_state::StateManager;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Components every command needs, opened once at startup
pub struct SystemSetup {
    state: Arc<StateManager>,
    platform: Platform,
}

impl SystemSetup {
    /// Create data directories, open the milestone ledger and wire the
    /// native capability providers
    pub async fn initialize(config: &Config, tx: EventSender) -> Result<Self, CliError> {
        info!("Initializing pvdrv system components");

        ensure_directories(config).await?;

        // Fails early off Windows so no milestone is ever touched there
        let platform = Platform::current()?;

        let db_path = config.db_path();
        debug!(path = %db_path.display(), "Opening milestone ledger");
        let state = StateManager::open(&db_path, Some(tx))
            .await
            .map_err(|e| CliError::Setup(format!("Failed to open state database: {e}")))?;

        info!("System initialization completed");
        Ok(Self {
            state: Arc::new(state),
            platform,
        })
    }

    /// Hand the capability providers to the ops context
    pub fn into_parts(self) -> (Arc<StateManager>, Platform) {
        (self.state, self.platform)
    }
}

async fn ensure_directories(config: &Config) -> Result<(), CliError> {
    let mut required: Vec<PathBuf> = vec![config.logs_dir()];
    if let Some(parent) = config
        .db_path()
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
    {
        required.push(parent.to_path_buf());
    }

    for dir in &required {
        if !dir.exists() {
            debug!("Creating directory: {}", dir.display());
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                CliError::Setup(format!("Failed to create {}: {e}", dir.display()))
            })?;
        }
    }

    Ok(())
}
