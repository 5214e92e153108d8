#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for pvdrv
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (`<config dir>/pvdrv/config.toml` or `--config`)
//! - Environment variables (`PVDRV_*`)
//! - CLI flags (applied by the binary)

pub mod constants;

use pvdrv_errors::{ConfigError, Error};
use pvdrv_types::{ColorChoice, CopyPolicy, WaitTimeout, Workaround2k8};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub paths: PathConfig,

    #[serde(default)]
    pub install: InstallConfig,

    #[serde(default)]
    pub cleanup: CleanupConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_color_choice")]
    pub color: ColorChoice,
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    pub driver_root: Option<PathBuf>,
    pub state_path: Option<PathBuf>,
    pub logs_dir: Option<PathBuf>,
}

/// Driver install configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallConfig {
    /// Seconds to wait for pending device installs; absent means no limit
    #[serde(default)]
    pub gate_timeout_secs: Option<u32>,
    #[serde(default)]
    pub copy_policy: CopyPolicy,
}

/// Legacy cleanup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    #[serde(default = "default_uninstall_attempts")]
    pub uninstall_attempts: u32,
    #[serde(default)]
    pub workaround_2k8: Workaround2k8,
    #[serde(default = "default_msiexec")]
    pub msiexec: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            color: ColorChoice::Auto,
        }
    }
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            gate_timeout_secs: None,
            copy_policy: CopyPolicy::NewerOnly,
        }
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            uninstall_attempts: 5,
            workaround_2k8: Workaround2k8::Auto,
            msiexec: PathBuf::from(constants::MSIEXEC),
        }
    }
}

fn default_color_choice() -> ColorChoice {
    ColorChoice::Auto
}

fn default_uninstall_attempts() -> u32 {
    5
}

fn default_msiexec() -> PathBuf {
    PathBuf::from(constants::MSIEXEC)
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("pvdrv").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML or
    /// fails validation.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config: Self = toml::from_str(&contents).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Ok(root) = std::env::var("PVDRV_DRIVER_ROOT") {
            self.paths.driver_root = Some(PathBuf::from(root));
        }

        if let Ok(state) = std::env::var("PVDRV_STATE_PATH") {
            self.paths.state_path = Some(PathBuf::from(state));
        }

        if let Ok(logs) = std::env::var("PVDRV_LOGS_DIR") {
            self.paths.logs_dir = Some(PathBuf::from(logs));
        }

        // PVDRV_GATE_TIMEOUT: seconds or "infinite"
        if let Ok(timeout) = std::env::var("PVDRV_GATE_TIMEOUT") {
            self.install.gate_timeout_secs = if timeout.eq_ignore_ascii_case("infinite") {
                None
            } else {
                Some(timeout.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "PVDRV_GATE_TIMEOUT".to_string(),
                    value: timeout,
                })?)
            };
        }

        if let Ok(attempts) = std::env::var("PVDRV_UNINSTALL_ATTEMPTS") {
            self.cleanup.uninstall_attempts =
                attempts.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "PVDRV_UNINSTALL_ATTEMPTS".to_string(),
                    value: attempts,
                })?;
        }

        if let Ok(mode) = std::env::var("PVDRV_WORKAROUND_2K8") {
            self.cleanup.workaround_2k8 = match mode.as_str() {
                "auto" => Workaround2k8::Auto,
                "on" | "true" | "1" => Workaround2k8::On,
                "off" | "false" | "0" => Workaround2k8::Off,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "PVDRV_WORKAROUND_2K8".to_string(),
                        value: mode,
                    }
                    .into())
                }
            };
        }

        if let Ok(color) = std::env::var("PVDRV_COLOR") {
            self.general.color = match color.as_str() {
                "always" => ColorChoice::Always,
                "auto" => ColorChoice::Auto,
                "never" => ColorChoice::Never,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "PVDRV_COLOR".to_string(),
                        value: color,
                    }
                    .into())
                }
            };
        }

        self.validate()
    }

    /// Reject values no run could succeed with
    ///
    /// # Errors
    ///
    /// Returns an error if the uninstall budget is zero.
    pub fn validate(&self) -> Result<(), Error> {
        if self.cleanup.uninstall_attempts == 0 {
            return Err(ConfigError::Invalid {
                message: "cleanup.uninstall_attempts must be at least 1".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Root of the driver package tree (with default)
    #[must_use]
    pub fn driver_root(&self) -> PathBuf {
        self.paths
            .driver_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(constants::DRIVER_ROOT))
    }

    /// Milestone database path (with default)
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.paths
            .state_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(constants::DB_PATH))
    }

    /// Log directory (with default)
    #[must_use]
    pub fn logs_dir(&self) -> PathBuf {
        self.paths
            .logs_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(constants::LOGS_DIR))
    }

    /// Install-pending gate timeout
    #[must_use]
    pub fn gate_timeout(&self) -> WaitTimeout {
        self.install
            .gate_timeout_secs
            .map_or(WaitTimeout::Infinite, WaitTimeout::Seconds)
    }
}
