#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for pvdrv
//!
//! This crate provides the fundamental types shared by every other crate:
//! the milestone ledger keys, the cleanup stage sequence, target architecture,
//! driver install parameters and the reports returned by the high level flows.

pub mod device;
pub mod milestone;
pub mod reports;
pub mod stage;

pub use device::{CopyPolicy, DeviceIdentity, InstallFlags, WaitTimeout};
pub use milestone::{Milestone, MilestoneStatus};
pub use reports::{CleanupReport, DriverFailure, InstallReport, StageReport};
pub use stage::CleanupStage;

use serde::{Deserialize, Serialize};

/// Architecture of the running operating system.
///
/// Resolved once per run and threaded through every path that depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetArch {
    X64,
    X86,
}

impl TargetArch {
    /// Directory name used inside a driver package tree (`x64` / `x86`)
    #[must_use]
    pub fn package_dir(self) -> &'static str {
        match self {
            Self::X64 => "x64",
            Self::X86 => "x86",
        }
    }

    /// Platform decoration used in INF section names (`amd64` / `x86`)
    #[must_use]
    pub fn inf_decoration(self) -> &'static str {
        match self {
            Self::X64 => "amd64",
            Self::X86 => "x86",
        }
    }

    /// Name of the install section carrying hardware IDs, e.g. `Inst.NTamd64`
    #[must_use]
    pub fn install_section(self) -> String {
        format!("Inst.NT{}", self.inf_decoration())
    }

    #[must_use]
    pub fn is_64bit(self) -> bool {
        matches!(self, Self::X64)
    }
}

impl std::fmt::Display for TargetArch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.package_dir())
    }
}

/// Operating system version as reported by the host (`major.minor`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OsVersion {
    pub major: u32,
    pub minor: u32,
}

impl OsVersion {
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Windows Vista / Server 2008 kernel line
    #[must_use]
    pub fn is_server_2008(self) -> bool {
        self.major == 6 && self.minor == 0
    }
}

impl std::fmt::Display for OsVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl std::str::FromStr for OsVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s
            .trim()
            .split_once('.')
            .ok_or_else(|| format!("invalid OS version: {s}"))?;
        let major = major
            .parse()
            .map_err(|_| format!("invalid OS major version: {s}"))?;
        let minor = minor
            .split('.')
            .next()
            .unwrap_or_default()
            .parse()
            .map_err(|_| format!("invalid OS minor version: {s}"))?;
        Ok(Self { major, minor })
    }
}

/// Whether the 2008 purge workaround applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Workaround2k8 {
    /// Decide from the reported OS version
    #[default]
    Auto,
    On,
    Off,
}

impl Workaround2k8 {
    #[must_use]
    pub fn resolve(self, os: OsVersion) -> bool {
        match self {
            Self::Auto => os.is_server_2008(),
            Self::On => true,
            Self::Off => false,
        }
    }
}

impl clap::ValueEnum for Workaround2k8 {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Auto, Self::On, Self::Off]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Auto => clap::builder::PossibleValue::new("auto"),
            Self::On => clap::builder::PossibleValue::new("on"),
            Self::Off => clap::builder::PossibleValue::new("off"),
        })
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    Always,
    #[default]
    Auto,
    Never,
}

impl clap::ValueEnum for ColorChoice {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Always, Self::Auto, Self::Never]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Always => clap::builder::PossibleValue::new("always"),
            Self::Auto => clap::builder::PossibleValue::new("auto"),
            Self::Never => clap::builder::PossibleValue::new("never"),
        })
    }
}
