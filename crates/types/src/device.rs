//! Device and driver install parameters

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Known identities of the paravirtual platform PCI device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceIdentity {
    #[serde(rename = "DEV_0001")]
    Dev0001,
    #[serde(rename = "DEV_0002")]
    Dev0002,
    #[serde(rename = "DEV_C000")]
    DevC000,
}

impl DeviceIdentity {
    pub const ALL: [DeviceIdentity; 3] = [Self::Dev0001, Self::Dev0002, Self::DevC000];

    /// Device ID digits as they appear after `DEV_`
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Dev0001 => "0001",
            Self::Dev0002 => "0002",
            Self::DevC000 => "C000",
        }
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DEV_{}", self.code())
    }
}

impl FromStr for DeviceIdentity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let code = upper.strip_prefix("DEV_").unwrap_or(&upper);
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.code() == code)
            .ok_or_else(|| format!("unknown device identity '{s}' (expected DEV_0001, DEV_0002 or DEV_C000)"))
    }
}

/// How a package is copied into the driver store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyPolicy {
    /// Only replace a staged package when ours is newer
    #[default]
    NewerOnly,
    /// Always replace the staged package
    Overwrite,
}

/// Flags passed through to PnP install calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallFlags {
    /// Install even when the store holds a better-ranked match
    pub force: bool,
    /// Never show UI
    pub non_interactive: bool,
}

impl Default for InstallFlags {
    fn default() -> Self {
        Self {
            force: true,
            non_interactive: true,
        }
    }
}

/// Upper bound on how long to wait for pending device installs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitTimeout {
    Infinite,
    Seconds(u32),
}

impl WaitTimeout {
    /// Value accepted by the OS wait call (`u32::MAX` means forever)
    #[must_use]
    pub fn as_millis(self) -> u32 {
        match self {
            Self::Infinite => u32::MAX,
            Self::Seconds(secs) => secs.saturating_mul(1000).min(u32::MAX - 1),
        }
    }
}

impl fmt::Display for WaitTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Infinite => f.write_str("infinite"),
            Self::Seconds(secs) => write!(f, "{secs}s"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_identity_accepts_both_spellings() {
        assert_eq!("DEV_C000".parse::<DeviceIdentity>().unwrap(), DeviceIdentity::DevC000);
        assert_eq!("c000".parse::<DeviceIdentity>().unwrap(), DeviceIdentity::DevC000);
        assert_eq!("dev_0002".parse::<DeviceIdentity>().unwrap(), DeviceIdentity::Dev0002);
        assert!("DEV_0003".parse::<DeviceIdentity>().is_err());
    }

    #[test]
    fn finite_timeout_never_collides_with_infinite() {
        assert_eq!(WaitTimeout::Infinite.as_millis(), u32::MAX);
        assert_eq!(WaitTimeout::Seconds(30).as_millis(), 30_000);
        assert_ne!(WaitTimeout::Seconds(u32::MAX).as_millis(), u32::MAX);
    }
}
