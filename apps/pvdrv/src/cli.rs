//! Command line interface definition

use clap::{Parser, Subcommand};
use pvdrv_types::{ColorChoice, DeviceIdentity, WaitTimeout, Workaround2k8};
use std::path::PathBuf;

/// pvdrv - Xen PV driver installer for Windows guests
#[derive(Parser)]
#[command(name = "pvdrv")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Xen PV driver installer and legacy tools cleanup for Windows guests")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging to the logs directory
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Root of the driver package tree (`<root>\<driver>\<arch>\<driver>.inf`)
    #[arg(long, global = true, value_name = "DIR")]
    pub driver_root: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Install the PV drivers that are not installed yet
    Install {
        /// Install a single driver (xennet, xenvif, xenvbd, xeniface, xenbus)
        #[arg(long, value_name = "NAME")]
        driver: Option<String>,
    },

    /// Stage every driver package into the driver store without binding
    Stage {
        /// Replace staged packages even when they are not older
        #[arg(long)]
        overwrite: bool,
    },

    /// Bind a driver to the hardware ID its package declares for a device
    #[command(name = "install-hwid")]
    InstallHwid {
        /// Driver package name
        driver: String,

        /// Platform device identity (DEV_0001, DEV_0002 or DEV_C000)
        device: DeviceIdentity,
    },

    /// Remove a legacy Citrix tools installation
    Clean {
        /// Server 2008 purge workaround
        #[arg(long = "workaround-2k8", value_enum, value_name = "MODE")]
        workaround_2k8: Option<Workaround2k8>,
    },

    /// Wait until no device installs are pending
    Wait {
        /// Seconds to wait, or `infinite`
        #[arg(long, value_name = "SECS", value_parser = parse_timeout)]
        timeout: Option<WaitTimeout>,
    },

    /// Show which milestones are recorded
    Status,
}

impl Commands {
    /// Operation name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Install { .. } => "install",
            Commands::Stage { .. } => "stage",
            Commands::InstallHwid { .. } => "install-hwid",
            Commands::Clean { .. } => "clean",
            Commands::Wait { .. } => "wait",
            Commands::Status => "status",
        }
    }
}

fn parse_timeout(value: &str) -> Result<WaitTimeout, String> {
    if value.eq_ignore_ascii_case("infinite") {
        return Ok(WaitTimeout::Infinite);
    }
    value
        .parse()
        .map(WaitTimeout::Seconds)
        .map_err(|_| format!("invalid timeout '{value}': expected seconds or 'infinite'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_accepts_seconds_and_infinite() {
        assert_eq!(parse_timeout("30").unwrap(), WaitTimeout::Seconds(30));
        assert_eq!(parse_timeout("INFINITE").unwrap(), WaitTimeout::Infinite);
        assert!(parse_timeout("-1").is_err());
    }

    #[test]
    fn install_hwid_parses_device_identity() {
        let cli = Cli::try_parse_from(["pvdrv", "install-hwid", "xenbus", "DEV_C000"]).unwrap();
        match cli.command {
            Commands::InstallHwid { driver, device } => {
                assert_eq!(driver, "xenbus");
                assert_eq!(device, DeviceIdentity::DevC000);
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn clean_takes_workaround_mode() {
        let cli = Cli::try_parse_from(["pvdrv", "clean", "--workaround-2k8", "on", "--json"])
            .unwrap();
        assert!(cli.global.json);
        assert!(matches!(
            cli.command,
            Commands::Clean {
                workaround_2k8: Some(Workaround2k8::On)
            }
        ));
    }

    #[test]
    fn unknown_device_is_rejected() {
        assert!(Cli::try_parse_from(["pvdrv", "install-hwid", "xenbus", "DEV_9999"]).is_err());
    }
}
