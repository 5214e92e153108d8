#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Capability providers for driver installation on a Windows guest.
//!
//! The orchestration layer never touches the OS directly. Everything it needs
//! goes through the traits in this crate:
//! - Driver store staging, PnP driver binding and the pending-install wait
//! - Device removal by hardware ID
//! - External process execution (`msiexec`)
//! - Registry and MSI catalog access
//! - Filesystem removal and system facts (architecture, OS version)
//!
//! [`Platform::current`] wires the native implementations. Tests use
//! [`MemoryPlatform`], which keeps a fake system image and records every call.

pub mod core;
pub mod device;
pub mod driver_store;
pub mod filesystem;
pub mod implementations;
pub mod msi;
pub mod os_error;
pub mod process;
pub mod registry;
pub mod system;

pub use core::{Platform, PlatformBuilder, PlatformContext};
pub use device::DeviceOperations;
pub use driver_store::{DriverStoreOperations, InstallOutcome, WaitStatus};
pub use filesystem::FilesystemOperations;
pub use implementations::memory::MemoryPlatform;
pub use msi::MsiOperations;
pub use os_error::describe_os_error;
pub use process::{PlatformCommand, ProcessOperations};
pub use registry::{RegKeyPath, RegValue, RegistryOperations, RegistryView};
pub use system::SystemInfo;
