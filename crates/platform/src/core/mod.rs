//! Core platform abstractions and context management

use pvdrv_errors::PlatformError;
use pvdrv_events::{AppEvent, EventEmitter, EventSender};

use crate::device::DeviceOperations;
use crate::driver_store::DriverStoreOperations;
use crate::filesystem::FilesystemOperations;
use crate::msi::MsiOperations;
use crate::process::ProcessOperations;
use crate::registry::RegistryOperations;
use crate::system::SystemInfo;

/// Context for platform operations, providing event emission
#[derive(Clone, Default)]
pub struct PlatformContext {
    event_sender: Option<EventSender>,
}

impl PlatformContext {
    /// Create a new platform context with event emission capabilities
    #[must_use]
    pub fn new(event_sender: Option<EventSender>) -> Self {
        Self { event_sender }
    }

    /// Emit a platform event if event sender is available
    pub fn emit_event(&self, event: AppEvent) {
        self.emit(event);
    }
}

impl EventEmitter for PlatformContext {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

/// Main platform abstraction providing access to all capability providers
pub struct Platform {
    driver_store: Box<dyn DriverStoreOperations>,
    devices: Box<dyn DeviceOperations>,
    process: Box<dyn ProcessOperations>,
    registry: Box<dyn RegistryOperations>,
    msi: Box<dyn MsiOperations>,
    filesystem: Box<dyn FilesystemOperations>,
    system: Box<dyn SystemInfo>,
}

impl Platform {
    /// Start assembling a platform from individual providers
    #[must_use]
    pub fn builder() -> PlatformBuilder {
        PlatformBuilder::default()
    }

    /// Native providers for the running host
    ///
    /// # Errors
    ///
    /// Returns `CapabilityUnavailable` when not running on Windows.
    #[cfg(windows)]
    pub fn current() -> Result<Self, PlatformError> {
        use crate::implementations::host::{HostFilesystemOperations, HostProcessOperations};
        use crate::implementations::windows::{
            WindowsDeviceOperations, WindowsDriverStoreOperations, WindowsMsiOperations,
            WindowsRegistryOperations, WindowsSystemInfo,
        };

        Self::builder()
            .driver_store(WindowsDriverStoreOperations::new())
            .devices(WindowsDeviceOperations::new())
            .process(HostProcessOperations::new())
            .registry(WindowsRegistryOperations::new())
            .msi(WindowsMsiOperations::new())
            .filesystem(HostFilesystemOperations::new())
            .system(WindowsSystemInfo::new())
            .build()
    }

    /// Native providers for the running host
    ///
    /// # Errors
    ///
    /// Returns `CapabilityUnavailable` when not running on Windows.
    #[cfg(not(windows))]
    pub fn current() -> Result<Self, PlatformError> {
        Err(PlatformError::CapabilityUnavailable {
            capability: "windows driver installation".to_string(),
        })
    }

    /// Access driver store operations
    #[must_use]
    pub fn driver_store(&self) -> &dyn DriverStoreOperations {
        &*self.driver_store
    }

    /// Access device operations
    #[must_use]
    pub fn devices(&self) -> &dyn DeviceOperations {
        &*self.devices
    }

    /// Access process operations
    #[must_use]
    pub fn process(&self) -> &dyn ProcessOperations {
        &*self.process
    }

    /// Access registry operations
    #[must_use]
    pub fn registry(&self) -> &dyn RegistryOperations {
        &*self.registry
    }

    /// Access the installed product catalog
    #[must_use]
    pub fn msi(&self) -> &dyn MsiOperations {
        &*self.msi
    }

    /// Access filesystem operations
    #[must_use]
    pub fn filesystem(&self) -> &dyn FilesystemOperations {
        &*self.filesystem
    }

    /// Access system facts
    #[must_use]
    pub fn system(&self) -> &dyn SystemInfo {
        &*self.system
    }

    /// Create a platform context with event emission
    #[must_use]
    pub fn create_context(&self, event_sender: Option<EventSender>) -> PlatformContext {
        PlatformContext::new(event_sender)
    }
}

/// Assembles a [`Platform`]; every provider must be supplied
#[derive(Default)]
pub struct PlatformBuilder {
    driver_store: Option<Box<dyn DriverStoreOperations>>,
    devices: Option<Box<dyn DeviceOperations>>,
    process: Option<Box<dyn ProcessOperations>>,
    registry: Option<Box<dyn RegistryOperations>>,
    msi: Option<Box<dyn MsiOperations>>,
    filesystem: Option<Box<dyn FilesystemOperations>>,
    system: Option<Box<dyn SystemInfo>>,
}

impl PlatformBuilder {
    #[must_use]
    pub fn driver_store(mut self, ops: impl DriverStoreOperations + 'static) -> Self {
        self.driver_store = Some(Box::new(ops));
        self
    }

    #[must_use]
    pub fn devices(mut self, ops: impl DeviceOperations + 'static) -> Self {
        self.devices = Some(Box::new(ops));
        self
    }

    #[must_use]
    pub fn process(mut self, ops: impl ProcessOperations + 'static) -> Self {
        self.process = Some(Box::new(ops));
        self
    }

    #[must_use]
    pub fn registry(mut self, ops: impl RegistryOperations + 'static) -> Self {
        self.registry = Some(Box::new(ops));
        self
    }

    #[must_use]
    pub fn msi(mut self, ops: impl MsiOperations + 'static) -> Self {
        self.msi = Some(Box::new(ops));
        self
    }

    #[must_use]
    pub fn filesystem(mut self, ops: impl FilesystemOperations + 'static) -> Self {
        self.filesystem = Some(Box::new(ops));
        self
    }

    #[must_use]
    pub fn system(mut self, ops: impl SystemInfo + 'static) -> Self {
        self.system = Some(Box::new(ops));
        self
    }

    /// Build the platform
    ///
    /// # Errors
    ///
    /// Returns `CapabilityUnavailable` naming the first provider that was not set.
    pub fn build(self) -> Result<Platform, PlatformError> {
        Ok(Platform {
            driver_store: require(self.driver_store, "driver store")?,
            devices: require(self.devices, "device removal")?,
            process: require(self.process, "process launcher")?,
            registry: require(self.registry, "registry")?,
            msi: require(self.msi, "msi catalog")?,
            filesystem: require(self.filesystem, "filesystem")?,
            system: require(self.system, "system info")?,
        })
    }
}

fn require<T: ?Sized>(value: Option<Box<T>>, capability: &str) -> Result<Box<T>, PlatformError> {
    value.ok_or_else(|| PlatformError::CapabilityUnavailable {
        capability: capability.to_string(),
    })
}
