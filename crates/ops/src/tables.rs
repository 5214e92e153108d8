//! Fixed driver, service, device and product lists
//!
//! The orchestration code only iterates these tables; nothing else in the
//! crate spells out a driver or service name.

use pvdrv_types::Milestone;

/// A driver installed by the install flow, with the milestone recording it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverDescriptor {
    pub name: &'static str,
    pub milestone: Milestone,
}

/// Drivers in install order. The bus driver goes last so its children are
/// already staged when it re-enumerates them.
pub const DRIVERS: [DriverDescriptor; 5] = [
    DriverDescriptor {
        name: "xennet",
        milestone: Milestone::XenNetInstalled,
    },
    DriverDescriptor {
        name: "xenvif",
        milestone: Milestone::XenVifInstalled,
    },
    DriverDescriptor {
        name: "xenvbd",
        milestone: Milestone::XenVbdInstalled,
    },
    DriverDescriptor {
        name: "xeniface",
        milestone: Milestone::XenIfaceInstalled,
    },
    DriverDescriptor {
        name: "xenbus",
        milestone: Milestone::XenBusInstalled,
    },
];

/// Look up a driver by name (case-insensitive)
#[must_use]
pub fn driver(name: &str) -> Option<&'static DriverDescriptor> {
    DRIVERS.iter().find(|d| d.name.eq_ignore_ascii_case(name))
}

/// Filter services removed from every device class
pub const LEGACY_FILTERS: [&str; 2] = ["xenfilt", "scsifilt"];

/// Multi-string values under a class key that list filter services
pub const FILTER_VALUES: [&str; 2] = ["LowerFilters", "UpperFilters"];

/// Legacy services demoted to manual start
pub const BOOT_START_SERVICES: [&str; 10] = [
    "XENBUS",
    "xenfilt",
    "xeniface",
    "xenlite",
    "xennet",
    "xenvbd",
    "xenvif",
    "xennet6",
    "xenutil",
    "xenevtchn",
];

/// `SERVICE_DEMAND_START`
pub const MANUAL_START: u32 = 3;

/// Values under the unplug key that make the emulated devices disappear
pub const UNPLUG_VALUES: [&str; 2] = ["DISKS", "NICS"];

/// Display names of the legacy installer packages
pub const LEGACY_PRODUCTS: [&str; 5] = [
    "Citrix XenServer Windows Guest Agent",
    "Citrix XenServer VSS Provider",
    "Citrix Xen Windows x64 PV Drivers",
    "Citrix Xen Windows x86 PV Drivers",
    "Citrix XenServer Tools Installer",
];

/// Entry name below the Windows uninstall key
pub const LEGACY_UNINSTALL_ENTRY: &str = "Citrix XenTools";

/// Key and value holding the legacy install directory
pub const LEGACY_TOOLS_KEY: &str = r"SOFTWARE\Citrix\XenTools";
pub const LEGACY_INSTALL_DIR_VALUE: &str = "Install_Dir";

/// Bus device of the legacy tools
pub const LEGACY_BUS_DEVICE: &str = r"PCI\VEN_5853&DEV_0001";

/// Devices removed while purging; most are absent on any given system
pub const PURGE_HARDWARE_IDS: [&str; 14] = [
    r"XENBUS\VEN_XSC000&DEV_VIF",
    r"XENBUS\VEN_XS0001&DEV_VIF",
    r"XENBUS\VEN_XS0002&DEV_VIF",
    r"XENBUS\VEN_XSC000&DEV_VBD",
    r"XENBUS\VEN_XS0001&DEV_VBD",
    r"XENBUS\VEN_XS0002&DEV_VBD",
    r"XENBUS\VEN_XSC000&DEV_IFACE",
    r"XENBUS\VEN_XS0001&DEV_IFACE",
    r"XENBUS\VEN_XS0002&DEV_IFACE",
    r"XENVIF\VEN_XSC000&DEV_NET",
    r"XENVIF\VEN_XS0001&DEV_NET",
    r"XENVIF\VEN_XS0002&DEV_NET",
    r"ROOT\XENEVTCHN",
    r"PCI\VEN_5853&DEV_0002",
];

/// Service keys deleted while purging
pub const PURGE_SERVICES: [&str; 10] = [
    "xenbus",
    "xenfilt",
    "xeniface",
    "xenlite",
    "xennet",
    "xenvbd",
    "xenvif",
    "xennet6",
    "xenutil",
    "xenevtchn",
];

/// Server 2008 keeps the bus and filter services for the reinstall that follows
pub const PURGE_SERVICES_2K8: [&str; 8] = [
    "xeniface",
    "xenlite",
    "xennet",
    "xenvbd",
    "xenvif",
    "xennet6",
    "xenutil",
    "xenevtchn",
];

/// Base names of driver binaries under `System32\drivers`
pub const DRIVER_BINARIES: [&str; 11] = [
    "xenbus",
    "xenfilt",
    "xeniface",
    "xenlite",
    "xennet",
    "xenvbd",
    "xenvif",
    "xennet6",
    "xenutil",
    "xenevtchn",
    "scsifilt",
];

/// Service keys to purge for the given workaround setting
#[must_use]
pub fn purge_services(workaround_2k8: bool) -> &'static [&'static str] {
    if workaround_2k8 {
        &PURGE_SERVICES_2K8
    } else {
        &PURGE_SERVICES
    }
}
