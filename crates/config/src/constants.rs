//! Fixed locations used by pvdrv
//!
//! Registry paths are relative to `HKEY_LOCAL_MACHINE`. Filesystem paths are
//! defaults only; the `[paths]` section can override them.

pub const DATA_DIR: &str = r"C:\ProgramData\pvdrv";
pub const DB_PATH: &str = r"C:\ProgramData\pvdrv\state.sqlite";
pub const LOGS_DIR: &str = r"C:\ProgramData\pvdrv\logs";
pub const DRIVER_ROOT: &str = r"C:\ProgramData\pvdrv\drivers";

pub const MSIEXEC: &str = "msiexec.exe";

pub const CLASS_KEY: &str = r"SYSTEM\CurrentControlSet\Control\Class";
pub const SERVICES_KEY: &str = r"SYSTEM\CurrentControlSet\Services";
pub const UNPLUG_KEY: &str = r"SYSTEM\CurrentControlSet\Services\XEN\Unplug";
pub const UNINSTALL_KEY: &str = r"SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall";
