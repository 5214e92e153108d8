//! In-memory capability providers
//!
//! [`MemoryPlatform`] keeps a small fake system image (registry, product
//! catalog, device list, files, scripted process exit codes) behind a shared
//! lock and implements every capability trait on top of it. Each capability
//! call is appended to a call log so callers can assert on what ran.

use async_trait::async_trait;
use pvdrv_errors::PlatformError;
use pvdrv_types::{CopyPolicy, InstallFlags, OsVersion, TargetArch, WaitTimeout};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::{Platform, PlatformContext};
use crate::device::DeviceOperations;
use crate::driver_store::{DriverStoreOperations, InstallOutcome, WaitStatus};
use crate::filesystem::FilesystemOperations;
use crate::msi::MsiOperations;
use crate::os_error::{describe_os_error, os_call_failed, registry_failed};
use crate::process::{PlatformCommand, ProcessOperations};
use crate::registry::{RegKeyPath, RegValue, RegistryOperations, RegistryView};
use crate::system::SystemInfo;

const ERROR_FILE_NOT_FOUND: u32 = 2;
const ERROR_ACCESS_DENIED: u32 = 5;

type KeyId = (RegistryView, String);

#[derive(Debug, Default)]
struct RegKeyNode {
    name: String,
    // lowercase name -> (original name, value)
    values: BTreeMap<String, (String, RegValue)>,
}

#[derive(Debug)]
struct SystemImage {
    arch: TargetArch,
    os_version: OsVersion,
    drivers_dir: PathBuf,

    registry: BTreeMap<KeyId, RegKeyNode>,
    denied_keys: BTreeSet<KeyId>,

    products: Vec<(String, Option<String>)>,
    enum_failure: Option<u32>,

    devices: Vec<String>,

    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
    undeletable: BTreeSet<PathBuf>,

    exit_codes: VecDeque<i32>,
    default_exit_code: i32,
    commands: Vec<PlatformCommand>,

    wait_status: WaitStatus,
    stage_failures: HashMap<String, u32>,
    install_failures: HashMap<String, u32>,
    reboot_required: bool,
    staged: Vec<PathBuf>,
    installed: Vec<PathBuf>,
    bound: Vec<(String, PathBuf)>,

    calls: Vec<String>,
}

impl Default for SystemImage {
    fn default() -> Self {
        Self {
            arch: TargetArch::X64,
            os_version: OsVersion::new(10, 0),
            drivers_dir: PathBuf::from(r"C:\Windows\System32\drivers"),
            registry: BTreeMap::new(),
            denied_keys: BTreeSet::new(),
            products: Vec::new(),
            enum_failure: None,
            devices: Vec::new(),
            files: BTreeMap::new(),
            dirs: BTreeSet::new(),
            undeletable: BTreeSet::new(),
            exit_codes: VecDeque::new(),
            default_exit_code: 0,
            commands: Vec::new(),
            wait_status: WaitStatus::Signaled,
            stage_failures: HashMap::new(),
            install_failures: HashMap::new(),
            reboot_required: false,
            staged: Vec::new(),
            installed: Vec::new(),
            bound: Vec::new(),
            calls: Vec::new(),
        }
    }
}

fn key_id(key: &RegKeyPath) -> KeyId {
    (key.view, key.path.trim_end_matches('\\').to_ascii_lowercase())
}

fn file_key(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

impl SystemImage {
    fn record(&mut self, call: String) {
        self.calls.push(call);
    }

    fn ensure_key(&mut self, key: &RegKeyPath) {
        let path = key.path.trim_end_matches('\\');
        let mut prefix = String::new();
        for part in path.split('\\') {
            if !prefix.is_empty() {
                prefix.push('\\');
            }
            prefix.push_str(part);
            self.registry
                .entry((key.view, prefix.to_ascii_lowercase()))
                .or_insert_with(|| RegKeyNode {
                    name: part.to_string(),
                    values: BTreeMap::new(),
                });
        }
    }

    fn check_access(&self, key: &RegKeyPath, operation: &str) -> Result<(), PlatformError> {
        if self.denied_keys.contains(&key_id(key)) {
            return Err(registry_failed(operation, key, ERROR_ACCESS_DENIED));
        }
        Ok(())
    }
}

/// In-memory implementation of every capability trait
#[derive(Clone, Default)]
pub struct MemoryPlatform {
    image: Arc<Mutex<SystemImage>>,
}

impl MemoryPlatform {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SystemImage> {
        // A panic while holding the lock only happens inside a failing test
        match self.image.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// A [`Platform`] whose providers all share this system image
    #[must_use]
    pub fn platform(&self) -> Platform {
        Platform::builder()
            .driver_store(self.clone())
            .devices(self.clone())
            .process(self.clone())
            .registry(self.clone())
            .msi(self.clone())
            .filesystem(self.clone())
            .system(self.clone())
            .build()
            .unwrap_or_else(|_| unreachable!("every provider is set"))
    }

    // Setup

    #[must_use]
    pub fn with_arch(self, arch: TargetArch) -> Self {
        self.lock().arch = arch;
        self
    }

    #[must_use]
    pub fn with_os_version(self, version: OsVersion) -> Self {
        self.lock().os_version = version;
        self
    }

    #[must_use]
    pub fn with_drivers_dir(self, dir: impl Into<PathBuf>) -> Self {
        self.lock().drivers_dir = dir.into();
        self
    }

    /// Create a key (and its parents) without values
    #[must_use]
    pub fn with_key(self, key: &RegKeyPath) -> Self {
        self.lock().ensure_key(key);
        self
    }

    #[must_use]
    pub fn with_value(self, key: &RegKeyPath, name: &str, value: RegValue) -> Self {
        {
            let mut image = self.lock();
            image.ensure_key(key);
            if let Some(node) = image.registry.get_mut(&key_id(key)) {
                node.values
                    .insert(name.to_ascii_lowercase(), (name.to_string(), value));
            }
        }
        self
    }

    /// Make every operation on `key` fail with access denied
    #[must_use]
    pub fn with_denied_key(self, key: &RegKeyPath) -> Self {
        self.lock().denied_keys.insert(key_id(key));
        self
    }

    #[must_use]
    pub fn with_product(self, product_code: &str, display_name: Option<&str>) -> Self {
        self.lock()
            .products
            .push((product_code.to_string(), display_name.map(str::to_string)));
        self
    }

    /// Make product enumeration fail with `code` after listing the known products
    #[must_use]
    pub fn with_enum_failure(self, code: u32) -> Self {
        self.lock().enum_failure = Some(code);
        self
    }

    #[must_use]
    pub fn with_device(self, hardware_id: &str) -> Self {
        self.lock().devices.push(hardware_id.to_string());
        self
    }

    #[must_use]
    pub fn with_file(self, path: impl Into<PathBuf>, contents: &str) -> Self {
        self.lock().files.insert(path.into(), contents.to_string());
        self
    }

    #[must_use]
    pub fn with_dir(self, path: impl Into<PathBuf>) -> Self {
        self.lock().dirs.insert(path.into());
        self
    }

    /// Removing `path` fails with access denied
    #[must_use]
    pub fn with_undeletable(self, path: impl Into<PathBuf>) -> Self {
        self.lock().undeletable.insert(path.into());
        self
    }

    /// Exit codes returned by successive process runs before falling back to the default
    #[must_use]
    pub fn with_exit_codes(self, codes: impl IntoIterator<Item = i32>) -> Self {
        self.lock().exit_codes.extend(codes);
        self
    }

    #[must_use]
    pub fn with_default_exit_code(self, code: i32) -> Self {
        self.lock().default_exit_code = code;
        self
    }

    #[must_use]
    pub fn with_wait_status(self, status: WaitStatus) -> Self {
        self.lock().wait_status = status;
        self
    }

    /// Staging a package whose INF file name is `inf_name` fails with `code`
    #[must_use]
    pub fn with_stage_failure(self, inf_name: &str, code: u32) -> Self {
        self.lock()
            .stage_failures
            .insert(inf_name.to_ascii_lowercase(), code);
        self
    }

    /// Installing or binding a package whose INF file name is `inf_name` fails with `code`
    #[must_use]
    pub fn with_install_failure(self, inf_name: &str, code: u32) -> Self {
        self.lock()
            .install_failures
            .insert(inf_name.to_ascii_lowercase(), code);
        self
    }

    #[must_use]
    pub fn with_reboot_required(self) -> Self {
        self.lock().reboot_required = true;
        self
    }

    // Inspection

    /// Every capability call made so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    #[must_use]
    pub fn commands(&self) -> Vec<PlatformCommand> {
        self.lock().commands.clone()
    }

    #[must_use]
    pub fn value(&self, key: &RegKeyPath, name: &str) -> Option<RegValue> {
        self.lock()
            .registry
            .get(&key_id(key))
            .and_then(|node| node.values.get(&name.to_ascii_lowercase()))
            .map(|(_, value)| value.clone())
    }

    #[must_use]
    pub fn key_exists(&self, key: &RegKeyPath) -> bool {
        self.lock().registry.contains_key(&key_id(key))
    }

    #[must_use]
    pub fn devices(&self) -> Vec<String> {
        self.lock().devices.clone()
    }

    #[must_use]
    pub fn path_exists(&self, path: &Path) -> bool {
        let image = self.lock();
        image.files.contains_key(path) || image.dirs.contains(path)
    }

    #[must_use]
    pub fn staged(&self) -> Vec<PathBuf> {
        self.lock().staged.clone()
    }

    #[must_use]
    pub fn installed(&self) -> Vec<PathBuf> {
        self.lock().installed.clone()
    }

    #[must_use]
    pub fn bound(&self) -> Vec<(String, PathBuf)> {
        self.lock().bound.clone()
    }
}

#[async_trait]
impl DriverStoreOperations for MemoryPlatform {
    async fn stage_package(
        &self,
        _ctx: &PlatformContext,
        inf: &Path,
        _inf_dir: &Path,
        policy: CopyPolicy,
    ) -> Result<(), PlatformError> {
        let mut image = self.lock();
        image.record(format!("stage_package {} {policy:?}", inf.display()));
        if let Some(code) = image.stage_failures.get(&file_key(inf)).copied() {
            return Err(os_call_failed("stage_package", inf.display().to_string(), code));
        }
        if policy == CopyPolicy::Overwrite || !image.staged.iter().any(|p| p == inf) {
            image.staged.push(inf.to_path_buf());
        }
        Ok(())
    }

    async fn install_package_on_node(
        &self,
        _ctx: &PlatformContext,
        inf: &Path,
        _flags: InstallFlags,
    ) -> Result<InstallOutcome, PlatformError> {
        let mut image = self.lock();
        image.record(format!("install_package_on_node {}", inf.display()));
        if let Some(code) = image.install_failures.get(&file_key(inf)).copied() {
            return Err(os_call_failed(
                "install_package_on_node",
                inf.display().to_string(),
                code,
            ));
        }
        image.installed.push(inf.to_path_buf());
        Ok(InstallOutcome {
            reboot_required: image.reboot_required,
        })
    }

    async fn bind_package_to_hardware_id(
        &self,
        _ctx: &PlatformContext,
        hardware_id: &str,
        inf: &Path,
        _flags: InstallFlags,
    ) -> Result<InstallOutcome, PlatformError> {
        let mut image = self.lock();
        image.record(format!(
            "bind_package_to_hardware_id {hardware_id} {}",
            inf.display()
        ));
        if let Some(code) = image.install_failures.get(&file_key(inf)).copied() {
            return Err(os_call_failed(
                "bind_package_to_hardware_id",
                hardware_id.to_string(),
                code,
            ));
        }
        image
            .bound
            .push((hardware_id.to_string(), inf.to_path_buf()));
        Ok(InstallOutcome {
            reboot_required: image.reboot_required,
        })
    }

    async fn wait_no_pending_installs(
        &self,
        _ctx: &PlatformContext,
        timeout: WaitTimeout,
    ) -> WaitStatus {
        let mut image = self.lock();
        image.record(format!("wait_no_pending_installs {timeout}"));
        image.wait_status.clone()
    }
}

#[async_trait]
impl DeviceOperations for MemoryPlatform {
    async fn remove_device(
        &self,
        _ctx: &PlatformContext,
        hardware_id: &str,
    ) -> Result<bool, PlatformError> {
        let mut image = self.lock();
        image.record(format!("remove_device {hardware_id}"));
        let pattern = hardware_id.to_ascii_uppercase();
        let before = image.devices.len();
        image
            .devices
            .retain(|id| !id.to_ascii_uppercase().starts_with(&pattern));
        Ok(image.devices.len() != before)
    }
}

#[async_trait]
impl ProcessOperations for MemoryPlatform {
    async fn run(&self, _ctx: &PlatformContext, cmd: PlatformCommand) -> Result<i32, PlatformError> {
        let mut image = self.lock();
        image.record(format!("run {cmd}"));
        image.commands.push(cmd);
        let code = image
            .exit_codes
            .pop_front()
            .unwrap_or(image.default_exit_code);
        Ok(code)
    }
}

#[async_trait]
impl RegistryOperations for MemoryPlatform {
    async fn subkeys(&self, key: &RegKeyPath) -> Result<Vec<String>, PlatformError> {
        let mut image = self.lock();
        image.record(format!("subkeys {key}"));
        image.check_access(key, "open")?;
        let (view, path) = key_id(key);
        if !image.registry.contains_key(&(view, path.clone())) {
            return Err(registry_failed("open", key, ERROR_FILE_NOT_FOUND));
        }
        let prefix = format!("{path}\\");
        Ok(image
            .registry
            .iter()
            .filter(|((v, p), _)| {
                *v == view
                    && p.strip_prefix(&prefix)
                        .is_some_and(|rest| !rest.is_empty() && !rest.contains('\\'))
            })
            .map(|(_, node)| node.name.clone())
            .collect())
    }

    async fn get_value(
        &self,
        key: &RegKeyPath,
        name: &str,
    ) -> Result<Option<RegValue>, PlatformError> {
        let mut image = self.lock();
        image.record(format!("get_value {key} {name}"));
        image.check_access(key, "query")?;
        Ok(image
            .registry
            .get(&key_id(key))
            .and_then(|node| node.values.get(&name.to_ascii_lowercase()))
            .map(|(_, value)| value.clone()))
    }

    async fn set_value(
        &self,
        key: &RegKeyPath,
        name: &str,
        value: &RegValue,
    ) -> Result<(), PlatformError> {
        let mut image = self.lock();
        image.record(format!("set_value {key} {name}"));
        image.check_access(key, "set")?;
        let node = image
            .registry
            .get_mut(&key_id(key))
            .ok_or_else(|| registry_failed("set", key, ERROR_FILE_NOT_FOUND))?;
        node.values
            .insert(name.to_ascii_lowercase(), (name.to_string(), value.clone()));
        Ok(())
    }

    async fn delete_value(&self, key: &RegKeyPath, name: &str) -> Result<bool, PlatformError> {
        let mut image = self.lock();
        image.record(format!("delete_value {key} {name}"));
        image.check_access(key, "delete_value")?;
        Ok(image
            .registry
            .get_mut(&key_id(key))
            .and_then(|node| node.values.remove(&name.to_ascii_lowercase()))
            .is_some())
    }

    async fn delete_subkey_tree(&self, key: &RegKeyPath) -> Result<bool, PlatformError> {
        let mut image = self.lock();
        image.record(format!("delete_subkey_tree {key}"));
        image.check_access(key, "delete_tree")?;
        let (view, path) = key_id(key);
        let prefix = format!("{path}\\");
        let before = image.registry.len();
        image
            .registry
            .retain(|(v, p), _| !(*v == view && (*p == path || p.starts_with(&prefix))));
        Ok(image.registry.len() != before)
    }
}

#[async_trait]
impl MsiOperations for MemoryPlatform {
    async fn enum_product(&self, index: u32) -> Result<Option<String>, PlatformError> {
        let mut image = self.lock();
        image.record(format!("enum_product {index}"));
        let position = usize::try_from(index).unwrap_or(usize::MAX);
        if let Some((code, _)) = image.products.get(position) {
            return Ok(Some(code.clone()));
        }
        match image.enum_failure {
            Some(code) => Err(PlatformError::OsCallFailed {
                operation: "enum_product".to_string(),
                target: format!("index {index}"),
                code,
                message: describe_os_error(code),
            }),
            None => Ok(None),
        }
    }

    async fn product_display_name(
        &self,
        product_code: &str,
    ) -> Result<Option<String>, PlatformError> {
        let mut image = self.lock();
        image.record(format!("product_display_name {product_code}"));
        Ok(image
            .products
            .iter()
            .find(|(code, _)| code.eq_ignore_ascii_case(product_code))
            .and_then(|(_, name)| name.clone()))
    }
}

#[async_trait]
impl FilesystemOperations for MemoryPlatform {
    async fn exists(&self, _ctx: &PlatformContext, path: &Path) -> bool {
        let mut image = self.lock();
        image.record(format!("exists {}", path.display()));
        image.files.contains_key(path) || image.dirs.contains(path)
    }

    async fn read_to_string(
        &self,
        _ctx: &PlatformContext,
        path: &Path,
    ) -> Result<String, PlatformError> {
        let mut image = self.lock();
        image.record(format!("read_to_string {}", path.display()));
        image
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| PlatformError::FilesystemOperationFailed {
                operation: "read".to_string(),
                path: path.display().to_string(),
                message: describe_os_error(ERROR_FILE_NOT_FOUND),
            })
    }

    async fn remove_file(&self, _ctx: &PlatformContext, path: &Path) -> Result<bool, PlatformError> {
        let mut image = self.lock();
        image.record(format!("remove_file {}", path.display()));
        if image.undeletable.contains(path) {
            return Err(PlatformError::FilesystemOperationFailed {
                operation: "remove_file".to_string(),
                path: path.display().to_string(),
                message: describe_os_error(ERROR_ACCESS_DENIED),
            });
        }
        Ok(image.files.remove(path).is_some())
    }

    async fn remove_dir_all(
        &self,
        _ctx: &PlatformContext,
        path: &Path,
    ) -> Result<bool, PlatformError> {
        let mut image = self.lock();
        image.record(format!("remove_dir_all {}", path.display()));
        if image.undeletable.contains(path) {
            return Err(PlatformError::FilesystemOperationFailed {
                operation: "remove_dir_all".to_string(),
                path: path.display().to_string(),
                message: describe_os_error(ERROR_ACCESS_DENIED),
            });
        }
        let existed = image.dirs.contains(path);
        image.dirs.retain(|dir| !dir.starts_with(path));
        image.files.retain(|file, _| !file.starts_with(path));
        Ok(existed)
    }
}

#[async_trait]
impl SystemInfo for MemoryPlatform {
    fn target_arch(&self) -> TargetArch {
        self.lock().arch
    }

    async fn os_version(&self) -> Result<OsVersion, PlatformError> {
        Ok(self.lock().os_version)
    }

    fn drivers_dir(&self) -> PathBuf {
        self.lock().drivers_dir.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLASS: &str = r"SYSTEM\CurrentControlSet\Control\Class";

    #[tokio::test]
    async fn subkeys_lists_direct_children_only() {
        let base = RegKeyPath::native(CLASS);
        let memory = MemoryPlatform::new()
            .with_key(&base.join("{4d36e967-e325-11ce-bfc1-08002be10318}"))
            .with_key(&base.join(r"{4d36e972-e325-11ce-bfc1-08002be10318}\0001"));

        let mut children = memory.subkeys(&base).await.unwrap();
        children.sort();
        assert_eq!(
            children,
            vec![
                "{4d36e967-e325-11ce-bfc1-08002be10318}".to_string(),
                "{4d36e972-e325-11ce-bfc1-08002be10318}".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn missing_base_key_is_an_error() {
        let memory = MemoryPlatform::new();
        let err = memory
            .subkeys(&RegKeyPath::native(CLASS))
            .await
            .unwrap_err();
        assert_eq!(err.os_code(), Some(ERROR_FILE_NOT_FOUND));
    }

    #[tokio::test]
    async fn views_are_separate() {
        let key = RegKeyPath::native(r"SOFTWARE\Vendor");
        let memory = MemoryPlatform::new().with_value(&key, "Path", RegValue::String("x".into()));

        let wow = RegKeyPath::wow64_32(r"SOFTWARE\Vendor");
        assert!(memory.get_value(&wow, "Path").await.unwrap().is_none());
        assert!(!memory.delete_subkey_tree(&wow).await.unwrap());
        assert!(memory.delete_subkey_tree(&key).await.unwrap());
        assert!(!memory.key_exists(&key));
    }

    #[tokio::test]
    async fn scripted_exit_codes_fall_back_to_default() {
        let memory = MemoryPlatform::new()
            .with_exit_codes([1603])
            .with_default_exit_code(0);
        let ctx = PlatformContext::default();

        let cmd = PlatformCommand::new("msiexec.exe").arg("/x");
        assert_eq!(memory.run(&ctx, cmd.clone()).await.unwrap(), 1603);
        assert_eq!(memory.run(&ctx, cmd).await.unwrap(), 0);
        assert_eq!(memory.commands().len(), 2);
    }

    #[tokio::test]
    async fn device_removal_matches_prefix_case_insensitively() {
        let memory = MemoryPlatform::new()
            .with_device(r"PCI\VEN_5853&DEV_0001&SUBSYS_00015853&REV_01")
            .with_device(r"PCI\VEN_8086&DEV_7010");
        let ctx = PlatformContext::default();

        assert!(memory
            .remove_device(&ctx, r"pci\ven_5853&dev_0001")
            .await
            .unwrap());
        assert!(!memory
            .remove_device(&ctx, r"PCI\VEN_5853&DEV_0001")
            .await
            .unwrap());
        assert_eq!(memory.devices(), vec![r"PCI\VEN_8086&DEV_7010".to_string()]);
    }
}
