//! Registry access under `HKEY_LOCAL_MACHINE`

use async_trait::async_trait;
use pvdrv_errors::PlatformError;
use std::fmt;

/// Which registry view a key is opened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegistryView {
    /// The view matching the OS bitness
    Native,
    /// The 32-bit view (`WOW6432Node`) on a 64-bit OS
    Wow64_32,
}

/// A key below `HKEY_LOCAL_MACHINE`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegKeyPath {
    pub view: RegistryView,
    pub path: String,
}

impl RegKeyPath {
    #[must_use]
    pub fn native(path: impl Into<String>) -> Self {
        Self {
            view: RegistryView::Native,
            path: path.into(),
        }
    }

    #[must_use]
    pub fn wow64_32(path: impl Into<String>) -> Self {
        Self {
            view: RegistryView::Wow64_32,
            path: path.into(),
        }
    }

    /// Path of a direct child key in the same view
    #[must_use]
    pub fn join(&self, child: &str) -> Self {
        Self {
            view: self.view,
            path: format!("{}\\{child}", self.path.trim_end_matches('\\')),
        }
    }
}

impl fmt::Display for RegKeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.view {
            RegistryView::Native => write!(f, "HKLM\\{}", self.path),
            RegistryView::Wow64_32 => write!(f, "HKLM\\{} (32-bit view)", self.path),
        }
    }
}

/// Typed registry value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegValue {
    Dword(u32),
    String(String),
    ExpandString(String),
    MultiString(Vec<String>),
    Binary(Vec<u8>),
}

impl RegValue {
    #[must_use]
    pub fn as_dword(&self) -> Option<u32> {
        match self {
            Self::Dword(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) | Self::ExpandString(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_multi_string(&self) -> Option<&[String]> {
        match self {
            Self::MultiString(values) => Some(values),
            _ => None,
        }
    }
}

/// Trait for registry operations
///
/// Missing keys and values are reported as `None`/`false`, never as errors,
/// except by [`RegistryOperations::subkeys`], which needs the key to exist.
#[async_trait]
pub trait RegistryOperations: Send + Sync {
    /// Names of the direct children of `key`
    async fn subkeys(&self, key: &RegKeyPath) -> Result<Vec<String>, PlatformError>;

    async fn get_value(&self, key: &RegKeyPath, name: &str)
        -> Result<Option<RegValue>, PlatformError>;

    async fn set_value(
        &self,
        key: &RegKeyPath,
        name: &str,
        value: &RegValue,
    ) -> Result<(), PlatformError>;

    /// Returns `false` when the key or value was absent
    async fn delete_value(&self, key: &RegKeyPath, name: &str) -> Result<bool, PlatformError>;

    /// Delete `key` with all its subkeys; `false` when it was absent
    async fn delete_subkey_tree(&self, key: &RegKeyPath) -> Result<bool, PlatformError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_keeps_view() {
        let key = RegKeyPath::wow64_32(r"SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall\");
        let child = key.join("Citrix XenTools");
        assert_eq!(child.view, RegistryView::Wow64_32);
        assert_eq!(
            child.path,
            r"SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall\Citrix XenTools"
        );
    }

    #[test]
    fn value_accessors() {
        assert_eq!(RegValue::Dword(3).as_dword(), Some(3));
        assert_eq!(RegValue::ExpandString("x".into()).as_str(), Some("x"));
        assert!(RegValue::Dword(3).as_multi_string().is_none());
    }
}
