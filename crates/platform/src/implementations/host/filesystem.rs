//! Filesystem operations through `tokio::fs`

use async_trait::async_trait;
use pvdrv_errors::PlatformError;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

use crate::core::PlatformContext;
use crate::filesystem::FilesystemOperations;

/// Host implementation of filesystem operations
pub struct HostFilesystemOperations;

impl HostFilesystemOperations {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for HostFilesystemOperations {
    fn default() -> Self {
        Self::new()
    }
}

fn fs_error(operation: &str, path: &Path, err: &std::io::Error) -> PlatformError {
    PlatformError::FilesystemOperationFailed {
        operation: operation.to_string(),
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

#[async_trait]
impl FilesystemOperations for HostFilesystemOperations {
    async fn exists(&self, _ctx: &PlatformContext, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    async fn read_to_string(
        &self,
        _ctx: &PlatformContext,
        path: &Path,
    ) -> Result<String, PlatformError> {
        let bytes = fs::read(path)
            .await
            .map_err(|e| fs_error("read", path, &e))?;
        Ok(decode_text(&bytes))
    }

    async fn remove_file(&self, _ctx: &PlatformContext, path: &Path) -> Result<bool, PlatformError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(fs_error("remove_file", path, &e)),
        }
    }

    async fn remove_dir_all(
        &self,
        _ctx: &PlatformContext,
        path: &Path,
    ) -> Result<bool, PlatformError> {
        match fs::remove_dir_all(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(fs_error("remove_dir_all", path, &e)),
        }
    }
}

/// INF files are commonly UTF-16LE with a byte order mark
fn decode_text(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn removing_missing_paths_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let ops = HostFilesystemOperations::new();
        let ctx = PlatformContext::default();

        assert!(!ops.remove_file(&ctx, &temp.path().join("xenbus.sys")).await.unwrap());
        assert!(!ops.remove_dir_all(&ctx, &temp.path().join("XenTools")).await.unwrap());
    }

    #[tokio::test]
    async fn remove_file_reports_removal() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("xenvif.sys");
        tokio::fs::write(&path, b"driver").await.unwrap();

        let ops = HostFilesystemOperations::new();
        let ctx = PlatformContext::default();
        assert!(ops.exists(&ctx, &path).await);
        assert!(ops.remove_file(&ctx, &path).await.unwrap());
        assert!(!ops.exists(&ctx, &path).await);
    }

    #[test]
    fn decodes_utf16_inf() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "[Inst.NTamd64]".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_text(&bytes), "[Inst.NTamd64]");
        assert_eq!(decode_text(b"\xEF\xBB\xBF[Version]"), "[Version]");
    }
}
