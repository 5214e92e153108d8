//! Translation of platform error codes into readable text

use pvdrv_errors::PlatformError;

use crate::registry::RegKeyPath;

/// Human-readable message for a platform error code.
///
/// On Windows this is the system message table text; elsewhere the standard
/// library's rendering of the raw code.
#[must_use]
pub fn describe_os_error(code: u32) -> String {
    #[allow(clippy::cast_possible_wrap)]
    let message = std::io::Error::from_raw_os_error(code as i32).to_string();
    // Drop the trailing "(os error N)"; callers render the code themselves.
    match message.rfind(" (os error ") {
        Some(idx) => message[..idx].trim_end().to_string(),
        None => message,
    }
}

/// Build an `OsCallFailed` error with a translated message
pub(crate) fn os_call_failed(
    operation: &str,
    target: impl Into<String>,
    code: u32,
) -> PlatformError {
    PlatformError::OsCallFailed {
        operation: operation.to_string(),
        target: target.into(),
        code,
        message: describe_os_error(code),
    }
}

/// Build a `RegistryOperationFailed` error with a translated message
pub(crate) fn registry_failed(operation: &str, key: &RegKeyPath, code: u32) -> PlatformError {
    PlatformError::RegistryOperationFailed {
        operation: operation.to_string(),
        key: key.to_string(),
        code,
        message: describe_os_error(code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_has_no_code_suffix() {
        let message = describe_os_error(2);
        assert!(!message.is_empty());
        assert!(!message.contains("os error"));
    }

    #[test]
    fn registry_error_carries_code_and_key() {
        let key = RegKeyPath::native(r"SYSTEM\CurrentControlSet\Control\Class");
        let err = registry_failed("open", &key, 5);
        assert_eq!(err.os_code(), Some(5));
        assert!(err.to_string().contains(r"HKLM\SYSTEM\CurrentControlSet\Control\Class"));
    }
}
