//! Integration tests for error types

#[cfg(test)]
mod tests {
    use pvdrv_errors::*;

    #[test]
    fn test_error_conversion() {
        let err: Error = InstallError::MissingPackage {
            path: r"C:\drivers\xenbus\x64\xenbus.inf".into(),
        }
        .into();
        assert!(matches!(err, Error::Install(InstallError::MissingPackage { .. })));
    }

    #[test]
    fn test_uninstall_failed_display() {
        let err = CleanupError::UninstallFailed {
            product_code: "{A1B2}".into(),
            exit_code: 1603,
            attempts: 5,
        };
        assert_eq!(
            err.to_string(),
            "uninstall of {A1B2} failed after 5 attempts (last exit code 1603)"
        );
    }

    #[test]
    fn test_os_code_is_carried() {
        let err = PlatformError::OsCallFailed {
            operation: "stage_package".into(),
            target: "xenvif.inf".into(),
            code: 2,
            message: "The system cannot find the file specified.".into(),
        };
        assert_eq!(err.os_code(), Some(2));
        assert!(err.to_string().contains("os error 2"));
    }

    #[test]
    fn test_user_facing_codes() {
        let err: Error = CleanupError::RegistryAccess {
            key: r"SYSTEM\CurrentControlSet\Control\Class".into(),
            code: 5,
            message: "Access is denied.".into(),
        }
        .into();
        assert_eq!(err.user_code(), Some("cleanup.registry_access"));
        assert!(err.user_hint().is_some());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let err: Error = io_err.into();
        assert!(matches!(
            err,
            Error::Io {
                kind: std::io::ErrorKind::PermissionDenied,
                ..
            }
        ));
    }

    #[test]
    fn test_error_clone() {
        let err = StateError::UnknownMilestone { name: "Foo".into() };
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn test_cleanup_error_codes_and_retry() {
        let uninstall = CleanupError::UninstallFailed {
            product_code: "{A1B2C3D4-0000-0000-0000-000000000000}".into(),
            exit_code: 1603,
            attempts: 3,
        };
        assert_eq!(uninstall.user_code(), Some("cleanup.uninstall_failed"));
        assert!(uninstall.is_retryable());

        let registry = CleanupError::RegistryAccess {
            key: r"SOFTWARE\Citrix\XenTools".into(),
            code: 5,
            message: "Access is denied.".into(),
        };
        assert_eq!(registry.user_code(), Some("cleanup.registry_access"));
        assert!(!registry.is_retryable());

        let enumeration = CleanupError::ProductEnumeration {
            code: 1610,
            message: "bad configuration".into(),
        };
        assert_eq!(enumeration.user_code(), Some("cleanup.product_enumeration"));
        assert!(!enumeration.is_retryable());
    }

    #[test]
    fn test_io_error_keeps_kind_and_code() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file").into();
        assert_eq!(err.user_code(), Some("error.io"));
        match err.clone() {
            Error::Io { kind, message, .. } => {
                assert_eq!(kind, std::io::ErrorKind::NotFound);
                assert!(message.contains("no such file"));
            }
            other => panic!("expected Io, got {other:?}"),
        }
    }
}
