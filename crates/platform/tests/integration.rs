//! Integration tests for the platform layer

#[cfg(test)]
mod tests {
    use pvdrv_errors::PlatformError;
    use pvdrv_platform::*;
    use pvdrv_types::{CopyPolicy, InstallFlags, OsVersion, TargetArch, WaitTimeout};
    use std::path::Path;

    #[test]
    fn test_builder_requires_every_provider() {
        let memory = MemoryPlatform::new();
        let result = Platform::builder()
            .driver_store(memory.clone())
            .registry(memory)
            .build();

        match result {
            Err(PlatformError::CapabilityUnavailable { capability }) => {
                assert_eq!(capability, "device removal");
            }
            _ => panic!("expected CapabilityUnavailable"),
        }
    }

    #[cfg(not(windows))]
    #[test]
    fn test_current_is_unavailable_off_windows() {
        assert!(matches!(
            Platform::current(),
            Err(PlatformError::CapabilityUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_memory_platform_shares_one_image() {
        let memory = MemoryPlatform::new()
            .with_arch(TargetArch::X86)
            .with_os_version(OsVersion::new(6, 0))
            .with_reboot_required();
        let platform = memory.platform();
        let ctx = platform.create_context(None);

        assert_eq!(platform.system().target_arch(), TargetArch::X86);
        assert!(platform.system().os_version().await.unwrap().is_server_2008());

        let inf = Path::new("xenbus.inf");
        platform
            .driver_store()
            .stage_package(&ctx, inf, Path::new("."), CopyPolicy::NewerOnly)
            .await
            .unwrap();
        let outcome = platform
            .driver_store()
            .install_package_on_node(&ctx, inf, InstallFlags::default())
            .await
            .unwrap();

        assert!(outcome.reboot_required);
        assert_eq!(memory.staged().len(), 1);
        assert_eq!(memory.installed().len(), 1);
        assert_eq!(memory.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_failures_carry_os_code() {
        let memory = MemoryPlatform::new()
            .with_stage_failure("XenVif.inf", 0xE000_0203)
            .with_wait_status(WaitStatus::Failed {
                code: 6,
                message: describe_os_error(6),
            });
        let platform = memory.platform();
        let ctx = PlatformContext::default();

        let err = platform
            .driver_store()
            .stage_package(&ctx, Path::new("xenvif.inf"), Path::new("."), CopyPolicy::NewerOnly)
            .await
            .unwrap_err();
        assert_eq!(err.os_code(), Some(0xE000_0203));

        let status = platform
            .driver_store()
            .wait_no_pending_installs(&ctx, WaitTimeout::Seconds(5))
            .await;
        assert!(matches!(status, WaitStatus::Failed { code: 6, .. }));
    }

    #[test]
    fn test_command_rendering() {
        let cmd = PlatformCommand::new("msiexec.exe").args(["/x", "{ABC}", "/qn", "/norestart"]);
        assert_eq!(cmd.to_string(), "msiexec.exe /x {ABC} /qn /norestart");
        assert_eq!(cmd.get_args().len(), 4);
    }
}
