//! Integration tests for types

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use pvdrv_types::*;

    #[test]
    fn test_target_arch_renderings() {
        assert_eq!(TargetArch::X64.package_dir(), "x64");
        assert_eq!(TargetArch::X64.install_section(), "Inst.NTamd64");
        assert_eq!(TargetArch::X86.package_dir(), "x86");
        assert_eq!(TargetArch::X86.install_section(), "Inst.NTx86");
    }

    #[test]
    fn test_arch_serialization() {
        let json = serde_json::to_string(&TargetArch::X64).unwrap();
        assert_eq!(json, r#""x64""#);

        let deserialized: TargetArch = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, TargetArch::X64);
    }

    #[test]
    fn test_os_version_parse() {
        let v: OsVersion = "6.0".parse().unwrap();
        assert!(v.is_server_2008());

        let v: OsVersion = "6.3.9600".parse().unwrap();
        assert_eq!(v, OsVersion::new(6, 3));
        assert!(!v.is_server_2008());

        assert!("ten".parse::<OsVersion>().is_err());
    }

    #[test]
    fn test_workaround_resolution() {
        let w2k8 = OsVersion::new(6, 0);
        let w2k12 = OsVersion::new(6, 2);
        assert!(Workaround2k8::Auto.resolve(w2k8));
        assert!(!Workaround2k8::Auto.resolve(w2k12));
        assert!(Workaround2k8::On.resolve(w2k12));
        assert!(!Workaround2k8::Off.resolve(w2k8));
    }

    #[test]
    fn test_cleanup_stage_serialization() {
        let json = serde_json::to_string(&CleanupStage::UninstallMsis).unwrap();
        assert_eq!(json, r#""uninstall_msis""#);
    }

    #[test]
    fn test_install_report_completeness() {
        let mut report = InstallReport::default();
        assert!(report.is_complete());

        report.failed.push(DriverFailure {
            driver: "xenvbd".into(),
            error: "missing package".into(),
        });
        assert!(!report.is_complete());
    }

    proptest! {
        #[test]
        fn test_os_version_display_parse(major in 0u32..100, minor in 0u32..100) {
            let v = OsVersion::new(major, minor);
            let parsed: OsVersion = v.to_string().parse().unwrap();
            prop_assert_eq!(parsed, v);
        }
    }
}
