//! Integration tests for the legacy cleanup pipeline and uninstall retries

#[cfg(test)]
mod tests {
    use pvdrv_config::constants::{CLASS_KEY, SERVICES_KEY, UNINSTALL_KEY, UNPLUG_KEY};
    use pvdrv_config::Config;
    use pvdrv_errors::{CleanupError, Error};
    use pvdrv_events::{channel, AppEvent, CleanupEvent, EventReceiver};
    use pvdrv_ops::tables::{
        DRIVER_BINARIES, LEGACY_BUS_DEVICE, LEGACY_INSTALL_DIR_VALUE, LEGACY_TOOLS_KEY,
        LEGACY_UNINSTALL_ENTRY, PURGE_HARDWARE_IDS,
    };
    use pvdrv_ops::*;
    use pvdrv_platform::{MemoryPlatform, RegKeyPath, RegValue};
    use pvdrv_state::{FlagStore, MemoryFlagStore};
    use pvdrv_types::{CleanupStage, Milestone, OsVersion, Workaround2k8};
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    const DISK_CLASS: &str = "{4d36e967-e325-11ce-bfc1-08002be10318}";
    const NET_CLASS: &str = "{4d36e972-e325-11ce-bfc1-08002be10318}";
    const SCSI_CLASS: &str = "{4d36e97b-e325-11ce-bfc1-08002be10318}";

    const AGENT: &str = "{0E1B9B84-6E7D-4C5C-A0D7-3C4DBD4A0D4B}";
    const VSS: &str = "{8B2B7F6D-90C6-4A86-9F0D-6C4F3D2C9B11}";

    struct Harness {
        ctx: OpsCtx,
        memory: MemoryPlatform,
        store: Arc<MemoryFlagStore>,
        rx: EventReceiver,
    }

    impl Harness {
        fn events(&mut self) -> Vec<AppEvent> {
            let mut events = Vec::new();
            while let Ok(event) = self.rx.try_recv() {
                events.push(event);
            }
            events
        }
    }

    fn harness(memory: MemoryPlatform, store: MemoryFlagStore) -> Harness {
        let (tx, rx) = channel();
        let store = Arc::new(store);
        let ctx = OpsContextBuilder::new()
            .with_platform(memory.platform())
            .with_state(store.clone())
            .with_event_sender(tx)
            .with_config(Config::default())
            .build()
            .unwrap();
        Harness {
            ctx,
            memory,
            store,
            rx,
        }
    }

    fn class() -> RegKeyPath {
        RegKeyPath::native(CLASS_KEY)
    }

    fn service(name: &str) -> RegKeyPath {
        RegKeyPath::native(SERVICES_KEY).join(name)
    }

    fn multi(values: &[&str]) -> RegValue {
        RegValue::MultiString(values.iter().map(ToString::to_string).collect())
    }

    /// A system with nothing of the legacy tools left
    fn clean_system() -> MemoryPlatform {
        MemoryPlatform::new().with_key(&class())
    }

    fn milestones_before(stage: CleanupStage) -> Vec<Milestone> {
        CleanupStage::SEQUENCE
            .iter()
            .take_while(|s| **s != stage)
            .map(|s| s.milestone())
            .collect()
    }

    fn retry_delays(events: &[AppEvent]) -> Vec<u64> {
        events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Cleanup(CleanupEvent::UninstallRetryScheduled { delay_secs, .. }) => {
                    Some(*delay_secs)
                }
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_clean_system_runs_every_stage() {
        let h = harness(clean_system(), MemoryFlagStore::new());

        let report = system_clean(&h.ctx, Workaround2k8::Off).await.unwrap();

        assert_eq!(report.completed, CleanupStage::SEQUENCE.to_vec());
        assert!(report.skipped.is_empty());
        assert!(report.products_removed.is_empty());
        assert!(report.warnings.is_empty());
        for stage in CleanupStage::SEQUENCE {
            assert!(h.store.is_set(stage.milestone()).await.unwrap());
        }
        assert!(h.memory.commands().is_empty());
    }

    #[tokio::test]
    async fn test_second_clean_makes_no_capability_calls() {
        let h = harness(clean_system(), MemoryFlagStore::new());
        system_clean(&h.ctx, Workaround2k8::Auto).await.unwrap();
        h.memory.clear_calls();

        let report = system_clean(&h.ctx, Workaround2k8::Auto).await.unwrap();
        assert!(h.memory.calls().is_empty());
        assert!(report.completed.is_empty());
        assert_eq!(report.skipped, CleanupStage::SEQUENCE.to_vec());
    }

    #[tokio::test]
    async fn test_completed_stage_is_not_rerun() {
        let h = harness(
            clean_system(),
            MemoryFlagStore::with_set([Milestone::RemovedFromFilters]),
        );

        let report = system_clean(&h.ctx, Workaround2k8::Off).await.unwrap();

        assert_eq!(report.skipped, vec![CleanupStage::RemoveFromFilters]);
        assert_eq!(report.completed, CleanupStage::SEQUENCE[1..].to_vec());
        assert!(!h.memory.calls().iter().any(|c| c.starts_with("subkeys")));
    }

    #[tokio::test]
    async fn test_filters_are_removed_in_place() {
        let memory = clean_system()
            .with_value(
                &class().join(DISK_CLASS),
                "LowerFilters",
                multi(&["xenfilt", "storvsc", "scsifilt"]),
            )
            .with_value(&class().join(DISK_CLASS), "UpperFilters", multi(&["PartMgr"]))
            .with_value(&class().join(SCSI_CLASS), "UpperFilters", multi(&["XENFILT"]))
            .with_key(&class().join(NET_CLASS));
        let mut h = harness(memory, MemoryFlagStore::new());

        system_clean(&h.ctx, Workaround2k8::Off).await.unwrap();

        assert_eq!(
            h.memory.value(&class().join(DISK_CLASS), "LowerFilters"),
            Some(multi(&["storvsc"]))
        );
        assert_eq!(
            h.memory.value(&class().join(SCSI_CLASS), "UpperFilters"),
            Some(multi(&[]))
        );
        // untouched values are never written
        assert!(!h
            .memory
            .calls()
            .iter()
            .any(|c| c.starts_with("set_value") && c.ends_with("UpperFilters") && c.contains(DISK_CLASS)));

        let rewritten = h
            .events()
            .into_iter()
            .filter(|e| matches!(e, AppEvent::Cleanup(CleanupEvent::FiltersRewritten { .. })))
            .count();
        assert_eq!(rewritten, 2);
    }

    #[tokio::test]
    async fn test_unopenable_class_key_fails_the_stage() {
        let h = harness(MemoryPlatform::new(), MemoryFlagStore::new());

        let err = system_clean(&h.ctx, Workaround2k8::Off).await.unwrap_err();

        assert!(matches!(
            err,
            Error::Cleanup(CleanupError::RegistryAccess { code: 2, .. })
        ));
        assert!(h.store.set_milestones().await.is_empty());
        // later stages never ran
        assert!(!h.memory.calls().iter().any(|c| c.contains("Services")));
    }

    #[tokio::test]
    async fn test_boot_start_is_disabled_and_unplug_cleared() {
        let memory = clean_system()
            .with_value(&service("XENBUS"), "Start", RegValue::Dword(0))
            .with_value(&service("xenvbd"), "Start", RegValue::Dword(3))
            .with_key(&service("xennet"))
            .with_value(&RegKeyPath::native(UNPLUG_KEY), "DISKS", RegValue::String("1".into()));
        let mut h = harness(memory, MemoryFlagStore::new());

        system_clean(&h.ctx, Workaround2k8::Off).await.unwrap();

        let changed: Vec<(String, u32)> = h
            .events()
            .into_iter()
            .filter_map(|e| match e {
                AppEvent::Cleanup(CleanupEvent::ServiceStartChanged { service, previous }) => {
                    Some((service, previous))
                }
                _ => None,
            })
            .collect();
        assert_eq!(changed, vec![("XENBUS".to_string(), 0)]);
        assert!(h
            .memory
            .value(&RegKeyPath::native(UNPLUG_KEY), "DISKS")
            .is_none());
        assert!(h
            .memory
            .calls()
            .contains(&format!("delete_value {} NICS", RegKeyPath::native(UNPLUG_KEY))));
    }

    #[tokio::test]
    async fn test_boot_start_writes_manual_start() {
        let memory = clean_system().with_value(&service("xenvif"), "Start", RegValue::Dword(1));
        let h = harness(
            memory,
            MemoryFlagStore::with_set([Milestone::RemovedFromFilters]),
        );

        system_clean(&h.ctx, Workaround2k8::Off).await.unwrap();

        // the purge stage removes the service key afterwards, so check the write itself
        let set = format!("set_value {} Start", service("xenvif"));
        assert!(h.memory.calls().contains(&set));
    }

    #[tokio::test]
    async fn test_resolved_products_are_uninstalled() {
        let memory = clean_system()
            .with_product("{11111111-1111-1111-1111-111111111111}", Some("Some Other Product"))
            .with_product(AGENT, Some("citrix xenserver windows guest agent"))
            .with_product(VSS, Some("Citrix XenServer VSS Provider"))
            .with_exit_codes([0, 3010]);
        let h = harness(memory, MemoryFlagStore::new());

        let report = system_clean(&h.ctx, Workaround2k8::Off).await.unwrap();

        assert_eq!(report.products_removed, vec![AGENT.to_string(), VSS.to_string()]);
        assert!(report.reboot_required);
        let commands: Vec<String> = h.memory.commands().iter().map(ToString::to_string).collect();
        assert_eq!(
            commands,
            vec![
                format!("msiexec.exe /x {AGENT} /qn /norestart"),
                format!("msiexec.exe /x {VSS} /qn /norestart"),
            ]
        );
    }

    #[tokio::test]
    async fn test_resolve_product_code_ignores_case_and_misses() {
        let memory = MemoryPlatform::new()
            .with_product(VSS, None)
            .with_product(AGENT, Some("Citrix XenServer Windows Guest Agent"));
        let h = harness(memory, MemoryFlagStore::new());

        assert_eq!(
            resolve_product_code(&h.ctx, "CITRIX XENSERVER WINDOWS GUEST AGENT")
                .await
                .unwrap()
                .as_deref(),
            Some(AGENT)
        );
        assert_eq!(
            resolve_product_code(&h.ctx, "Citrix XenServer Tools Installer")
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_enumeration_failure_is_fatal() {
        let memory = clean_system().with_enum_failure(1610);
        let h = harness(memory, MemoryFlagStore::new());

        let err = resolve_product_code(&h.ctx, "anything").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Cleanup(CleanupError::ProductEnumeration { code: 1610, .. })
        ));

        let err = system_clean(&h.ctx, Workaround2k8::Off).await.unwrap_err();
        assert!(matches!(err, Error::Cleanup(CleanupError::ProductEnumeration { .. })));
        assert!(!h.store.is_set(Milestone::MSIsUninstalled).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_uninstall_backs_off_then_gives_up() {
        let memory = MemoryPlatform::new().with_default_exit_code(1603);
        let mut h = harness(memory, MemoryFlagStore::new());

        let started = tokio::time::Instant::now();
        let err = uninstall_product(&h.ctx, AGENT, RetryBudget::new(5))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Cleanup(CleanupError::UninstallFailed { exit_code: 1603, attempts: 5, .. })
        ));
        assert_eq!(h.memory.commands().len(), 5);
        assert_eq!(retry_delays(&h.events()), vec![1, 2, 4, 8]);
        // no sleep after the final attempt
        assert_eq!(started.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_codes_need_one_attempt() {
        for (code, reboot) in [(0, false), (1641, true), (3010, true)] {
            let memory = MemoryPlatform::new().with_default_exit_code(code);
            let mut h = harness(memory, MemoryFlagStore::new());

            let started = tokio::time::Instant::now();
            let outcome = uninstall_product(&h.ctx, VSS, RetryBudget::new(5))
                .await
                .unwrap();

            assert_eq!(outcome.attempts, 1);
            assert_eq!(outcome.reboot_required, reboot);
            assert!(retry_delays(&h.events()).is_empty());
            assert_eq!(started.elapsed(), Duration::ZERO);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_recovers() {
        let memory = MemoryPlatform::new().with_exit_codes([1618, 1618, 0]);
        let mut h = harness(memory, MemoryFlagStore::new());

        let outcome = uninstall_product(&h.ctx, VSS, RetryBudget::new(5))
            .await
            .unwrap();

        assert_eq!(outcome.attempts, 3);
        assert_eq!(retry_delays(&h.events()), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_uninstall_stops_the_pipeline() {
        let memory = clean_system()
            .with_product(AGENT, Some("Citrix XenServer Windows Guest Agent"))
            .with_default_exit_code(1603);
        let h = harness(memory, MemoryFlagStore::new());

        let err = system_clean(&h.ctx, Workaround2k8::Off).await.unwrap_err();

        assert!(matches!(err, Error::Cleanup(CleanupError::UninstallFailed { .. })));
        assert_eq!(
            h.store.set_milestones().await,
            milestones_before(CleanupStage::UninstallMsis)
        );
        assert!(!h.memory.calls().iter().any(|c| c.starts_with("remove_device")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_milestones_never_regress() {
        let memory = clean_system()
            .with_product(AGENT, Some("Citrix XenServer Windows Guest Agent"))
            .with_default_exit_code(1603);
        let h = harness(memory, MemoryFlagStore::with_set([Milestone::XenBusInstalled]));

        system_clean(&h.ctx, Workaround2k8::Off).await.unwrap_err();
        let after_first = h.store.set_milestones().await;
        system_clean(&h.ctx, Workaround2k8::Off).await.unwrap_err();
        let after_second = h.store.set_milestones().await;

        assert!(after_first.contains(&Milestone::XenBusInstalled));
        assert!(after_first.iter().all(|m| after_second.contains(m)));
    }

    #[tokio::test]
    async fn test_legacy_uninstall_is_best_effort() {
        let native_entry = RegKeyPath::native(UNINSTALL_KEY).join(LEGACY_UNINSTALL_ENTRY);
        let wow_entry = RegKeyPath::wow64_32(UNINSTALL_KEY).join(LEGACY_UNINSTALL_ENTRY);
        let install_dir = PathBuf::from(r"C:\Program Files (x86)\Citrix\XenTools");
        let memory = clean_system()
            .with_key(&native_entry)
            .with_denied_key(&wow_entry)
            .with_value(
                &RegKeyPath::wow64_32(LEGACY_TOOLS_KEY),
                LEGACY_INSTALL_DIR_VALUE,
                RegValue::String(install_dir.display().to_string()),
            )
            .with_dir(install_dir.clone())
            .with_device(&format!("{LEGACY_BUS_DEVICE}&SUBSYS_00015853&REV_01"));
        let mut h = harness(memory, MemoryFlagStore::new());

        let report = system_clean(&h.ctx, Workaround2k8::Off).await.unwrap();

        assert!(report.completed.contains(&CleanupStage::UninstallLegacy));
        assert!(h.store.is_set(Milestone::XenLegacyUninstalled).await.unwrap());
        assert!(!h.memory.key_exists(&native_entry));
        assert!(!h.memory.path_exists(&install_dir));
        assert!(h.memory.devices().is_empty());
        assert_eq!(report.warnings.len(), 1);

        let best_effort: Vec<String> = h
            .events()
            .into_iter()
            .filter_map(|e| match e {
                AppEvent::Cleanup(CleanupEvent::BestEffortFailed { stage, step, .. }) => {
                    assert_eq!(stage, CleanupStage::UninstallLegacy);
                    Some(step)
                }
                _ => None,
            })
            .collect();
        assert_eq!(best_effort, vec![format!("delete {wow_entry}")]);
    }

    #[tokio::test]
    async fn test_legacy_skips_wow64_view_on_x86() {
        let memory = clean_system().with_arch(pvdrv_types::TargetArch::X86);
        let h = harness(memory, MemoryFlagStore::new());

        system_clean(&h.ctx, Workaround2k8::Off).await.unwrap();
        assert!(!h.memory.calls().iter().any(|c| c.contains("32-bit view")));
    }

    #[tokio::test]
    async fn test_purge_removes_remnants() {
        let drivers_dir = PathBuf::from(r"C:\Windows\System32\drivers");
        let memory = clean_system()
            .with_drivers_dir(drivers_dir.clone())
            .with_device(PURGE_HARDWARE_IDS[0])
            .with_device(r"PCI\VEN_8086&DEV_7010")
            .with_key(&service("xenbus").join("Parameters"))
            .with_key(&service("xeniface"))
            .with_file(drivers_dir.join("xenbus.sys"), "")
            .with_file(drivers_dir.join("xenvif.sys"), "")
            .with_undeletable(drivers_dir.join("xenfilt.sys"));
        let h = harness(memory, MemoryFlagStore::new());

        let report = system_clean(&h.ctx, Workaround2k8::Off).await.unwrap();

        assert!(h.store.is_set(Milestone::CleanedUp).await.unwrap());
        assert_eq!(h.memory.devices(), vec![r"PCI\VEN_8086&DEV_7010".to_string()]);
        assert!(!h.memory.key_exists(&service("xenbus")));
        assert!(!h.memory.key_exists(&service("xeniface")));
        assert!(!h.memory.path_exists(&drivers_dir.join("xenbus.sys")));
        assert!(!h.memory.path_exists(&drivers_dir.join("xenvif.sys")));
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("xenfilt.sys"));

        let removals = h
            .memory
            .calls()
            .iter()
            .filter(|c| c.starts_with("remove_file"))
            .count();
        assert_eq!(removals, DRIVER_BINARIES.len());
    }

    #[tokio::test]
    async fn test_workaround_keeps_bus_and_filter_services() {
        for (mode, os, kept) in [
            (Workaround2k8::On, OsVersion::new(10, 0), true),
            (Workaround2k8::Off, OsVersion::new(6, 0), false),
            (Workaround2k8::Auto, OsVersion::new(6, 0), true),
            (Workaround2k8::Auto, OsVersion::new(6, 1), false),
        ] {
            let memory = clean_system()
                .with_os_version(os)
                .with_key(&service("xenbus"))
                .with_key(&service("xenfilt"))
                .with_key(&service("xennet"));
            let h = harness(memory, MemoryFlagStore::new());

            system_clean(&h.ctx, mode).await.unwrap();

            assert_eq!(h.memory.key_exists(&service("xenbus")), kept, "{mode:?} on {os}");
            assert_eq!(h.memory.key_exists(&service("xenfilt")), kept, "{mode:?} on {os}");
            assert!(!h.memory.key_exists(&service("xennet")));
        }
    }
}
