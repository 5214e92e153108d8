//! Integration tests for config

#[cfg(test)]
mod tests {
    use pvdrv_config::*;
    use pvdrv_types::{ColorChoice, CopyPolicy, WaitTimeout, Workaround2k8};
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to ensure env var tests don't run concurrently
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_VARS: [&str; 4] = [
        "PVDRV_GATE_TIMEOUT",
        "PVDRV_UNINSTALL_ATTEMPTS",
        "PVDRV_WORKAROUND_2K8",
        "PVDRV_COLOR",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[general]
color = "never"

[paths]
driver_root = 'D:\xen\drivers'

[install]
gate_timeout_secs = 120
copy_policy = "overwrite"

[cleanup]
uninstall_attempts = 3
workaround_2k8 = "on"
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.general.color, ColorChoice::Never);
        assert_eq!(config.driver_root(), PathBuf::from(r"D:\xen\drivers"));
        assert_eq!(config.gate_timeout(), WaitTimeout::Seconds(120));
        assert_eq!(config.install.copy_policy, CopyPolicy::Overwrite);
        assert_eq!(config.cleanup.uninstall_attempts, 3);
        assert_eq!(config.cleanup.workaround_2k8, Workaround2k8::On);
    }

    #[tokio::test]
    async fn test_missing_sections_use_defaults() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[general]").unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.gate_timeout(), WaitTimeout::Infinite);
        assert_eq!(config.cleanup.uninstall_attempts, 5);
        assert_eq!(config.cleanup.workaround_2k8, Workaround2k8::Auto);
        assert_eq!(config.db_path(), PathBuf::from(constants::DB_PATH));
    }

    #[tokio::test]
    async fn test_zero_attempts_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[cleanup]\nuninstall_attempts = 0").unwrap();

        assert!(Config::load_from_file(temp_file.path()).await.is_err());
    }

    #[test]
    fn test_merge_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("PVDRV_GATE_TIMEOUT", "30");
        std::env::set_var("PVDRV_WORKAROUND_2K8", "off");
        std::env::set_var("PVDRV_COLOR", "always");

        let mut config = Config::default();
        config.merge_env().unwrap();

        assert_eq!(config.gate_timeout(), WaitTimeout::Seconds(30));
        assert_eq!(config.cleanup.workaround_2k8, Workaround2k8::Off);
        assert_eq!(config.general.color, ColorChoice::Always);

        std::env::set_var("PVDRV_GATE_TIMEOUT", "infinite");
        config.merge_env().unwrap();
        assert_eq!(config.gate_timeout(), WaitTimeout::Infinite);

        clear_env();
    }

    #[test]
    fn test_invalid_env_value() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("PVDRV_UNINSTALL_ATTEMPTS", "many");

        let mut config = Config::default();
        assert!(config.merge_env().is_err());

        clear_env();
    }
}
