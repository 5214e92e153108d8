//! Integration tests for the pvdrv CLI

use std::process::Command;

#[test]
fn test_cli_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_pvdrv"))
        .arg("--version")
        .output()
        .expect("Failed to execute pvdrv");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("pvdrv"));
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_pvdrv"))
        .arg("--help")
        .output()
        .expect("Failed to execute pvdrv");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["install", "stage", "install-hwid", "clean", "wait", "status"] {
        assert!(stdout.contains(command), "help is missing {command}");
    }
}

#[test]
fn test_cli_invalid_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_pvdrv"))
        .arg("invalid-command")
        .output()
        .expect("Failed to execute pvdrv");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unrecognized subcommand"));
}

#[test]
fn test_install_hwid_rejects_unknown_device() {
    let output = Command::new(env!("CARGO_BIN_EXE_pvdrv"))
        .args(["install-hwid", "xenbus", "DEV_9999"])
        .output()
        .expect("Failed to execute pvdrv");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("DEV_9999"));
}

#[test]
fn test_invalid_config_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "[cleanup]\nuninstall_attempts = 0\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_pvdrv"))
        .arg("--config")
        .arg(&config)
        .arg("status")
        .env("PVDRV_LOGS_DIR", dir.path().join("logs"))
        .env("PVDRV_STATE_PATH", dir.path().join("state.sqlite"))
        .output()
        .expect("Failed to execute pvdrv");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("uninstall_attempts"));
}

#[cfg(not(windows))]
#[test]
fn test_non_windows_host_is_refused() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_pvdrv"))
        .arg("status")
        .env("PVDRV_LOGS_DIR", dir.path().join("logs"))
        .env("PVDRV_STATE_PATH", dir.path().join("state.sqlite"))
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute pvdrv");

    assert_eq!(output.status.code(), Some(1));
    assert!(!dir.path().join("state.sqlite").exists());
}
