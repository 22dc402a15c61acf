//! Contract tests for startup validation
//!
//! Every case here must fail before the notification channel is opened,
//! so none of them depend on netlink access.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn kvm_udev() -> Command {
    Command::cargo_bin("kvm-udev").unwrap()
}

#[test]
fn test_missing_config_file_fails() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("absent.toml");

    kvm_udev()
        .args(["--config", config_path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
fn test_out_of_range_interval_in_file_fails() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("bounds.toml");
    fs::write(
        &config_path,
        r#"
[monitor]
polling_interval = 301.0  # Above maximum (300.0)
"#,
    )
    .unwrap();

    kvm_udev()
        .args(["--config", config_path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid polling interval"));
}

#[test]
fn test_wrong_type_in_file_fails() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("invalid.toml");
    fs::write(
        &config_path,
        r#"
[monitor]
polling_interval = "fast"
"#,
    )
    .unwrap();

    kvm_udev()
        .args(["--config", config_path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse configuration file"));
}

#[test]
fn test_unknown_category_fails() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("categories.toml");
    fs::write(
        &config_path,
        r#"
[trace]
categories = ["kvm_created", "kvm_exit"]
"#,
    )
    .unwrap();

    kvm_udev()
        .args(["--config", config_path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown trace category"));
}

#[test]
fn test_out_of_range_interval_on_command_line_fails() {
    kvm_udev()
        .args(["--interval", "0.01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid polling interval"));
}

#[test]
fn test_non_numeric_interval_fails() {
    kvm_udev()
        .args(["--interval", "soon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
