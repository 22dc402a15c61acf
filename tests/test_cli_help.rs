use assert_cmd::Command;
use predicates::prelude::*;

fn kvm_udev() -> Command {
    Command::cargo_bin("kvm-udev").unwrap()
}

#[test]
fn test_help_includes_required_options() {
    kvm_udev()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--interval"))
        .stdout(predicate::str::contains("--json"))
        .stdout(predicate::str::contains("--kernel"))
        .stdout(predicate::str::contains("--quiet"))
        .stdout(predicate::str::contains("--version"))
        .stdout(predicate::str::contains("--help"));
}

#[test]
fn test_help_describes_purpose() {
    kvm_udev()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("KVM"));
}

#[test]
fn test_version_output() {
    kvm_udev()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("kvm-udev "));
}

#[test]
fn test_unknown_option_is_rejected() {
    kvm_udev()
        .arg("--uuid")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unexpected argument"));
}
