//! Integration tests for CLI argument parsing and early validation.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn provision_basebox() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("provision-basebox"));
    cmd.env("NO_COLOR", "1");
    for var in [
        "BASEBOX_HOST",
        "BASEBOX_PORT",
        "BASEBOX_USERNAME",
        "BASEBOX_PASSWORD",
        "BASEBOX_LOCAL_PKEY",
        "BASEBOX_GUEST_ADDITION_VERSION",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn temp_key() -> tempfile::NamedTempFile {
    let mut key = tempfile::NamedTempFile::new().expect("temp key");
    std::io::Write::write_all(&mut key, b"ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAA test\n")
        .expect("write key");
    key
}

// --- Help and version tests ---

#[test]
fn test_help_lists_all_provisioning_flags() {
    provision_basebox()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--host"))
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--username"))
        .stdout(predicate::str::contains("--password"))
        .stdout(predicate::str::contains("--local-pkey"))
        .stdout(predicate::str::contains("--guest-addition-version"));
}

#[test]
fn test_help_shows_defaults() {
    provision_basebox()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("127.0.0.1"))
        .stdout(predicate::str::contains("2222"))
        .stdout(predicate::str::contains("id_rsa.pub"))
        .stdout(predicate::str::contains("6.1.32"));
}

#[test]
fn test_version_flag_shows_name() {
    provision_basebox()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("provision-basebox"));
}

#[test]
fn test_password_env_value_is_hidden_from_help() {
    provision_basebox()
        .env("BASEBOX_PASSWORD", "hunter2")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("hunter2").not());
}

// --- Argument validation ---

#[test]
fn test_non_numeric_port_is_a_usage_error() {
    provision_basebox()
        .args(["--port", "ssh"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_missing_public_key_exits_one_with_trace() {
    provision_basebox()
        .args(["--local-pkey", "/nonexistent/basebox/id_rsa.pub"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("something went wrong, see trace below"))
        .stderr(predicate::str::contains("public key not found"));
}

#[test]
fn test_unsafe_username_exits_one_before_connecting() {
    let key = temp_key();
    provision_basebox()
        .arg("--local-pkey")
        .arg(key.path())
        .args(["--username", "root;reboot"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid username"));
}

#[test]
fn test_unsafe_guest_addition_version_exits_one() {
    let key = temp_key();
    provision_basebox()
        .arg("--local-pkey")
        .arg(key.path())
        .args(["--guest-addition-version", "6.1;rm -rf /"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid guest additions version"));
}

#[test]
fn test_unreachable_host_exits_one() {
    let key = temp_key();
    // Port 9 on loopback: connection refused without any network.
    provision_basebox()
        .arg("--local-pkey")
        .arg(key.path())
        .args(["--host", "127.0.0.1", "--port", "9"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot connect to 127.0.0.1:9"));
}

// --- NO_COLOR convention ---

#[test]
fn test_no_color_accepts_any_non_empty_value() {
    for value in ["1", "yes", "anything"] {
        let key = temp_key();
        provision_basebox()
            .env("NO_COLOR", value)
            .arg("--local-pkey")
            .arg(key.path())
            .args(["--host", "127.0.0.1", "--port", "9"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("cannot connect to 127.0.0.1:9"));
    }
}

#[test]
fn test_no_color_flag_still_reaches_validation() {
    provision_basebox()
        .env_remove("NO_COLOR")
        .arg("--no-color")
        .args(["--local-pkey", "/nonexistent/basebox/id_rsa.pub"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("public key not found"));
}
