//! Integration tests for the `finch-cli` binary.
//!
//! Commands that need a robot are only exercised up to argument parsing and
//! validation, so the suite passes without hardware attached.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

fn cli() -> assert_cmd::Command {
    cargo_bin_cmd!("finch-cli")
}

#[test]
fn cli_help_succeeds() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("finch-cli"));
}

#[test]
fn cli_version_prints_version() {
    cli()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn cli_config_json_produces_valid_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let output = cli()
        .args(["--json", "--config"])
        .arg(&path)
        .arg("config")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value =
        serde_json::from_slice(&output).expect("config --json should produce valid JSON");
    assert!(json["settings"].is_object());
    assert_eq!(json["settings"]["ping_threshold_ms"], 2000);
    assert_eq!(json["config_file_exists"], false);
    assert_eq!(json["errors"].as_array().map(Vec::len), Some(0));
}

#[test]
fn cli_config_reports_validation_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "write_attempts = 0\n").unwrap();

    cli()
        .arg("--config")
        .arg(&path)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("(loaded)"))
        .stdout(predicate::str::contains("write_attempts must be at least 1"));
}

#[test]
fn cli_invalid_config_blocks_robot_commands() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "reply_deadline_ms = 0\n").unwrap();

    cli()
        .arg("--config")
        .arg(&path)
        .arg("halt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("reply_deadline_ms must be greater than 0"));
}

// ── --verbose flag ──

#[test]
fn cli_verbose_flag_accepted() {
    cli().args(["-v", "config"]).assert().success();
}

#[test]
fn cli_verbose_long_flag_accepted() {
    cli().args(["--verbose", "config"]).assert().success();
}

// ── Argument validation (no robot needed) ──

#[test]
fn cli_led_rejects_bad_hex() {
    cli()
        .args(["led", "#12345G"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid argument"));
}

#[test]
fn cli_led_rejects_two_channels() {
    cli()
        .args(["led", "10", "20"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("3 channels"));
}

#[test]
fn cli_led_rejects_out_of_range_channel() {
    cli()
        .args(["led", "0", "0", "256"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("outside 0..=255"));
}

#[test]
fn cli_wheels_rejects_negative_duration() {
    cli()
        .args(["wheels", "0.5", "-0.5", "--duration", "-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a valid time"));
}

#[test]
fn cli_buzz_rejects_non_numeric_frequency() {
    cli().args(["buzz", "1", "loud"]).assert().failure();
}

// ── Subcommand help ──

#[test]
fn cli_wheels_help_succeeds() {
    cli()
        .args(["wheels", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Drive the wheels"));
}

#[test]
fn cli_watch_help_succeeds() {
    cli()
        .args(["watch", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--interval"));
}

#[test]
fn cli_status_help_succeeds() {
    cli()
        .args(["status", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sensor"));
}
