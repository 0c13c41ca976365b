//! Smoke tests for the `uniserial` binary.
//!
//! Only paths that need no serial hardware: argument handling, `--describe`
//! and failure exit codes.

use pretty_assertions::assert_eq;
use std::path::Path;
use std::process::{Command, Output};

fn uniserial(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_uniserial"))
        .args(args)
        .current_dir(dir)
        .env_remove("UNISERIAL_CONFIG")
        .env_remove("RUST_LOG")
        .env("UNISERIAL_LOGGING_LEVEL", "error")
        .output()
        .expect("failed to run uniserial")
}

fn describe(dir: &Path, args: &[&str]) -> serde_json::Value {
    let mut full = vec!["--describe"];
    full.extend_from_slice(args);
    let output = uniserial(dir, &full);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("describe prints JSON")
}

#[test]
fn test_describe_defaults() {
    let dir = tempfile::tempdir().unwrap();

    let json = describe(dir.path(), &["--port", "/dev/ttyFAKE"]);

    assert_eq!(json["port_name"], "/dev/ttyFAKE");
    assert_eq!(json["baud_rate"], 115_200);
    assert_eq!(json["timing"]["vmin"], 0);
    assert_eq!(json["timing"]["vtime_tenths"], 1);
}

#[test]
fn test_describe_flags() {
    let dir = tempfile::tempdir().unwrap();

    let json = describe(
        dir.path(),
        &[
            "--port",
            "COM4",
            "--baud",
            "250000",
            "--databits",
            "7",
            "--even",
            "--chartimeout",
            "0",
            "--minread",
            "12",
        ],
    );

    assert_eq!(json["baud_rate"], 250_000);
    assert_eq!(json["parity"], "even");
    assert_eq!(json["timing"]["vmin"], 12);
    assert_eq!(json["timing"]["vtime_tenths"], 0);
}

#[test]
fn test_settings_file_supplies_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("uniserial.toml"),
        "[serial]\nbaud_rate = 4800\n\n[serial.port_aliases]\nbench = \"/dev/ttyBENCH\"\n",
    )
    .unwrap();

    let json = describe(dir.path(), &["--port", "bench"]);

    assert_eq!(json["port_name"], "/dev/ttyBENCH");
    assert_eq!(json["baud_rate"], 4800);
}

#[test]
fn test_unknown_parity_in_settings_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("uniserial.toml"), "[serial]\nparity = \"space\"\n").unwrap();

    let output = uniserial(dir.path(), &["--port", "COM1", "--describe"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid parity 'space'"));
}

#[test]
fn test_even_and_odd_conflict() {
    let dir = tempfile::tempdir().unwrap();

    let output = uniserial(dir.path(), &["--port", "COM1", "--even", "--odd"]);

    assert!(!output.status.success());
}

#[test]
fn test_port_is_required() {
    let dir = tempfile::tempdir().unwrap();

    let output = uniserial(dir.path(), &["--describe"]);

    assert!(!output.status.success());
}

#[test]
fn test_invalid_config_fails() {
    let dir = tempfile::tempdir().unwrap();

    let output = uniserial(
        dir.path(),
        &["--port", "COM1", "--describe", "--databits", "9"],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("data bits"));
}

#[test]
fn test_missing_device_fails() {
    let dir = tempfile::tempdir().unwrap();

    let output = uniserial(dir.path(), &["--port", "/dev/uniserial-does-not-exist"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_bad_payload_fails_before_open() {
    let dir = tempfile::tempdir().unwrap();

    let output = uniserial(
        dir.path(),
        &["--port", "/dev/uniserial-does-not-exist", "--txdata", "abc"],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("payload"));
}
