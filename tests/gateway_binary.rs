//! The `reminder-gateway` binary's command-line contract.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::ffi::OsStr;
use std::process::Command;

use reminder_bridge::ErrorKind;
use reminder_bridge::envelope::Envelope;

fn run<A: AsRef<OsStr>>(args: &[A]) -> (Option<i32>, Envelope, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_reminder-gateway"))
        .args(args)
        .env("RUST_LOG", "info")
        .output()
        .unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 1, "stdout must be one line: {stdout:?}");
    let envelope: Envelope = serde_json::from_str(stdout.trim()).unwrap();
    (
        output.status.code(),
        envelope,
        String::from_utf8_lossy(&output.stderr).into_owned(),
    )
}

#[test]
fn unknown_operation_fails_with_validation_envelope() {
    let (code, envelope, _) = run(&["dropEverything", "{}"]);
    assert_eq!(code, Some(1));
    assert!(!envelope.success);
    assert_eq!(envelope.kind, Some(ErrorKind::Validation));
}

#[test]
fn missing_operation_prints_usage_envelope() {
    let (code, envelope, _) = run::<&str>(&[]);
    assert_eq!(code, Some(1));
    assert!(envelope.error.unwrap().contains("usage"));
}

#[cfg(unix)]
#[test]
fn non_utf8_argument_is_validation_failure() {
    use std::os::unix::ffi::OsStrExt;

    let payload = OsStr::from_bytes(b"{\"name\":\"\xff\"}");
    let (code, envelope, _) = run(&[OsStr::new("createList"), payload]);
    assert_eq!(code, Some(1));
    assert_eq!(envelope.kind, Some(ErrorKind::Validation));
    assert!(envelope.error.unwrap().contains("UTF-8"));
}

#[cfg(not(target_os = "macos"))]
#[test]
fn non_macos_store_reports_permission_error() {
    let (code, envelope, stderr) = run(&["listLists"]);
    assert_eq!(code, Some(1));
    assert_eq!(envelope.kind, Some(ErrorKind::Permission));
    assert!(envelope.error.unwrap().contains("macOS"));
    assert!(stderr.contains("gateway operation failed"));
}
