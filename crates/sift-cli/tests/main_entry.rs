//! Integration tests for the `sift` binary entry point.
//!
//! Verifies that searches reach the standard streams and that malformed
//! patterns and missing arguments fail with user-facing messages.

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;
use tempfile::TempDir;

#[test]
fn search_reports_matches() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(dir.path().join("main.ts"), "a.b(null);\nx.b(null);\n").expect("write source");

    let mut command = cargo_bin_cmd!("sift");
    command.arg("search").arg("a.b(null);").arg(dir.path());
    command
        .assert()
        .success()
        .stdout(contains("main.ts:1:1: a.b(null);"));
}

#[test]
fn malformed_pattern_exits_with_failure() {
    let mut command = cargo_bin_cmd!("sift");
    command.args(["check", "'_x{3,1};"]);
    command
        .assert()
        .failure()
        .stderr(contains("E_SIFT_RANGE_INVALID"));
}

#[test]
fn missing_pattern_exits_with_failure() {
    let mut command = cargo_bin_cmd!("sift");
    command.arg("check");
    command
        .assert()
        .failure()
        .stderr(contains("PATTERN"));
}
