// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CONTEXT: End-to-end tests of the verify-gc-flags binary
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable
//! TEST_COVERAGE: 8 tests
//!
//! TEST_SCOPE:
//!   - Exit code contract (0 pass, 1 assertion failure, 2 harness error)
//!   - Summary output and JSON report
//!   - Configuration file and environment handling
//!
//! TEST_SCENARIOS:
//!   - test_healthy_runtime_exits_zero(): summary lists four PASS lines
//!   - test_report_is_written(): --report produces parseable JSON
//!   - test_inherited_env_options_reach_the_child(): TEST_VM_OPTS is honoured
//!   - test_config_file_failure_exits_one(): inherited options from TOML
//!   - test_timeout_exits_two(): hung runtime is a harness error
//!   - test_bad_selector_exits_two(): --only validation
//!   - test_missing_config_exits_two(): unreadable config file
//!   - test_zero_timeout_exits_two(): unusable setting rejected before any launch

use std::fs;
use std::process::{Command, Output};

use tempfile::TempDir;

const HARNESS: &str = env!("CARGO_BIN_EXE_verify-gc-flags");
const STUB: &str = env!("CARGO_BIN_EXE_stub-jvm");

fn harness(args: &[&str]) -> Command {
    let mut cmd = Command::new(HARNESS);
    cmd.args(["--java", STUB, "--no-stage"])
        .args(args)
        .env("RUST_LOG", "warn")
        .env_remove("TEST_VM_OPTS")
        .env_remove("TEST_JAVA_OPTS");
    cmd
}

fn run(cmd: &mut Command) -> (i32, String, String) {
    let Output { status, stdout, stderr } = cmd.output().expect("spawn verify-gc-flags");
    (
        status.code().expect("exit code"),
        String::from_utf8_lossy(&stdout).into_owned(),
        String::from_utf8_lossy(&stderr).into_owned(),
    )
}

#[test]
fn test_healthy_runtime_exits_zero() {
    let (code, stdout, stderr) = run(&mut harness(&[]));
    assert_eq!(code, 0, "stdout:\n{stdout}\nstderr:\n{stderr}");
    assert_eq!(stdout.lines().filter(|line| line.starts_with("PASS")).count(), 4);
    assert!(stdout.contains("4 combination(s), 0 assertion failure(s), 0 harness error(s)"));
}

#[test]
fn test_report_is_written() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.json");
    let (code, _, stderr) = run(&mut harness(&["--report", path.to_str().unwrap()]));
    assert_eq!(code, 0, "{stderr}");

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let combos = value["combinations"].as_array().unwrap();
    assert_eq!(combos.len(), 4);
    assert!(combos.iter().all(|c| c["outcome"]["status"] == "passed"));
    assert_eq!(combos[1]["combination"]["verify_before"], true);
    assert_eq!(combos[1]["combination"]["verify_after"], true);
}

#[test]
fn test_inherited_env_options_reach_the_child() {
    let (code, stdout, _) =
        run(harness(&["--only", "on,off"]).env("TEST_VM_OPTS", "-Dstub.mode=swap -XX:+VerifyAfterGC"));
    assert_eq!(code, 1, "{stdout}");
    assert!(stdout.contains("FAIL (2 assertion(s))"));
    assert!(stdout.contains("-Dstub.mode=swap"));
    // The stale switch is filtered out of the command line.
    assert!(!stdout.contains("-XX:+VerifyAfterGC"));
}

#[test]
fn test_config_file_failure_exits_one() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("harness.toml");
    fs::write(&config, "timeout_secs = 30\ninherited_options = [\"-Dstub.mode=corrupt\"]\n").unwrap();

    let (code, stdout, _) = run(&mut harness(&["--config", config.to_str().unwrap()]));
    assert_eq!(code, 1, "{stdout}");
    assert!(stdout.contains("corrupted VerifyBeforeGC marker"), "{stdout}");
    assert!(stdout.contains("      | VerifyAfterGC:"), "{stdout}");
    assert!(stdout.ends_with("4 combination(s), 8 assertion failure(s), 0 harness error(s)\n"));
}

#[test]
fn test_timeout_exits_two() {
    let (code, stdout, _) = run(harness(&["--only", "on,on", "--timeout-secs", "1"])
        .env("TEST_VM_OPTS", "-Dstub.mode=hang"));
    assert_eq!(code, 2, "{stdout}");
    assert!(stdout.contains("ERROR"));
    assert!(stdout.contains("1 combination(s), 0 assertion failure(s), 1 harness error(s)"));
}

#[test]
fn test_bad_selector_exits_two() {
    let (code, stdout, stderr) = run(&mut harness(&["--only", "maybe,on"]));
    assert_eq!(code, 2);
    assert!(stdout.is_empty());
    assert!(stderr.contains("maybe,on"), "{stderr}");
}

#[test]
fn test_missing_config_exits_two() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");
    let (code, _, stderr) = run(&mut harness(&["--config", missing.to_str().unwrap()]));
    assert_eq!(code, 2);
    assert!(stderr.contains("absent.toml"), "{stderr}");
}

#[test]
fn test_zero_timeout_exits_two() {
    let (code, stdout, stderr) = run(&mut harness(&["--timeout-secs", "0"]));
    assert_eq!(code, 2);
    assert!(stdout.is_empty());
    assert!(stderr.contains("timeout_secs"), "{stderr}");
}
