// system-tests/tests/suites/cli_workflows.rs
// ============================================================================
// Module: CLI Workflow Tests
// Description: End-to-end sandbox-verify CLI command coverage.
// Purpose: Validate exit codes, stdout verdicts, and stderr reports.
// Dependencies: system-tests helpers, serde_json
// ============================================================================

//! CLI workflow coverage for Sandbox Verify system-tests.

use std::fs;

use helpers::cli::cli_binary;
use helpers::cli::run_cli;
use helpers::fixtures::PackageFixture;
use helpers::infra::ensure_docker_available;
use serde_json::Value;

use crate::helpers;

fn binary() -> Result<std::path::PathBuf, String> {
    cli_binary().ok_or_else(|| "sandbox-verify binary unavailable".to_string())
}

#[test]
fn version_flag_prints_version() -> Result<(), String> {
    let output = run_cli(&binary()?, &["--version"])?;
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("sandbox-verify "));
    Ok(())
}

#[test]
fn config_example_validates() -> Result<(), String> {
    let binary = binary()?;
    let output = run_cli(&binary, &["config", "example"])?;
    assert!(output.status.success());
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("example.toml");
    fs::write(&path, &output.stdout).map_err(|err| err.to_string())?;
    let path_text = path.to_string_lossy().to_string();
    let output = run_cli(&binary, &["config", "validate", "--config", &path_text])?;
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "Config valid.");
    Ok(())
}

#[test]
fn invalid_config_exits_with_infrastructure_code() -> Result<(), String> {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[sandbox]\nunknown = true\n").map_err(|err| err.to_string())?;
    let path_text = path.to_string_lossy().to_string();
    let output = run_cli(&binary()?, &["run", "--config", &path_text])?;
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load config"));
    Ok(())
}

#[test]
fn plan_lists_steps_without_docker() -> Result<(), String> {
    let fixture = PackageFixture::healthy()?;
    let config = fixture.write_config()?;
    let config_text = config.to_string_lossy().to_string();
    let output = run_cli(&binary()?, &["plan", "--config", &config_text])?;
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("5. identity: "));
    assert!(stdout.contains("command: apt-get update"));
    Ok(())
}

#[test]
fn run_passes_with_json_report() -> Result<(), String> {
    ensure_docker_available()?;
    let fixture = PackageFixture::healthy()?;
    let config = fixture.write_config()?;
    let events = fixture.path().join("events.jsonl");
    let config_text = config.to_string_lossy().to_string();
    let events_text = events.to_string_lossy().to_string();
    let output = run_cli(&binary()?, &[
        "run",
        "--config",
        &config_text,
        "--format",
        "json",
        "--events",
        &events_text,
        "--quiet",
    ])?;
    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));
    let report: Value = serde_json::from_slice(&output.stdout).map_err(|err| err.to_string())?;
    assert_eq!(report["verdict"], "passed");
    assert_eq!(report["teardown"]["status"], "released");
    let log = fs::read_to_string(&events).map_err(|err| err.to_string())?;
    let last = log.lines().last().ok_or("empty event log")?;
    let last: Value = serde_json::from_str(last).map_err(|err| err.to_string())?;
    assert_eq!(last["event"], "run_finished");
    fixture.finish();
    Ok(())
}

#[test]
fn run_failure_exits_one_with_report_on_stderr() -> Result<(), String> {
    ensure_docker_available()?;
    let fixture = PackageFixture::without_helper()?;
    let config = fixture.write_config()?;
    let config_text = config.to_string_lossy().to_string();
    let output = run_cli(&binary()?, &["run", "--config", &config_text, "--quiet"])?;
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stdout.trim(), "FAILED at step 5/5 (identity).");
    assert!(stderr.contains("step 5/5 failed"));
    assert!(stderr.contains("command: mount.efs --version"));
    fixture.finish();
    Ok(())
}
