// system-tests/tests/suites/packaging.rs
// ============================================================================
// Module: Packaging Verification Tests
// Description: Full five-step runs against fixture packages in Docker.
// Purpose: Validate verdicts, failure reports, and teardown on real containers.
// Dependencies: sandbox-verify-core, sandbox-verify-docker, helpers
// ============================================================================

//! End-to-end packaging verification against a real Docker engine.

use std::time::Duration;

use helpers::fixtures::IDENTITY_OUTPUT;
use helpers::fixtures::PackageFixture;
use helpers::fixtures::light_profile;
use helpers::infra::ensure_docker_available;
use helpers::timeouts::resolve_timeout;
use sandbox_verify_core::FailureReason;
use sandbox_verify_core::NoopObserver;
use sandbox_verify_core::RunLimits;
use sandbox_verify_core::SandboxController;
use sandbox_verify_core::TeardownStatus;
use sandbox_verify_core::Verdict;
use sandbox_verify_core::VerificationPlan;
use sandbox_verify_core::VerificationRunner;
use sandbox_verify_docker::DockerRuntime;

use crate::helpers;

fn runner() -> Result<VerificationRunner<DockerRuntime>, String> {
    let plan = VerificationPlan::canonical(&light_profile(), "/app").map_err(|err| err.to_string())?;
    Ok(VerificationRunner::new(
        SandboxController::new(DockerRuntime::new()),
        plan,
        RunLimits {
            run_timeout: Some(resolve_timeout(Duration::from_secs(900))),
        },
    ))
}

#[tokio::test(flavor = "multi_thread")]
async fn healthy_package_passes_all_steps() -> Result<(), String> {
    ensure_docker_available()?;
    let fixture = PackageFixture::healthy()?;
    let report = runner()?
        .run(&fixture.request()?, &NoopObserver)
        .await
        .map_err(|err| err.to_string())?;

    let failure = report.failure.as_ref().map(ToString::to_string).unwrap_or_default();
    assert_eq!(report.verdict, Verdict::Passed, "{failure}");
    let names: Vec<&str> = report.steps.iter().map(|step| step.name.as_str()).collect();
    assert_eq!(names, ["dependencies", "build", "discover", "install", "identity"]);
    assert_eq!(
        report.steps[3].command,
        "apt-get install -y /app/build/amazon-efs-utils_2.1.0_all.deb"
    );
    let version = report.steps[4].output.as_ref().map(|output| output.text.as_str());
    assert_eq!(version, Some(IDENTITY_OUTPUT));
    assert_eq!(report.teardown, TeardownStatus::Released);
    assert!(fixture.path().join("build/amazon-efs-utils_2.1.0_all.deb").exists());
    fixture.finish();
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_helper_fails_identity_step() -> Result<(), String> {
    ensure_docker_available()?;
    let fixture = PackageFixture::without_helper()?;
    let report = runner()?
        .run(&fixture.request()?, &NoopObserver)
        .await
        .map_err(|err| err.to_string())?;

    assert_eq!(report.verdict, Verdict::Failed);
    assert_eq!(report.steps.len(), 4);
    let failure = report.failure.as_ref().ok_or("missing failure report")?;
    assert_eq!(failure.name, "identity");
    assert_eq!(failure.exit_code, 127);
    assert!(matches!(failure.reason, FailureReason::ExitCode { expected: 0, actual: 127 }));
    assert!(!failure.stdout.contains(IDENTITY_OUTPUT));
    assert!(!failure.stderr.is_empty());
    assert_eq!(report.teardown, TeardownStatus::Released);
    fixture.finish();
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_build_output_fails_discovery() -> Result<(), String> {
    ensure_docker_available()?;
    let fixture = PackageFixture::healthy()?;
    std::fs::write(fixture.path().join("build-deb.sh"), "#!/bin/sh\nmkdir -p build\n")
        .map_err(|err| format!("overwrite build script: {err}"))?;
    let report = runner()?
        .run(&fixture.request()?, &NoopObserver)
        .await
        .map_err(|err| err.to_string())?;

    assert_eq!(report.verdict, Verdict::Failed);
    let failure = report.failure.as_ref().ok_or("missing failure report")?;
    assert_eq!(failure.name, "discover");
    assert_eq!(report.steps.len(), 2);
    fixture.finish();
    Ok(())
}
