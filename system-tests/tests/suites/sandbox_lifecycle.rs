// system-tests/tests/suites/sandbox_lifecycle.rs
// ============================================================================
// Module: Sandbox Lifecycle Tests
// Description: Acquire, exec, and release against the Docker runtime.
// Purpose: Validate container behavior the sequencer relies on.
// Dependencies: sandbox-verify-core, sandbox-verify-docker, helpers
// ============================================================================

//! Sandbox lifecycle coverage against a real Docker engine.

use std::fs;
use std::time::Duration;

use helpers::fixtures::PackageFixture;
use helpers::infra::containers_with_prefix;
use helpers::infra::ensure_docker_available;
use helpers::timeouts::resolve_timeout;
use sandbox_verify_core::ReleaseOutcome;
use sandbox_verify_core::SandboxController;
use sandbox_verify_core::SandboxError;
use sandbox_verify_docker::DockerRuntime;

use crate::helpers;

#[tokio::test(flavor = "multi_thread")]
async fn exec_reports_exit_status_and_output() -> Result<(), String> {
    ensure_docker_available()?;
    let fixture = PackageFixture::healthy()?;
    let controller = SandboxController::new(DockerRuntime::new());
    let mut env = tokio::time::timeout(
        resolve_timeout(Duration::from_secs(300)),
        controller.acquire(&fixture.request()?),
    )
    .await
    .map_err(|_| "sandbox start timed out".to_string())?
    .map_err(|err| err.to_string())?;

    let echoed = controller.exec(&env, "echo hello && echo oops >&2").await;
    let failed = controller.exec(&env, "exit 3").await;
    let release = controller.release(&mut env).await;

    let echoed = echoed.map_err(|err| err.to_string())?;
    assert_eq!(echoed.exit_code(), 0);
    assert_eq!(echoed.stdout(), "hello\n");
    assert_eq!(echoed.stderr(), "oops\n");
    let failed = failed.map_err(|err| err.to_string())?;
    assert_eq!(failed.exit_code(), 3);
    assert_eq!(release, Ok(ReleaseOutcome::Released));
    fixture.finish();
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn sandbox_writes_are_visible_on_host() -> Result<(), String> {
    ensure_docker_available()?;
    let fixture = PackageFixture::healthy()?;
    let controller = SandboxController::new(DockerRuntime::new());
    let mut env = controller.acquire(&fixture.request()?).await.map_err(|err| err.to_string())?;

    let wrote = controller.exec(&env, "echo from-sandbox > /app/marker.txt").await;
    let release = controller.release(&mut env).await;

    assert_eq!(wrote.map_err(|err| err.to_string())?.exit_code(), 0);
    assert_eq!(release, Ok(ReleaseOutcome::Released));
    let marker = fs::read_to_string(fixture.path().join("marker.txt"))
        .map_err(|err| format!("read marker: {err}"))?;
    assert_eq!(marker, "from-sandbox\n");
    fixture.finish();
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn released_sandbox_rejects_exec() -> Result<(), String> {
    ensure_docker_available()?;
    let fixture = PackageFixture::healthy()?;
    let controller = SandboxController::new(DockerRuntime::new());
    let mut env = controller.acquire(&fixture.request()?).await.map_err(|err| err.to_string())?;

    assert_eq!(controller.release(&mut env).await, Ok(ReleaseOutcome::Released));
    assert_eq!(controller.release(&mut env).await, Ok(ReleaseOutcome::AlreadyReleased));
    let result = controller.exec(&env, "true").await;
    assert!(matches!(result, Err(SandboxError::Execution(_))));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_image_fails_to_start() -> Result<(), String> {
    ensure_docker_available()?;
    let fixture = PackageFixture::healthy()?;
    let controller = SandboxController::new(DockerRuntime::new());
    let mut request = fixture.request()?;
    request.image = "sandbox-verify-missing/image:does-not-exist".to_string();

    let result = controller.acquire(&request).await;
    assert!(matches!(result, Err(SandboxError::EnvironmentStart(_))));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_start_leaves_no_container() -> Result<(), String> {
    ensure_docker_available()?;
    let fixture = PackageFixture::healthy()?;
    let prefix = format!("sv-start-failure-{}", std::process::id());
    let controller = SandboxController::new(DockerRuntime::with_name_prefix(prefix.clone()));
    let mut request = fixture.request()?;
    request.keepalive = vec!["does-not-exist".to_string()];

    let result = controller.acquire(&request).await;

    assert!(matches!(result, Err(SandboxError::EnvironmentStart(_))));
    let leftovers = containers_with_prefix(&prefix).await?;
    assert!(leftovers.is_empty(), "containers left behind: {}", leftovers.join(", "));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn exec_waits_for_exit_after_output_closes() -> Result<(), String> {
    ensure_docker_available()?;
    let fixture = PackageFixture::healthy()?;
    let controller = SandboxController::new(DockerRuntime::new());
    let mut env = controller.acquire(&fixture.request()?).await.map_err(|err| err.to_string())?;

    let result = controller
        .exec(&env, "echo started; exec >/dev/null 2>&1; sleep 7; exit 4")
        .await;
    let release = controller.release(&mut env).await;

    let result = result.map_err(|err| err.to_string())?;
    assert_eq!(result.exit_code(), 4);
    assert_eq!(result.stdout(), "started\n");
    assert_eq!(release, Ok(ReleaseOutcome::Released));
    Ok(())
}
