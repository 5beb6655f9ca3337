// system-tests/tests/helpers/infra.rs
// ============================================================================
// Module: System Test Infrastructure
// Description: Docker availability and container checks for system-tests.
// Purpose: Fail fast when no Docker engine is reachable and inspect leftovers.
// Dependencies: std::process, bollard
// ============================================================================

//! ## Overview
//! Docker availability checks and container listing for sandbox system-tests.

use std::process::Command;

use bollard::Docker;
use bollard::query_parameters::ListContainersOptions;

/// Returns an error unless `docker info` succeeds.
pub fn ensure_docker_available() -> Result<(), String> {
    let output = Command::new("docker")
        .arg("info")
        .output()
        .map_err(|err| format!("docker info failed: {err}"))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("docker info failed: {stderr}"));
    }
    Ok(())
}

/// Lists containers in any state whose name starts with `prefix`.
pub async fn containers_with_prefix(prefix: &str) -> Result<Vec<String>, String> {
    let docker = Docker::connect_with_local_defaults()
        .map_err(|err| format!("docker connect failed: {err}"))?;
    let options = ListContainersOptions {
        all: true,
        ..ListContainersOptions::default()
    };
    let containers = docker
        .list_containers(Some(options))
        .await
        .map_err(|err| format!("docker list failed: {err}"))?;
    let wanted = format!("/{prefix}");
    Ok(containers
        .into_iter()
        .flat_map(|container| container.names.unwrap_or_default())
        .filter(|name| name.starts_with(&wanted))
        .collect())
}
