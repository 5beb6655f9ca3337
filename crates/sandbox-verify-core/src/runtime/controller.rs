// crates/sandbox-verify-core/src/runtime/controller.rs
// ============================================================================
// Module: Sandbox Controller
// Description: Lifecycle owner of one ephemeral execution environment.
// Purpose: Acquire, execute in, and release a sandbox through a runtime backend.
// Dependencies: crate::{core, interfaces}, tokio
// ============================================================================

//! ## Overview
//! [`SandboxController`] is a thin orchestration layer over a
//! [`SandboxRuntime`]. It validates the host binding before anything is
//! started, wraps commands in the configured shell, refuses to run commands in
//! a released environment, and makes release idempotent.
//! Invariants:
//! - A [`SandboxEnvironment`] is live until its first release; later releases
//!   are no-ops with no runtime side effect.
//! - `exec` never turns a non-zero exit status into an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;

use crate::core::Binding;
use crate::core::CommandResult;
use crate::core::SandboxRequest;
use crate::interfaces::SandboxError;
use crate::interfaces::SandboxRuntime;
use crate::runtime::sequencer::millis;

// ============================================================================
// SECTION: Environment
// ============================================================================

/// One running ephemeral execution environment.
///
/// # Invariants
/// - `handle` is `Some` exactly while the environment is live.
#[derive(Debug)]
pub struct SandboxEnvironment<H> {
    /// Base image reference.
    image: String,
    /// Resolved host-to-sandbox binding.
    binding: Binding,
    /// Keep-alive command running in the environment.
    keepalive: Vec<String>,
    /// Shell prefix for commands.
    shell: Vec<String>,
    /// Runtime handle; cleared on release.
    handle: Option<H>,
}

impl<H> SandboxEnvironment<H> {
    /// Returns the base image reference.
    #[must_use]
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Returns the resolved binding (canonical host path).
    #[must_use]
    pub const fn binding(&self) -> &Binding {
        &self.binding
    }

    /// Returns the keep-alive command.
    #[must_use]
    pub fn keepalive(&self) -> &[String] {
        &self.keepalive
    }

    /// Returns true until the environment is released.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.handle.is_some()
    }
}

/// Result of a release call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The environment was torn down by this call.
    Released,
    /// The environment had already been released; nothing happened.
    AlreadyReleased,
}

// ============================================================================
// SECTION: Controller
// ============================================================================

/// Lifecycle controller for sandbox environments.
pub struct SandboxController<R: SandboxRuntime> {
    /// Backend runtime.
    runtime: R,
}

impl<R: SandboxRuntime> SandboxController<R> {
    /// Creates a controller over `runtime`.
    pub const fn new(runtime: R) -> Self {
        Self {
            runtime,
        }
    }

    /// Returns the backend runtime.
    pub const fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Starts a new environment for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::EnvironmentStart`] when the request is invalid,
    /// the host path is unusable, or the runtime fails to start within the
    /// request's startup timeout. A start cut short by the timeout is dropped,
    /// and the runtime is expected to remove anything it had created.
    pub async fn acquire(
        &self,
        request: &SandboxRequest,
    ) -> Result<SandboxEnvironment<R::Handle>, SandboxError> {
        let resolved = resolve_request(request)?;
        let started =
            tokio::time::timeout(resolved.startup_timeout, self.runtime.start(&resolved)).await;
        let handle = match started {
            Ok(Ok(handle)) => handle,
            Ok(Err(SandboxError::EnvironmentStart(message))) => {
                return Err(SandboxError::EnvironmentStart(message));
            }
            Ok(Err(other)) => return Err(SandboxError::EnvironmentStart(other.to_string())),
            Err(_) => {
                return Err(SandboxError::EnvironmentStart(format!(
                    "environment did not start within {} ms",
                    millis(resolved.startup_timeout)
                )));
            }
        };
        Ok(SandboxEnvironment {
            image: resolved.image,
            binding: resolved.binding,
            keepalive: resolved.keepalive,
            shell: resolved.shell,
            handle: Some(handle),
        })
    }

    /// Runs `command` through the environment shell and waits for it.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::Execution`] when the environment is released or
    /// the runtime cannot reach it.
    pub async fn exec(
        &self,
        env: &SandboxEnvironment<R::Handle>,
        command: &str,
    ) -> Result<CommandResult, SandboxError> {
        let Some(handle) = env.handle.as_ref() else {
            return Err(SandboxError::Execution("environment already released".to_string()));
        };
        let mut argv = env.shell.clone();
        argv.push(command.to_string());
        self.runtime.run(handle, &argv).await.map_err(|err| match err {
            SandboxError::Execution(message) => SandboxError::Execution(message),
            other => SandboxError::Execution(other.to_string()),
        })
    }

    /// Stops and removes the environment. Idempotent.
    ///
    /// The environment is marked released even when teardown fails, so a
    /// failed teardown is never retried implicitly.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::Teardown`] when the runtime reports a failure.
    pub async fn release(
        &self,
        env: &mut SandboxEnvironment<R::Handle>,
    ) -> Result<ReleaseOutcome, SandboxError> {
        let Some(handle) = env.handle.take() else {
            return Ok(ReleaseOutcome::AlreadyReleased);
        };
        self.runtime.teardown(handle).await.map_err(|err| match err {
            SandboxError::Teardown(message) => SandboxError::Teardown(message),
            other => SandboxError::Teardown(other.to_string()),
        })?;
        Ok(ReleaseOutcome::Released)
    }
}

// ============================================================================
// SECTION: Request Validation
// ============================================================================

/// Validates a request and canonicalises its host path.
fn resolve_request(request: &SandboxRequest) -> Result<SandboxRequest, SandboxError> {
    let start_error = SandboxError::EnvironmentStart;
    if request.image.trim().is_empty() {
        return Err(start_error("base image must be non-empty".to_string()));
    }
    if request.keepalive.is_empty() {
        return Err(start_error("keep-alive command must be non-empty".to_string()));
    }
    if request.shell.is_empty() {
        return Err(start_error("shell command must be non-empty".to_string()));
    }
    if !request.binding.sandbox_path.starts_with('/') {
        return Err(start_error(format!(
            "sandbox path must be absolute: {}",
            request.binding.sandbox_path
        )));
    }
    let host_path = &request.binding.host_path;
    let metadata = fs::metadata(host_path).map_err(|err| {
        start_error(format!("host path {} is not accessible: {err}", host_path.display()))
    })?;
    if !metadata.is_dir() {
        return Err(start_error(format!("host path {} is not a directory", host_path.display())));
    }
    if metadata.permissions().readonly() {
        return Err(start_error(format!("host path {} is read-only", host_path.display())));
    }
    let canonical = fs::canonicalize(host_path).map_err(|err| {
        start_error(format!("host path {} cannot be resolved: {err}", host_path.display()))
    })?;
    let mut resolved = request.clone();
    resolved.binding.host_path = canonical;
    Ok(resolved)
}
