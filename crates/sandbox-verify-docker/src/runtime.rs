// crates/sandbox-verify-docker/src/runtime.rs
// ============================================================================
// Module: Docker Sandbox Runtime
// Description: testcontainers-backed implementation of SandboxRuntime.
// Purpose: Start, exec in, and remove disposable Docker containers.
// Dependencies: sandbox-verify-core, testcontainers, bollard, tokio
// ============================================================================

//! ## Overview
//! Each [`DockerRuntime::start`] call creates one uniquely named container
//! from the requested image with the host binding mounted read-write and the
//! keep-alive process as its command. Commands run through `docker exec`;
//! their output is drained to completion and the exit status is then polled
//! until the process has exited.
//! Invariants:
//! - A container that fails to start is never returned to the caller, and is
//!   force-removed by name, including when the start future is dropped.
//! - Dropping a [`DockerHandle`] removes its container.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use bollard::Docker;
use bollard::errors::Error as DockerError;
use bollard::query_parameters::RemoveContainerOptions;
use sandbox_verify_core::CommandResult;
use sandbox_verify_core::SandboxError;
use sandbox_verify_core::SandboxRequest;
use sandbox_verify_core::SandboxRuntime;
use testcontainers::ContainerAsync;
use testcontainers::GenericImage;
use testcontainers::ImageExt;
use testcontainers::core::ExecCommand;
use testcontainers::core::Mount;
use testcontainers::runners::AsyncRunner;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Tag used when an image reference has none.
pub const DEFAULT_TAG: &str = "latest";
/// Default prefix of container names.
pub const DEFAULT_NAME_PREFIX: &str = "sandbox-verify";
/// Delay between exit status reads.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Per-process container sequence number.
static NEXT_CONTAINER: AtomicU64 = AtomicU64::new(0);

// ============================================================================
// SECTION: Image References
// ============================================================================

/// Image reference split into repository name and tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Repository name, including any registry host.
    pub name: String,
    /// Image tag.
    pub tag: String,
}

impl ImageReference {
    /// Parses `name[:tag]`, defaulting the tag to `latest`.
    ///
    /// A colon before the last `/` belongs to a registry port, not a tag.
    ///
    /// # Errors
    ///
    /// Returns a message when the reference is empty, has an empty tag, or
    /// pins a digest.
    pub fn parse(reference: &str) -> Result<Self, String> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err("image reference must be non-empty".to_string());
        }
        if reference.contains('@') {
            return Err(format!("image digests are not supported: {reference}"));
        }
        let path_start = reference.rfind('/').map_or(0, |index| index + 1);
        match reference[path_start ..].rfind(':') {
            None => Ok(Self {
                name: reference.to_string(),
                tag: DEFAULT_TAG.to_string(),
            }),
            Some(offset) => {
                let split = path_start + offset;
                let (name, tag) = (&reference[.. split], &reference[split + 1 ..]);
                if name.is_empty() || tag.is_empty() {
                    return Err(format!("invalid image reference: {reference}"));
                }
                Ok(Self {
                    name: name.to_string(),
                    tag: tag.to_string(),
                })
            }
        }
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.tag)
    }
}

// ============================================================================
// SECTION: Handle
// ============================================================================

/// Running container owned by one sandbox environment.
pub struct DockerHandle {
    /// Container name.
    name: String,
    /// Container; removed when dropped.
    container: ContainerAsync<GenericImage>,
}

impl DockerHandle {
    /// Returns the container identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        self.container.id()
    }

    /// Returns the container name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for DockerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DockerHandle")
            .field("name", &self.name)
            .field("id", &self.id())
            .finish()
    }
}

// ============================================================================
// SECTION: Start Cleanup
// ============================================================================

/// Named container that has not finished starting.
///
/// Dropping it while armed schedules a forced removal on the current Tokio
/// runtime.
struct PendingContainer {
    /// Container name.
    name: String,
    /// Cleared once the container is owned elsewhere or already removed.
    armed: bool,
}

impl PendingContainer {
    /// Tracks a container about to be created under `name`.
    const fn new(name: String) -> Self {
        Self {
            name,
            armed: true,
        }
    }

    /// Hands ownership of the container to a started handle.
    fn disarm(mut self) {
        self.armed = false;
    }

    /// Force-removes the container now.
    async fn remove(mut self) -> Result<(), String> {
        self.armed = false;
        force_remove(&self.name).await
    }
}

impl Drop for PendingContainer {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let name = std::mem::take(&mut self.name);
            runtime.spawn(async move {
                let _ = force_remove(&name).await;
            });
        }
    }
}

/// Removes the named container and its anonymous volumes, if it exists.
async fn force_remove(name: &str) -> Result<(), String> {
    let docker = Docker::connect_with_local_defaults()
        .map_err(|err| format!("connecting to docker to remove {name} failed: {err}"))?;
    let options = RemoveContainerOptions {
        force: true,
        v: true,
        ..RemoveContainerOptions::default()
    };
    match docker.remove_container(name, Some(options)).await {
        Ok(())
        | Err(DockerError::DockerResponseServerError {
            status_code: 404,
            ..
        }) => Ok(()),
        Err(err) => Err(format!("removing container {name} failed: {err}")),
    }
}

/// Returns a container name unique to this process and call.
fn container_name(prefix: &str) -> String {
    let nanos =
        SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |elapsed| elapsed.subsec_nanos());
    let sequence = NEXT_CONTAINER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{}-{nanos:09}-{sequence}", std::process::id())
}

// ============================================================================
// SECTION: Runtime
// ============================================================================

/// Sandbox runtime backed by the local Docker engine.
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    /// Prefix of generated container names.
    name_prefix: String,
}

impl DockerRuntime {
    /// Creates a Docker runtime using the ambient Docker configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_name_prefix(DEFAULT_NAME_PREFIX)
    }

    /// Creates a runtime naming its containers `<prefix>-<pid>-<nanos>-<n>`.
    ///
    /// The prefix must be a valid Docker container name.
    #[must_use]
    pub fn with_name_prefix(prefix: impl Into<String>) -> Self {
        Self {
            name_prefix: prefix.into(),
        }
    }

    /// Returns the container name prefix.
    #[must_use]
    pub fn name_prefix(&self) -> &str {
        &self.name_prefix
    }
}

impl Default for DockerRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SandboxRuntime for DockerRuntime {
    type Handle = DockerHandle;

    async fn start(&self, request: &SandboxRequest) -> Result<Self::Handle, SandboxError> {
        let image = ImageReference::parse(&request.image).map_err(SandboxError::EnvironmentStart)?;
        let host_path = request.binding.host_path.to_str().ok_or_else(|| {
            SandboxError::EnvironmentStart(format!(
                "host path is not valid UTF-8: {}",
                request.binding.host_path.display()
            ))
        })?;
        let name = container_name(&self.name_prefix);
        let mut container = GenericImage::new(image.name.clone(), image.tag.clone())
            .with_cmd(request.keepalive.clone())
            .with_mount(Mount::bind_mount(host_path, request.binding.sandbox_path.clone()))
            .with_startup_timeout(request.startup_timeout)
            .with_container_name(name.clone());
        for (key, value) in &request.env {
            container = container.with_env_var(key.clone(), value.clone());
        }
        let pending = PendingContainer::new(name.clone());
        match container.start().await {
            Ok(container) => {
                pending.disarm();
                Ok(DockerHandle {
                    name,
                    container,
                })
            }
            Err(err) => {
                let message = format!("failed to start {image}: {err}");
                let message = match pending.remove().await {
                    Ok(()) => message,
                    Err(cleanup) => format!("{message}; {cleanup}"),
                };
                Err(SandboxError::EnvironmentStart(message))
            }
        }
    }

    async fn run(
        &self,
        handle: &Self::Handle,
        argv: &[String],
    ) -> Result<CommandResult, SandboxError> {
        let mut result = handle
            .container
            .exec(ExecCommand::new(argv.to_vec()))
            .await
            .map_err(|err| SandboxError::Execution(format!("exec failed: {err}")))?;
        let stdout = result
            .stdout_to_vec()
            .await
            .map_err(|err| SandboxError::Execution(format!("reading stdout failed: {err}")))?;
        let stderr = result
            .stderr_to_vec()
            .await
            .map_err(|err| SandboxError::Execution(format!("reading stderr failed: {err}")))?;
        loop {
            let exit_code = result
                .exit_code()
                .await
                .map_err(|err| SandboxError::Execution(format!("inspecting exec failed: {err}")))?;
            if let Some(exit_code) = exit_code {
                return Ok(CommandResult::from_bytes(exit_code, &stdout, &stderr));
            }
            tokio::time::sleep(EXIT_POLL_INTERVAL).await;
        }
    }

    async fn teardown(&self, handle: Self::Handle) -> Result<(), SandboxError> {
        let id = handle.id().to_string();
        handle
            .container
            .rm()
            .await
            .map_err(|err| SandboxError::Teardown(format!("removing container {id} failed: {err}")))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
