// crates/sandbox-verify-core/src/core/request.rs
// ============================================================================
// Module: Sandbox Requests and Packaging Profiles
// Description: Inputs describing the environment to provision and the package to verify.
// Purpose: Keep every tunable of a verification run in plain, overridable values.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`SandboxRequest`] describes the ephemeral environment (base image, the
//! single host binding, keep-alive process, shell wrapper). [`PackagingProfile`]
//! holds the domain values the canonical step plan is built from. Both carry
//! the defaults for verifying the `amazon-efs-utils` Debian package on
//! Ubuntu 24.04 and are expected to be overridden by configuration.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default base image reference.
pub const DEFAULT_IMAGE: &str = "ubuntu:24.04";
/// Default mount point of the source tree inside the sandbox.
pub const DEFAULT_MOUNT_PATH: &str = "/app";
/// Default startup timeout for the sandbox, in seconds.
pub const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 300;

/// Default keep-alive command that keeps the sandbox running.
#[must_use]
pub fn default_keepalive() -> Vec<String> {
    vec!["tail".to_string(), "-f".to_string(), "/dev/null".to_string()]
}

/// Default shell wrapper used for every step command.
#[must_use]
pub fn default_shell() -> Vec<String> {
    vec!["/bin/sh".to_string(), "-c".to_string()]
}

/// Default environment variables for the sandbox.
#[must_use]
pub fn default_env() -> BTreeMap<String, String> {
    BTreeMap::from([("DEBIAN_FRONTEND".to_string(), "noninteractive".to_string())])
}

// ============================================================================
// SECTION: Binding
// ============================================================================

/// Host directory exposed at a fixed path inside the sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    /// Host directory (must exist and be writable).
    pub host_path: PathBuf,
    /// Absolute path inside the sandbox.
    pub sandbox_path: String,
}

impl Binding {
    /// Creates a binding.
    #[must_use]
    pub fn new(host_path: impl Into<PathBuf>, sandbox_path: impl Into<String>) -> Self {
        Self {
            host_path: host_path.into(),
            sandbox_path: sandbox_path.into(),
        }
    }
}

// ============================================================================
// SECTION: Sandbox Request
// ============================================================================

/// Everything the runtime needs to provision one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxRequest {
    /// Base image reference (`name[:tag]`).
    pub image: String,
    /// The single host-to-sandbox binding.
    pub binding: Binding,
    /// Long-lived process keeping the environment up.
    pub keepalive: Vec<String>,
    /// Shell prefix wrapped around every command (e.g. `/bin/sh -c`).
    pub shell: Vec<String>,
    /// Environment variables set on the sandbox.
    pub env: BTreeMap<String, String>,
    /// Maximum time for the environment to reach a running state.
    pub startup_timeout: Duration,
}

impl SandboxRequest {
    /// Creates a request with default keep-alive, shell, env, and timeout.
    #[must_use]
    pub fn new(image: impl Into<String>, binding: Binding) -> Self {
        Self {
            image: image.into(),
            binding,
            keepalive: default_keepalive(),
            shell: default_shell(),
            env: default_env(),
            startup_timeout: Duration::from_secs(DEFAULT_STARTUP_TIMEOUT_SECS),
        }
    }

    /// Wraps `command` in the configured shell invocation.
    #[must_use]
    pub fn shell_invocation(&self, command: &str) -> Vec<String> {
        let mut argv = self.shell.clone();
        argv.push(command.to_string());
        argv
    }
}

// ============================================================================
// SECTION: Packaging Profile
// ============================================================================

/// Domain values the canonical verification plan is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagingProfile {
    /// Command refreshing the package index before installs.
    pub refresh_command: String,
    /// Command prefix installing named packages.
    pub install_command: String,
    /// Toolchain packages required by the build script.
    pub packages: Vec<String>,
    /// Build script path relative to the mounted source root.
    pub build_script: String,
    /// Output directory relative to the mounted source root.
    pub output_dir: String,
    /// Glob matching the produced artifact inside `output_dir`.
    pub artifact_pattern: String,
    /// Token the artifact listing must contain.
    pub product_token: String,
    /// Command prefix installing the discovered artifact.
    pub artifact_install_command: String,
    /// Command reporting the installed identity.
    pub identity_command: String,
    /// Token the identity output must contain.
    pub identity_token: String,
}

impl Default for PackagingProfile {
    fn default() -> Self {
        Self {
            refresh_command: "apt-get update".to_string(),
            install_command: "apt-get install -y".to_string(),
            packages: [
                "build-essential",
                "libssl-dev",
                "pkg-config",
                "gettext",
                "cargo",
                "cmake",
                "clang",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            build_script: "./build-deb.sh".to_string(),
            output_dir: "build".to_string(),
            artifact_pattern: "*.deb".to_string(),
            product_token: "amazon-efs-utils".to_string(),
            artifact_install_command: "apt-get install -y".to_string(),
            identity_command: "mount.efs --version".to_string(),
            identity_token: "mount.efs".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Run Limits
// ============================================================================

/// Caller-imposed limits around a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunLimits {
    /// Optional timeout around all steps; `None` disables it.
    pub run_timeout: Option<Duration>,
}
