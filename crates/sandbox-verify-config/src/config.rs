// crates/sandbox-verify-config/src/config.rs
// ============================================================================
// Module: Sandbox Verify Configuration
// Description: Configuration loading and validation for verification runs.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: sandbox-verify-core, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path comes from the caller, then `SANDBOX_VERIFY_CONFIG`, then
//! `sandbox-verify.toml` in the working directory. Only the implicit default
//! file may be absent; every section has defaults matching the canonical
//! packaging profile. Unknown keys are rejected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use sandbox_verify_core::Binding;
use sandbox_verify_core::PackagingProfile;
use sandbox_verify_core::RunLimits;
use sandbox_verify_core::SandboxRequest;
use sandbox_verify_core::core::request::DEFAULT_IMAGE;
use sandbox_verify_core::core::request::DEFAULT_MOUNT_PATH;
use sandbox_verify_core::core::request::DEFAULT_STARTUP_TIMEOUT_SECS;
use sandbox_verify_core::core::request::default_env;
use sandbox_verify_core::core::request::default_keepalive;
use sandbox_verify_core::core::request::default_shell;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "sandbox-verify.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "SANDBOX_VERIFY_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of dependency packages.
pub(crate) const MAX_PACKAGES: usize = 256;
/// Maximum length of a configured shell command.
pub(crate) const MAX_COMMAND_LENGTH: usize = 4096;
/// Minimum sandbox startup timeout in seconds.
pub(crate) const MIN_STARTUP_TIMEOUT_SECS: u64 = 1;
/// Maximum sandbox startup timeout in seconds.
pub(crate) const MAX_STARTUP_TIMEOUT_SECS: u64 = 3600;
/// Maximum whole-run timeout in seconds.
pub(crate) const MAX_RUN_TIMEOUT_SECS: u64 = 24 * 60 * 60;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Sandbox Verify configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SandboxVerifyConfig {
    /// Sandbox provisioning settings.
    #[serde(default)]
    pub sandbox: SandboxConfig,
    /// Whole-run limits.
    #[serde(default)]
    pub run: RunConfig,
    /// Build dependency installation.
    #[serde(default)]
    pub dependencies: DependenciesConfig,
    /// Packaging build invocation.
    #[serde(default)]
    pub build: BuildConfig,
    /// Artifact discovery and installation.
    #[serde(default)]
    pub artifact: ArtifactConfig,
    /// Installed artifact identity check.
    #[serde(default)]
    pub identity: IdentityConfig,
    /// File the configuration was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl SandboxVerifyConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path)?;
        validate_path(&resolved)?;
        if !explicit && !resolved.exists() {
            return Ok(Self::default());
        }
        let bytes = fs::read(&resolved).map_err(|err| {
            ConfigError::Io(format!("failed to read {}: {err}", resolved.display()))
        })?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::from_toml(content)?;
        config.source_path = Some(resolved);
        Ok(config)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sandbox.validate()?;
        self.run.validate()?;
        self.dependencies.validate()?;
        self.build.validate()?;
        self.artifact.validate()?;
        self.identity.validate()?;
        Ok(())
    }

    /// Returns the directory relative sources resolve against.
    #[must_use]
    pub fn base_dir(&self) -> PathBuf {
        self.source_path
            .as_deref()
            .and_then(Path::parent)
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    }

    /// Returns the host source directory, resolved against `base_dir`.
    #[must_use]
    pub fn source_dir(&self, base_dir: &Path) -> PathBuf {
        if self.sandbox.source.is_absolute() {
            self.sandbox.source.clone()
        } else {
            base_dir.join(&self.sandbox.source)
        }
    }

    /// Builds the sandbox request, resolving the source against `base_dir`.
    #[must_use]
    pub fn sandbox_request(&self, base_dir: &Path) -> SandboxRequest {
        SandboxRequest {
            image: self.sandbox.image.clone(),
            binding: Binding::new(self.source_dir(base_dir), self.sandbox.mount_path.clone()),
            keepalive: self.sandbox.keepalive.clone(),
            shell: self.sandbox.shell.clone(),
            env: self.sandbox.env.clone(),
            startup_timeout: Duration::from_secs(self.sandbox.startup_timeout_secs),
        }
    }

    /// Builds the packaging profile for the canonical plan.
    #[must_use]
    pub fn profile(&self) -> PackagingProfile {
        PackagingProfile {
            refresh_command: self.dependencies.refresh_command.clone(),
            install_command: self.dependencies.install_command.clone(),
            packages: self.dependencies.packages.clone(),
            build_script: self.build.script.clone(),
            output_dir: self.build.output_dir.clone(),
            artifact_pattern: self.artifact.pattern.clone(),
            product_token: self.artifact.product_token.clone(),
            artifact_install_command: self.artifact.install_command.clone(),
            identity_command: self.identity.command.clone(),
            identity_token: self.identity.token.clone(),
        }
    }

    /// Returns the whole-run limits.
    #[must_use]
    pub const fn run_limits(&self) -> RunLimits {
        RunLimits {
            run_timeout: match self.run.timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }
}

/// Sandbox provisioning configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SandboxConfig {
    /// Base image reference.
    #[serde(default = "default_image")]
    pub image: String,
    /// Host source directory, relative to the config file.
    #[serde(default = "default_source")]
    pub source: PathBuf,
    /// Mount point inside the sandbox.
    #[serde(default = "default_mount_path")]
    pub mount_path: String,
    /// Keep-alive command.
    #[serde(default = "default_keepalive")]
    pub keepalive: Vec<String>,
    /// Shell prefix for step commands.
    #[serde(default = "default_shell")]
    pub shell: Vec<String>,
    /// Startup timeout in seconds.
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,
    /// Environment variables set on the sandbox.
    #[serde(default = "default_env")]
    pub env: BTreeMap<String, String>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            image: default_image(),
            source: default_source(),
            mount_path: default_mount_path(),
            keepalive: default_keepalive(),
            shell: default_shell(),
            startup_timeout_secs: default_startup_timeout_secs(),
            env: default_env(),
        }
    }
}

impl SandboxConfig {
    /// Validates sandbox configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let image = self.image.trim();
        if image.is_empty() {
            return Err(ConfigError::Invalid("sandbox.image must be non-empty".to_string()));
        }
        if image.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid(
                "sandbox.image must not contain whitespace".to_string(),
            ));
        }
        validate_path_string("sandbox.source", &self.source.to_string_lossy())?;
        validate_path_string("sandbox.mount_path", &self.mount_path)?;
        if !self.mount_path.starts_with('/') {
            return Err(ConfigError::Invalid("sandbox.mount_path must be absolute".to_string()));
        }
        validate_argv("sandbox.keepalive", &self.keepalive)?;
        validate_argv("sandbox.shell", &self.shell)?;
        if !(MIN_STARTUP_TIMEOUT_SECS ..= MAX_STARTUP_TIMEOUT_SECS)
            .contains(&self.startup_timeout_secs)
        {
            return Err(ConfigError::Invalid(format!(
                "sandbox.startup_timeout_secs must be between {MIN_STARTUP_TIMEOUT_SECS} and \
                 {MAX_STARTUP_TIMEOUT_SECS}"
            )));
        }
        for key in self.env.keys() {
            if key.is_empty() || key.contains('=') || key.chars().any(char::is_whitespace) {
                return Err(ConfigError::Invalid(format!("sandbox.env has invalid name: '{key}'")));
            }
        }
        Ok(())
    }
}

/// Whole-run limits configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Timeout around all steps in seconds; 0 disables it.
    #[serde(default)]
    pub timeout_secs: u64,
}

impl RunConfig {
    /// Validates run configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs > MAX_RUN_TIMEOUT_SECS {
            return Err(ConfigError::Invalid(format!(
                "run.timeout_secs must be at most {MAX_RUN_TIMEOUT_SECS}"
            )));
        }
        Ok(())
    }
}

/// Build dependency configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependenciesConfig {
    /// Package index refresh command.
    #[serde(default = "default_refresh_command")]
    pub refresh_command: String,
    /// Package install command prefix.
    #[serde(default = "default_install_command")]
    pub install_command: String,
    /// Toolchain packages.
    #[serde(default = "default_packages")]
    pub packages: Vec<String>,
}

impl Default for DependenciesConfig {
    fn default() -> Self {
        Self {
            refresh_command: default_refresh_command(),
            install_command: default_install_command(),
            packages: default_packages(),
        }
    }
}

impl DependenciesConfig {
    /// Validates dependency configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_command("dependencies.refresh_command", &self.refresh_command)?;
        validate_command("dependencies.install_command", &self.install_command)?;
        if self.packages.len() > MAX_PACKAGES {
            return Err(ConfigError::Invalid(format!(
                "dependencies.packages exceeds {MAX_PACKAGES} entries"
            )));
        }
        for package in &self.packages {
            if package.is_empty() || package.chars().any(char::is_whitespace) {
                return Err(ConfigError::Invalid(format!(
                    "dependencies.packages has invalid entry: '{package}'"
                )));
            }
        }
        Ok(())
    }
}

/// Packaging build configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Build script, relative to the mounted source root.
    #[serde(default = "default_build_script")]
    pub script: String,
    /// Output directory, relative to the mounted source root.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            script: default_build_script(),
            output_dir: default_output_dir(),
        }
    }
}

impl BuildConfig {
    /// Validates build configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_command("build.script", &self.script)?;
        validate_path_string("build.output_dir", &self.output_dir)?;
        if self.output_dir.starts_with('/') {
            return Err(ConfigError::Invalid("build.output_dir must be relative".to_string()));
        }
        Ok(())
    }
}

/// Artifact discovery and installation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactConfig {
    /// Glob matching the artifact in the output directory.
    #[serde(default = "default_artifact_pattern")]
    pub pattern: String,
    /// Token the listing must contain.
    #[serde(default = "default_product_token")]
    pub product_token: String,
    /// Command prefix installing the artifact.
    #[serde(default = "default_install_command")]
    pub install_command: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            pattern: default_artifact_pattern(),
            product_token: default_product_token(),
            install_command: default_install_command(),
        }
    }
}

impl ArtifactConfig {
    /// Validates artifact configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.pattern.trim().is_empty() || self.pattern.contains('/') {
            return Err(ConfigError::Invalid(
                "artifact.pattern must be a non-empty file name glob".to_string(),
            ));
        }
        validate_token("artifact.product_token", &self.product_token)?;
        validate_command("artifact.install_command", &self.install_command)
    }
}

/// Installed artifact identity configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    /// Command printing the installed identity.
    #[serde(default = "default_identity_command")]
    pub command: String,
    /// Token the identity output must contain.
    #[serde(default = "default_identity_token")]
    pub token: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            command: default_identity_command(),
            token: default_identity_token(),
        }
    }
}

impl IdentityConfig {
    /// Validates identity configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_command("identity.command", &self.command)?;
        validate_token("identity.token", &self.token)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path; the flag is true when the path was requested.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a shell command string.
fn validate_command(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if value.len() > MAX_COMMAND_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    Ok(())
}

/// Validates an expected output token.
fn validate_token(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    Ok(())
}

/// Validates an argv-style command list.
fn validate_argv(field: &str, argv: &[String]) -> Result<(), ConfigError> {
    match argv.first() {
        Some(program) if !program.trim().is_empty() => Ok(()),
        _ => Err(ConfigError::Invalid(format!("{field} must name a program"))),
    }
}

/// Default base image.
fn default_image() -> String {
    DEFAULT_IMAGE.to_string()
}

/// Default source directory.
fn default_source() -> PathBuf {
    PathBuf::from(".")
}

/// Default sandbox mount path.
fn default_mount_path() -> String {
    DEFAULT_MOUNT_PATH.to_string()
}

/// Default startup timeout.
const fn default_startup_timeout_secs() -> u64 {
    DEFAULT_STARTUP_TIMEOUT_SECS
}

/// Default package index refresh command.
fn default_refresh_command() -> String {
    PackagingProfile::default().refresh_command
}

/// Default package install command prefix.
fn default_install_command() -> String {
    PackagingProfile::default().install_command
}

/// Default toolchain packages.
fn default_packages() -> Vec<String> {
    PackagingProfile::default().packages
}

/// Default build script.
fn default_build_script() -> String {
    PackagingProfile::default().build_script
}

/// Default output directory.
fn default_output_dir() -> String {
    PackagingProfile::default().output_dir
}

/// Default artifact glob.
fn default_artifact_pattern() -> String {
    PackagingProfile::default().artifact_pattern
}

/// Default product token.
fn default_product_token() -> String {
    PackagingProfile::default().product_token
}

/// Default identity command.
fn default_identity_command() -> String {
    PackagingProfile::default().identity_command
}

/// Default identity token.
fn default_identity_token() -> String {
    PackagingProfile::default().identity_token
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::*;

    #[test]
    fn defaults_match_packaging_profile() {
        let config = SandboxVerifyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.profile(), PackagingProfile::default());
        assert_eq!(config.run_limits(), RunLimits::default());
    }

    #[test]
    fn startup_timeout_bounds_are_inclusive() {
        let mut config = SandboxConfig {
            startup_timeout_secs: MIN_STARTUP_TIMEOUT_SECS,
            ..SandboxConfig::default()
        };
        assert!(config.validate().is_ok());
        config.startup_timeout_secs = MAX_STARTUP_TIMEOUT_SECS;
        assert!(config.validate().is_ok());
        config.startup_timeout_secs = 0;
        assert!(config.validate().unwrap_err().to_string().contains("startup_timeout_secs"));
        config.startup_timeout_secs = MAX_STARTUP_TIMEOUT_SECS + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn run_timeout_upper_bound() {
        assert!(RunConfig { timeout_secs: MAX_RUN_TIMEOUT_SECS }.validate().is_ok());
        assert!(RunConfig { timeout_secs: MAX_RUN_TIMEOUT_SECS + 1 }.validate().is_err());
    }

    #[test]
    fn package_list_is_capped() {
        let config = DependenciesConfig {
            packages: vec!["pkg".to_string(); MAX_PACKAGES + 1],
            ..DependenciesConfig::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("exceeds"));
    }

    #[test]
    fn validate_path_string_rejects_component_too_long() {
        let path = format!("./{}", "a".repeat(MAX_PATH_COMPONENT_LENGTH + 1));
        let result = validate_path_string("test_path", &path);
        assert!(result.unwrap_err().to_string().contains("component too long"));
    }

    #[test]
    fn base_dir_falls_back_to_current_directory() {
        let mut config = SandboxVerifyConfig::default();
        assert_eq!(config.base_dir(), PathBuf::from("."));
        config.source_path = Some(PathBuf::from("sandbox-verify.toml"));
        assert_eq!(config.base_dir(), PathBuf::from("."));
        config.source_path = Some(PathBuf::from("/work/pkg/sandbox-verify.toml"));
        assert_eq!(config.base_dir(), PathBuf::from("/work/pkg"));
    }
}
