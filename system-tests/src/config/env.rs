// system-tests/src/config/env.rs
// ============================================================================
// Module: System Test Environment
// Description: Environment-backed configuration for system tests.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid silent
//! misconfiguration. Invalid UTF-8 fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Image used by system tests when no override is set.
pub const DEFAULT_SYSTEM_TEST_IMAGE: &str = "ubuntu:24.04";

/// Environment keys for system test configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemTestEnv {
    /// Optional base image override.
    Image,
    /// Optional timeout override in seconds (positive integer).
    TimeoutSeconds,
    /// Keep fixture source directories after a run (`true`/`false` or `1`/`0`).
    KeepWorkdir,
}

impl SystemTestEnv {
    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "SANDBOX_VERIFY_SYSTEM_TEST_IMAGE",
            Self::TimeoutSeconds => "SANDBOX_VERIFY_SYSTEM_TEST_TIMEOUT_SEC",
            Self::KeepWorkdir => "SANDBOX_VERIFY_SYSTEM_TEST_KEEP_WORKDIR",
        }
    }
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Typed system test configuration derived from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemTestConfig {
    /// Base image for sandboxes started by the suites.
    pub image: String,
    /// Optional timeout override in seconds (positive integer).
    pub timeout: Option<Duration>,
    /// Keep fixture source directories after a run.
    pub keep_workdir: bool,
}

impl Default for SystemTestConfig {
    fn default() -> Self {
        Self {
            image: DEFAULT_SYSTEM_TEST_IMAGE.to_string(),
            timeout: None,
            keep_workdir: false,
        }
    }
}

impl SystemTestConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when an environment value is not valid UTF-8, is empty,
    /// or fails validation (for example, an invalid timeout or boolean value).
    pub fn load() -> Result<Self, String> {
        let image = read_env_nonempty(SystemTestEnv::Image.as_str())?
            .unwrap_or_else(|| DEFAULT_SYSTEM_TEST_IMAGE.to_string());
        let timeout = read_env_nonempty(SystemTestEnv::TimeoutSeconds.as_str())?
            .map(|value| parse_timeout_seconds(SystemTestEnv::TimeoutSeconds.as_str(), &value))
            .transpose()?;
        let keep_workdir = parse_bool_env(
            SystemTestEnv::KeepWorkdir.as_str(),
            read_env_nonempty(SystemTestEnv::KeepWorkdir.as_str())?,
        )?;
        Ok(Self {
            image,
            timeout,
            keep_workdir,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns an error when the environment variable contains invalid UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, String> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string().map(Some).map_err(|_| format!("{name} must be valid UTF-8"))
    })
}

/// Reads an environment variable and rejects empty values.
///
/// # Errors
///
/// Returns an error when the value is invalid UTF-8 or blank.
fn read_env_nonempty(name: &str) -> Result<Option<String>, String> {
    match read_env_strict(name)? {
        Some(value) if value.trim().is_empty() => Err(format!("{name} must not be empty")),
        other => Ok(other),
    }
}

/// Parses a positive timeout in seconds.
///
/// # Errors
///
/// Returns an error when the value is not a positive integer.
fn parse_timeout_seconds(name: &str, raw: &str) -> Result<Duration, String> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("{name} must be a positive integer number of seconds"))?;
    if secs == 0 {
        return Err(format!("{name} must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}

/// Parses a boolean flag.
///
/// # Errors
///
/// Returns an error when the value is not a recognized boolean literal.
fn parse_bool_env(name: &str, raw: Option<String>) -> Result<bool, String> {
    let Some(value) = raw else {
        return Ok(false);
    };
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") || trimmed == "1" {
        return Ok(true);
    }
    if trimmed.eq_ignore_ascii_case("false") || trimmed == "0" {
        return Ok(false);
    }
    Err(format!("{name} must be 1, 0, true, or false"))
}
