// crates/sandbox-verify-core/tests/common/mod.rs
// ============================================================================
// Module: Shared Test Fixtures
// Description: Scripted runtimes, requests, and observers for core tests.
// ============================================================================
//! ## Overview
//! Builds the fixture sandbox used across the core integration tests: a
//! scripted runtime answering the canonical packaging plan the way a healthy
//! Ubuntu image would.

#![allow(dead_code, reason = "Each test binary uses a different subset of fixtures.")]
#![allow(clippy::expect_used, reason = "Fixture setup failures should abort the test.")]

use std::sync::Mutex;
use std::sync::PoisonError;

use sandbox_verify_core::Binding;
use sandbox_verify_core::CommandMatcher;
use sandbox_verify_core::CommandResult;
use sandbox_verify_core::PackagingProfile;
use sandbox_verify_core::Reply;
use sandbox_verify_core::RunEvent;
use sandbox_verify_core::RunObserver;
use sandbox_verify_core::SandboxRequest;
use sandbox_verify_core::ScriptedRuntime;
use sandbox_verify_core::VerificationPlan;
use tempfile::TempDir;

/// Artifact filename reported by the fixture discovery step.
pub const ARTIFACT: &str = "amazon-efs-utils_2.1.0_amd64.deb";
/// Identity output reported by a correctly installed artifact.
pub const IDENTITY_OUTPUT: &str = "mount.efs version 2.1.0";
/// Rendered dependency command of the canonical plan.
pub const DEPENDENCIES_COMMAND: &str =
    "apt-get update && apt-get install -y build-essential libssl-dev pkg-config gettext cargo cmake clang";
/// Rendered build command of the canonical plan.
pub const BUILD_COMMAND: &str = "cd /app && ./build-deb.sh";
/// Rendered discovery command of the canonical plan.
pub const DISCOVER_COMMAND: &str = "ls /app/build/*.deb";
/// Identity command of the canonical plan.
pub const IDENTITY_COMMAND: &str = "mount.efs --version";

/// Creates a writable source directory.
pub fn source_dir() -> TempDir {
    tempfile::tempdir().expect("create source dir")
}

/// Builds the default request binding `dir` at `/app`.
pub fn request_for(dir: &TempDir) -> SandboxRequest {
    SandboxRequest::new("ubuntu:24.04", Binding::new(dir.path(), "/app"))
}

/// Builds the canonical plan from the default profile.
pub fn canonical_plan() -> VerificationPlan {
    VerificationPlan::canonical(&PackagingProfile::default(), "/app").expect("canonical plan")
}

/// Scripted runtime answering discovery and identity like a healthy build.
pub fn healthy_runtime() -> ScriptedRuntime {
    let runtime = ScriptedRuntime::new();
    runtime.respond(
        CommandMatcher::Exact(DISCOVER_COMMAND.to_string()),
        Reply::Result(CommandResult::success(format!("{ARTIFACT}\n"))),
    );
    runtime.respond(
        CommandMatcher::Exact(IDENTITY_COMMAND.to_string()),
        Reply::Result(CommandResult::success(format!("{IDENTITY_OUTPUT}\n"))),
    );
    runtime
}

/// Observer keeping every event in memory.
#[derive(Default)]
pub struct RecordingObserver {
    /// Events in arrival order.
    events: Mutex<Vec<RunEvent>>,
}

impl RecordingObserver {
    /// Returns a copy of the recorded events.
    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Returns the names of steps that started, in order.
    pub fn started_steps(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                RunEvent::StepStarted {
                    name, ..
                } => Some(name),
                _ => None,
            })
            .collect()
    }
}

impl RunObserver for RecordingObserver {
    fn record(&self, event: &RunEvent) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event.clone());
    }
}
