// crates/sandbox-verify-core/src/interfaces/mod.rs
// ============================================================================
// Module: Sandbox Verify Interfaces
// Description: Backend-agnostic sandbox runtime and run observer contracts.
// Purpose: Define the narrow seams between the core and external systems.
// Dependencies: crate::core, async-trait, serde, thiserror
// ============================================================================

//! ## Overview
//! [`SandboxRuntime`] is the only boundary to the container or VM backend:
//! start an environment, run an argv inside it, tear it down. Any backend can
//! be substituted without touching the sequencer. [`RunObserver`] receives
//! structured [`RunEvent`]s for logging and progress output.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::core::CommandResult;
use crate::core::FailureReason;
use crate::core::SandboxRequest;
use crate::core::StepOutput;
use crate::core::Verdict;

// ============================================================================
// SECTION: Sandbox Runtime
// ============================================================================

/// Sandbox runtime errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SandboxError {
    /// The environment could not be created or did not reach a running state.
    #[error("sandbox failed to start: {0}")]
    EnvironmentStart(String),
    /// A command could not be dispatched to the environment.
    #[error("sandbox execution failed: {0}")]
    Execution(String),
    /// The environment could not be stopped or removed.
    #[error("sandbox teardown failed: {0}")]
    Teardown(String),
}

/// Capability interface over an external sandbox backend.
#[async_trait]
pub trait SandboxRuntime: Send + Sync {
    /// Backend handle for one running environment.
    type Handle: Send + Sync;

    /// Starts an environment for the request and returns once it is running.
    ///
    /// Implementations must clean up any partially created environment before
    /// returning an error.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::EnvironmentStart`] when startup fails.
    async fn start(&self, request: &SandboxRequest) -> Result<Self::Handle, SandboxError>;

    /// Runs `argv` inside the environment and blocks until it completes.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::Execution`] when the environment is unreachable.
    /// A non-zero exit status is returned as a normal [`CommandResult`].
    async fn run(&self, handle: &Self::Handle, argv: &[String])
    -> Result<CommandResult, SandboxError>;

    /// Stops and removes the environment.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::Teardown`] when the backend reports a failure.
    async fn teardown(&self, handle: Self::Handle) -> Result<(), SandboxError>;
}

// ============================================================================
// SECTION: Run Events
// ============================================================================

/// Structured event emitted during a verification run.
///
/// # Invariants
/// - Event names are stable for log consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    /// A run is about to acquire its sandbox.
    RunStarted {
        /// Base image reference.
        image: String,
        /// Number of planned steps.
        steps: usize,
    },
    /// The sandbox reached a running state.
    SandboxAcquired {
        /// Base image reference.
        image: String,
        /// Canonical host path of the binding.
        host_path: String,
        /// Sandbox path of the binding.
        sandbox_path: String,
    },
    /// A step is about to run.
    StepStarted {
        /// Zero-based step index.
        index: usize,
        /// Number of planned steps.
        total: usize,
        /// Step name.
        name: String,
        /// Step description.
        description: String,
        /// Rendered command.
        command: String,
    },
    /// A step met all expectations.
    StepPassed {
        /// Zero-based step index.
        index: usize,
        /// Step name.
        name: String,
        /// Observed exit status.
        exit_code: i64,
        /// Wall-clock duration in milliseconds.
        duration_ms: u64,
        /// Reported stdout, for steps that report their output.
        #[serde(skip_serializing_if = "Option::is_none")]
        output: Option<StepOutput>,
    },
    /// A step failed its assertion.
    StepFailed {
        /// Zero-based step index.
        index: usize,
        /// Step name.
        name: String,
        /// Observed exit status.
        exit_code: i64,
        /// First unmet expectation.
        reason: FailureReason,
    },
    /// A step could not be executed.
    StepErrored {
        /// Zero-based step index.
        index: usize,
        /// Step name.
        name: String,
        /// Error message.
        error: String,
    },
    /// The sandbox was stopped and removed.
    SandboxReleased,
    /// Teardown reported an error.
    TeardownFailed {
        /// Error message.
        error: String,
    },
    /// The run completed with a verdict.
    RunFinished {
        /// Pass/fail verdict.
        verdict: Verdict,
    },
    /// The run aborted on an infrastructure error.
    RunErrored {
        /// Error message.
        error: String,
    },
}

/// Sink for run events.
pub trait RunObserver: Send + Sync {
    /// Records an event. Observers must not fail the run.
    fn record(&self, event: &RunEvent);
}
