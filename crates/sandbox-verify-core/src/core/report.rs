// crates/sandbox-verify-core/src/core/report.rs
// ============================================================================
// Module: Run Reports
// Description: Step records, failure reports, and the overall run verdict.
// Purpose: Surface the first failure with enough context to reproduce it.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Passed steps are summarized as [`StepRecord`] values; the failing step, if
//! any, is captured in full as a [`StepFailure`] carrying the description,
//! the exact command, exit status, stdout, and stderr.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Serialize;

// ============================================================================
// SECTION: Failure Reasons
// ============================================================================

/// Why a step assertion failed.
///
/// # Invariants
/// - Variants are stable for programmatic handling and JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// Exit status differs from the expected value.
    ExitCode {
        /// Expected exit status.
        expected: i64,
        /// Observed exit status.
        actual: i64,
    },
    /// Stdout lacks an expected token.
    MissingToken {
        /// Token that was not found.
        token: String,
    },
    /// A capture found no value in stdout.
    CaptureMissing {
        /// Capture name.
        name: String,
    },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExitCode {
                expected,
                actual,
            } => write!(f, "exit status {actual}, expected {expected}"),
            Self::MissingToken {
                token,
            } => write!(f, "stdout does not contain \"{token}\""),
            Self::CaptureMissing {
                name,
            } => write!(f, "stdout has no line to capture as {name}"),
        }
    }
}

// ============================================================================
// SECTION: Step Records
// ============================================================================

/// Summary of a step that passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    /// Zero-based step index.
    pub index: usize,
    /// Step name.
    pub name: String,
    /// Rendered command that ran.
    pub command: String,
    /// Observed exit status.
    pub exit_code: i64,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Reported stdout, for steps that report their output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<StepOutput>,
}

/// Labelled stdout of a passing step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutput {
    /// Display label, e.g. `Installed version`.
    pub label: String,
    /// Trimmed standard output.
    pub text: String,
}

/// Full diagnostic context of the step that failed its assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepFailure {
    /// Zero-based step index.
    pub index: usize,
    /// Number of steps in the plan.
    pub total: usize,
    /// Step name.
    pub name: String,
    /// Step description.
    pub description: String,
    /// Exact command issued.
    pub command: String,
    /// Observed exit status.
    pub exit_code: i64,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// First unmet expectation.
    pub reason: FailureReason,
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "step {}/{} failed: {} ({})",
            self.index + 1,
            self.total,
            self.description,
            self.name
        )?;
        writeln!(f, "reason: {}", self.reason)?;
        writeln!(f, "command: {}", self.command)?;
        writeln!(f, "exit status: {}", self.exit_code)?;
        writeln!(f, "--- stdout ---")?;
        write_block(f, &self.stdout)?;
        writeln!(f, "--- stderr ---")?;
        write_block(f, &self.stderr)
    }
}

/// Writes captured output, terminating it with a newline when needed.
fn write_block(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    if text.is_empty() {
        return writeln!(f, "(empty)");
    }
    f.write_str(text)?;
    if text.ends_with('\n') { Ok(()) } else { writeln!(f) }
}

// ============================================================================
// SECTION: Run Report
// ============================================================================

/// Overall pass/fail verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Every step passed.
    Passed,
    /// A step failed its assertion.
    Failed,
}

impl Verdict {
    /// Returns a stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

/// Result of releasing the sandbox at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum TeardownStatus {
    /// The environment was stopped and removed.
    Released,
    /// Teardown reported an error; the environment may need manual cleanup.
    Failed(String),
}

/// Report of a completed verification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Pass/fail verdict.
    pub verdict: Verdict,
    /// Steps that passed, in order.
    pub steps: Vec<StepRecord>,
    /// Failing step, present when the verdict is `Failed`.
    pub failure: Option<StepFailure>,
    /// Teardown outcome.
    pub teardown: TeardownStatus,
}

impl RunReport {
    /// Returns true when the run passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Passed
    }
}
