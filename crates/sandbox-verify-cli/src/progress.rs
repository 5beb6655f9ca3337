// crates/sandbox-verify-cli/src/progress.rs
// ============================================================================
// Module: CLI Progress Output
// Description: Human-readable run observer for terminal progress.
// Purpose: Narrate sandbox and step lifecycle events while a run executes.
// Dependencies: sandbox-verify-core, std
// ============================================================================

//! ## Overview
//! [`ProgressObserver`] renders [`RunEvent`] values as short localized lines.
//! The final verdict is printed by the command itself, so run completion and
//! run errors produce no progress line. Write errors are ignored.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Mutex;
use std::sync::PoisonError;

use sandbox_verify_core::RunEvent;
use sandbox_verify_core::RunObserver;

use crate::t;

// ============================================================================
// SECTION: Formatting
// ============================================================================

/// Returns the progress lines for an event, or `None` when it is silent.
#[must_use]
pub fn describe(event: &RunEvent) -> Option<String> {
    match event {
        RunEvent::RunStarted {
            image,
            steps,
        } => Some(t!("progress.run_started", image = image, steps = steps)),
        RunEvent::SandboxAcquired {
            host_path,
            sandbox_path,
            ..
        } => Some(t!("progress.sandbox_acquired", host = host_path, mount = sandbox_path)),
        RunEvent::StepStarted {
            index,
            total,
            description,
            command,
            ..
        } => Some(format!(
            "{}\n{}",
            t!(
                "progress.step_started",
                index = index + 1,
                total = total,
                description = description
            ),
            t!("progress.step_command", command = command)
        )),
        RunEvent::StepPassed {
            exit_code,
            duration_ms,
            output,
            ..
        } => {
            let passed = t!("progress.step_passed", code = exit_code, duration = duration_ms);
            Some(match output {
                None => passed,
                Some(output) => format!(
                    "{passed}\n{}",
                    t!("progress.step_output", label = output.label, text = output.text)
                ),
            })
        }
        RunEvent::StepFailed {
            reason,
            ..
        } => Some(t!("progress.step_failed", reason = reason)),
        RunEvent::StepErrored {
            error,
            ..
        } => Some(t!("progress.step_errored", error = error)),
        RunEvent::SandboxReleased => Some(t!("progress.sandbox_released")),
        RunEvent::TeardownFailed {
            error,
        } => Some(t!("progress.teardown_failed", error = error)),
        RunEvent::RunFinished {
            ..
        }
        | RunEvent::RunErrored {
            ..
        } => None,
    }
}

// ============================================================================
// SECTION: Observer
// ============================================================================

/// Observer writing progress lines to a terminal stream.
pub struct ProgressObserver<W: Write + Send> {
    /// Destination stream.
    writer: Mutex<W>,
}

impl<W: Write + Send> ProgressObserver<W> {
    /// Creates a progress observer over `writer`.
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the observer and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> RunObserver for ProgressObserver<W> {
    fn record(&self, event: &RunEvent) {
        let Some(message) = describe(event) else {
            return;
        };
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{message}");
            let _ = writer.flush();
        }
    }
}
