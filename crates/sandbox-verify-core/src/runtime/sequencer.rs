// crates/sandbox-verify-core/src/runtime/sequencer.rs
// ============================================================================
// Module: Verification Sequencer
// Description: Linear step state machine over a sandbox controller.
// Purpose: Execute plan steps strictly in order and stop at the first failure.
// Dependencies: crate::{core, interfaces, runtime::controller}, std
// ============================================================================

//! ## Overview
//! The sequencer walks `NotStarted -> Running(i) -> {Passed | Failed(i, reason)}`.
//! Each step renders its command from earlier captures, runs it through the
//! [`SandboxController`], and applies its expectations. The first unmet
//! expectation ends the sequence; no later step runs and nothing is retried.
//! Invariants:
//! - A sequencer executes at most once.
//! - The command result of a passing step is dropped after assessment; only
//!   the failing step keeps its output, inside the [`StepFailure`], and steps
//!   with a report label keep their trimmed stdout.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;
use std::time::Instant;

use crate::core::FailureReason;
use crate::core::StepFailure;
use crate::core::StepOutput;
use crate::core::StepRecord;
use crate::core::VerificationPlan;
use crate::interfaces::RunEvent;
use crate::interfaces::RunObserver;
use crate::interfaces::SandboxRuntime;
use crate::runtime::controller::SandboxController;
use crate::runtime::controller::SandboxEnvironment;
use crate::runtime::runner::RunError;

// ============================================================================
// SECTION: State
// ============================================================================

/// Position of a sequencer in its state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceState {
    /// No step has run yet.
    NotStarted,
    /// The step at this index is running.
    Running(usize),
    /// Every step passed.
    Passed,
    /// The step at `step` failed its assertion.
    Failed {
        /// Zero-based index of the failing step.
        step: usize,
        /// First unmet expectation.
        reason: FailureReason,
    },
}

/// Terminal result of a sequence that ran to a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceOutcome {
    /// Every step passed.
    Passed {
        /// Records of all steps.
        steps: Vec<StepRecord>,
    },
    /// A step failed its assertion.
    Failed {
        /// Records of the steps that passed before the failure.
        steps: Vec<StepRecord>,
        /// Diagnostic context of the failing step.
        failure: StepFailure,
    },
}

// ============================================================================
// SECTION: Sequencer
// ============================================================================

/// Executes a [`VerificationPlan`] one step at a time.
pub struct Sequencer<'a> {
    /// Plan being executed.
    plan: &'a VerificationPlan,
    /// Current state.
    state: SequenceState,
    /// Records of passed steps.
    records: Vec<StepRecord>,
    /// Values captured by passed steps.
    bindings: BTreeMap<String, String>,
}

impl<'a> Sequencer<'a> {
    /// Creates a sequencer in the `NotStarted` state.
    #[must_use]
    pub const fn new(plan: &'a VerificationPlan) -> Self {
        Self {
            plan,
            state: SequenceState::NotStarted,
            records: Vec::new(),
            bindings: BTreeMap::new(),
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> &SequenceState {
        &self.state
    }

    /// Returns records of the steps that passed, in order.
    #[must_use]
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Returns values captured so far.
    #[must_use]
    pub const fn bindings(&self) -> &BTreeMap<String, String> {
        &self.bindings
    }

    /// Returns the name of the running step, if any.
    #[must_use]
    pub fn running_step(&self) -> Option<&str> {
        match self.state {
            SequenceState::Running(index) => {
                self.plan.steps().get(index).map(|step| step.name.as_str())
            }
            _ => None,
        }
    }

    /// Runs every step in order against `env`.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Execution`] when a command cannot be dispatched and
    /// [`RunError::InvalidPlan`] when the sequencer already ran or a command
    /// cannot be rendered.
    pub async fn execute<R: SandboxRuntime>(
        &mut self,
        controller: &SandboxController<R>,
        env: &SandboxEnvironment<R::Handle>,
        observer: &dyn RunObserver,
    ) -> Result<SequenceOutcome, RunError> {
        if self.state != SequenceState::NotStarted {
            return Err(RunError::InvalidPlan("sequence already executed".to_string()));
        }
        let total = self.plan.len();
        for (index, step) in self.plan.steps().iter().enumerate() {
            self.state = SequenceState::Running(index);
            let command = step
                .command
                .render(&step.name, &self.bindings)
                .map_err(|err| RunError::InvalidPlan(err.to_string()))?;
            observer.record(&RunEvent::StepStarted {
                index,
                total,
                name: step.name.clone(),
                description: step.description.clone(),
                command: command.clone(),
            });

            let started = Instant::now();
            let result = match controller.exec(env, &command).await {
                Ok(result) => result,
                Err(err) => {
                    observer.record(&RunEvent::StepErrored {
                        index,
                        name: step.name.clone(),
                        error: err.to_string(),
                    });
                    return Err(RunError::Execution {
                        step: step.name.clone(),
                        message: err.to_string(),
                    });
                }
            };
            let duration_ms = millis(started.elapsed());

            match step.assess(&result) {
                Ok(capture) => {
                    if let Some((name, value)) = capture {
                        self.bindings.insert(name, value);
                    }
                    let output = step.report_label.as_ref().map(|label| StepOutput {
                        label: label.clone(),
                        text: result.stdout().trim().to_string(),
                    });
                    observer.record(&RunEvent::StepPassed {
                        index,
                        name: step.name.clone(),
                        exit_code: result.exit_code(),
                        duration_ms,
                        output: output.clone(),
                    });
                    self.records.push(StepRecord {
                        index,
                        name: step.name.clone(),
                        command,
                        exit_code: result.exit_code(),
                        duration_ms,
                        output,
                    });
                }
                Err(reason) => {
                    observer.record(&RunEvent::StepFailed {
                        index,
                        name: step.name.clone(),
                        exit_code: result.exit_code(),
                        reason: reason.clone(),
                    });
                    self.state = SequenceState::Failed {
                        step: index,
                        reason: reason.clone(),
                    };
                    let (exit_code, stdout, stderr) = result.into_parts();
                    return Ok(SequenceOutcome::Failed {
                        steps: self.records.clone(),
                        failure: StepFailure {
                            index,
                            total,
                            name: step.name.clone(),
                            description: step.description.clone(),
                            command,
                            exit_code,
                            stdout,
                            stderr,
                            reason,
                        },
                    });
                }
            }
        }
        self.state = SequenceState::Passed;
        Ok(SequenceOutcome::Passed {
            steps: self.records.clone(),
        })
    }
}

/// Converts a duration to whole milliseconds, saturating.
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
