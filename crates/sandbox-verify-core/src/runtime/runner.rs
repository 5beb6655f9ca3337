// crates/sandbox-verify-core/src/runtime/runner.rs
// ============================================================================
// Module: Verification Runner
// Description: Run boundary owning sandbox acquisition, sequencing, and release.
// Purpose: Guarantee teardown on every exit path and produce a single verdict.
// Dependencies: crate::{core, interfaces, runtime}, thiserror, tokio
// ============================================================================

//! ## Overview
//! [`VerificationRunner::run`] is the scoped-acquisition boundary of a
//! verification run: it acquires one environment, executes the plan under an
//! optional whole-run timeout that also bounds acquisition, and releases the
//! environment whether the sequence passed, failed an assertion, hit an
//! infrastructure error, or timed out. Infrastructure errors propagate as
//! [`RunError`]; assertion failures are a normal [`RunReport`] with a
//! `failed` verdict.
//!
//! If the run future itself is dropped or unwinds, the environment handle is
//! dropped with it and backend handles are expected to remove their
//! environment on drop.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use tokio::time::Instant;

use crate::core::RunLimits;
use crate::core::RunReport;
use crate::core::SandboxRequest;
use crate::core::TeardownStatus;
use crate::core::Verdict;
use crate::core::VerificationPlan;
use crate::interfaces::RunEvent;
use crate::interfaces::RunObserver;
use crate::interfaces::SandboxRuntime;
use crate::runtime::controller::SandboxController;
use crate::runtime::sequencer::SequenceOutcome;
use crate::runtime::sequencer::Sequencer;
use crate::runtime::sequencer::millis;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Infrastructure errors that abort a run.
///
/// # Invariants
/// - Assertion failures are never reported through this type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// The sandbox could not be created or reach a running state.
    #[error("environment start failed: {0}")]
    EnvironmentStart(String),
    /// A step command could not be dispatched.
    #[error("step {step} could not be executed: {message}")]
    Execution {
        /// Step name.
        step: String,
        /// Error message.
        message: String,
    },
    /// The whole-run timeout elapsed.
    #[error("run timed out after {after_ms} ms{}", step_suffix(.step))]
    TimedOut {
        /// Step running when the timeout fired.
        step: Option<String>,
        /// Configured timeout in milliseconds.
        after_ms: u64,
    },
    /// The plan could not be executed as written.
    #[error("invalid verification plan: {0}")]
    InvalidPlan(String),
}

/// Formats the optional step suffix of a timeout message.
fn step_suffix(step: &Option<String>) -> String {
    step.as_ref().map(|name| format!(" during step {name}")).unwrap_or_default()
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Executes a plan inside one freshly acquired sandbox.
pub struct VerificationRunner<R: SandboxRuntime> {
    /// Sandbox lifecycle controller.
    controller: SandboxController<R>,
    /// Validated step plan.
    plan: VerificationPlan,
    /// Caller-imposed limits.
    limits: RunLimits,
}

impl<R: SandboxRuntime> VerificationRunner<R> {
    /// Creates a runner.
    pub const fn new(
        controller: SandboxController<R>,
        plan: VerificationPlan,
        limits: RunLimits,
    ) -> Self {
        Self {
            controller,
            plan,
            limits,
        }
    }

    /// Returns the controller.
    pub const fn controller(&self) -> &SandboxController<R> {
        &self.controller
    }

    /// Returns the plan.
    pub const fn plan(&self) -> &VerificationPlan {
        &self.plan
    }

    /// Runs the plan in a new environment built from `request`.
    ///
    /// The environment is released exactly once before this returns, on every
    /// path after a successful acquisition.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] on infrastructure failure or timeout.
    pub async fn run(
        &self,
        request: &SandboxRequest,
        observer: &dyn RunObserver,
    ) -> Result<RunReport, RunError> {
        observer.record(&RunEvent::RunStarted {
            image: request.image.clone(),
            steps: self.plan.len(),
        });
        let deadline = self.limits.run_timeout.map(|limit| Instant::now() + limit);
        let acquired = match deadline {
            None => Ok(self.controller.acquire(request).await),
            Some(deadline) => {
                tokio::time::timeout_at(deadline, self.controller.acquire(request)).await
            }
        };
        let mut env = match acquired {
            Ok(Ok(env)) => env,
            Ok(Err(err)) => {
                return Err(run_errored(observer, RunError::EnvironmentStart(err.to_string())));
            }
            Err(_) => return Err(run_errored(observer, self.timed_out(None))),
        };
        observer.record(&RunEvent::SandboxAcquired {
            image: env.image().to_string(),
            host_path: env.binding().host_path.display().to_string(),
            sandbox_path: env.binding().sandbox_path.clone(),
        });

        let mut sequencer = Sequencer::new(&self.plan);
        let outcome = match deadline {
            None => sequencer.execute(&self.controller, &env, observer).await,
            Some(deadline) => {
                let timed = tokio::time::timeout_at(
                    deadline,
                    sequencer.execute(&self.controller, &env, observer),
                )
                .await;
                match timed {
                    Ok(outcome) => outcome,
                    Err(_) => Err(self.timed_out(sequencer.running_step())),
                }
            }
        };

        let teardown = match self.controller.release(&mut env).await {
            Ok(_) => {
                observer.record(&RunEvent::SandboxReleased);
                TeardownStatus::Released
            }
            Err(err) => {
                observer.record(&RunEvent::TeardownFailed {
                    error: err.to_string(),
                });
                TeardownStatus::Failed(err.to_string())
            }
        };

        let report = match outcome {
            Ok(SequenceOutcome::Passed {
                steps,
            }) => RunReport {
                verdict: Verdict::Passed,
                steps,
                failure: None,
                teardown,
            },
            Ok(SequenceOutcome::Failed {
                steps,
                failure,
            }) => RunReport {
                verdict: Verdict::Failed,
                steps,
                failure: Some(failure),
                teardown,
            },
            Err(error) => return Err(run_errored(observer, error)),
        };
        observer.record(&RunEvent::RunFinished {
            verdict: report.verdict,
        });
        Ok(report)
    }

    /// Builds the timeout error for the configured run limit.
    fn timed_out(&self, step: Option<&str>) -> RunError {
        RunError::TimedOut {
            step: step.map(ToString::to_string),
            after_ms: self.limits.run_timeout.map_or(0, millis),
        }
    }
}

/// Records a run error and hands it back.
fn run_errored(observer: &dyn RunObserver, error: RunError) -> RunError {
    observer.record(&RunEvent::RunErrored {
        error: error.to_string(),
    });
    error
}
