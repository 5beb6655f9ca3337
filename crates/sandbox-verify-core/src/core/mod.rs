// crates/sandbox-verify-core/src/core/mod.rs
// ============================================================================
// Module: Sandbox Verify Core Types
// Description: Data model shared by the controller, sequencer, and runners.
// Purpose: Group command results, requests, plans, and reports.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Plain data types with no I/O. Everything here is deterministic and cheap to
//! construct in tests.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod command;
pub mod plan;
pub mod report;
pub mod request;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use command::CommandResult;
pub use command::shell_quote;
pub use plan::ARTIFACT_CAPTURE;
pub use plan::INSTALLED_VERSION_LABEL;
pub use plan::Capture;
pub use plan::CommandTemplate;
pub use plan::Expectation;
pub use plan::PlanError;
pub use plan::Step;
pub use plan::VerificationPlan;
pub use report::FailureReason;
pub use report::RunReport;
pub use report::StepFailure;
pub use report::StepOutput;
pub use report::StepRecord;
pub use report::TeardownStatus;
pub use report::Verdict;
pub use request::Binding;
pub use request::PackagingProfile;
pub use request::RunLimits;
pub use request::SandboxRequest;
