// crates/sandbox-verify-core/src/runtime/mod.rs
// ============================================================================
// Module: Sandbox Verify Runtime
// Description: Sandbox controller, step sequencer, run boundary, and observers.
// Purpose: Execute verification plans against a sandbox runtime backend.
// Dependencies: crate::{core, interfaces}, tokio
// ============================================================================

//! ## Overview
//! Runtime modules drive one verification run end to end. Backends plug in
//! through [`crate::interfaces::SandboxRuntime`]; the scripted runtime is the
//! in-memory backend used by tests and dry runs.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod controller;
pub mod observers;
pub mod runner;
pub mod scripted;
pub mod sequencer;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use controller::ReleaseOutcome;
pub use controller::SandboxController;
pub use controller::SandboxEnvironment;
pub use observers::CompositeObserver;
pub use observers::JsonLinesObserver;
pub use observers::NoopObserver;
pub use runner::RunError;
pub use runner::VerificationRunner;
pub use scripted::CommandMatcher;
pub use scripted::Reply;
pub use scripted::ScriptedHandle;
pub use scripted::ScriptedRuntime;
pub use sequencer::SequenceOutcome;
pub use sequencer::SequenceState;
pub use sequencer::Sequencer;
