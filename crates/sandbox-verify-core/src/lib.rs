// crates/sandbox-verify-core/src/lib.rs
// ============================================================================
// Module: Sandbox Verify Core Library
// Description: Public API surface for sandboxed packaging verification.
// Purpose: Expose core types, backend interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Sandbox Verify builds a package inside a fresh, disposable environment and
//! proves that the artifact installs and identifies itself. A run acquires one
//! sandbox with the source tree bound in, executes a fixed sequence of shell
//! steps, stops at the first failing step, and always releases the sandbox.
//!
//! The crate is backend-agnostic: container engines integrate through
//! [`SandboxRuntime`] and progress is reported through [`RunObserver`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::RunEvent;
pub use interfaces::RunObserver;
pub use interfaces::SandboxError;
pub use interfaces::SandboxRuntime;
pub use runtime::CommandMatcher;
pub use runtime::CompositeObserver;
pub use runtime::JsonLinesObserver;
pub use runtime::NoopObserver;
pub use runtime::ReleaseOutcome;
pub use runtime::Reply;
pub use runtime::RunError;
pub use runtime::SandboxController;
pub use runtime::SandboxEnvironment;
pub use runtime::ScriptedHandle;
pub use runtime::ScriptedRuntime;
pub use runtime::SequenceOutcome;
pub use runtime::SequenceState;
pub use runtime::Sequencer;
pub use runtime::VerificationRunner;
