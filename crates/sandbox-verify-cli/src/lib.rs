// crates/sandbox-verify-cli/src/lib.rs
// ============================================================================
// Module: Sandbox Verify CLI Library
// Description: Shared helpers for the Sandbox Verify CLI binary.
// Purpose: Expose i18n and progress utilities for CLI modules and tests.
// Dependencies: sandbox-verify-core, std
// ============================================================================

//! ## Overview
//! Library surface for the `sandbox-verify` binary: the message catalog with
//! its [`t!`] macro and the terminal progress observer.

/// Internationalization helpers and message catalog.
pub mod i18n;
/// Terminal progress rendering for run events.
pub mod progress;
