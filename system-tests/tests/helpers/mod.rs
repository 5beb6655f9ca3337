// system-tests/tests/helpers/mod.rs
// ============================================================================
// Module: System Test Helpers
// Description: Shared helpers for Sandbox Verify system-tests.
// Purpose: Provide Docker checks, package fixtures, and CLI invocation.
// Dependencies: system-tests, sandbox-verify-core
// ============================================================================

//! ## Overview
//! Shared helpers for Sandbox Verify system-tests.
//! Invariants:
//! - Suites fail closed when Docker is unreachable.
//! - Fixture packages are built inside the sandbox, never on the host.

#![allow(dead_code, reason = "Shared helpers are reused across multiple test suites.")]

pub mod cli;
pub mod fixtures;
pub mod infra;
pub mod timeouts;
