// system-tests/src/lib.rs
// ============================================================================
// Module: Sandbox Verify System Tests Library
// Description: Shared configuration for Docker-backed system test scenarios.
// Purpose: Provide common settings for the system-test binaries.
// Dependencies: std
// ============================================================================

//! ## Overview
//! This crate hosts shared configuration used by the Sandbox Verify
//! system-test binaries in `system-tests/tests`. The suites require a
//! reachable Docker engine and run only with the `system-tests` feature.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
