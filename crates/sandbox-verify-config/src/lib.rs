// crates/sandbox-verify-config/src/lib.rs
// ============================================================================
// Module: Sandbox Verify Config Library
// Description: Configuration model, validation, and example generation.
// Purpose: Single source of truth for sandbox-verify.toml semantics.
// Dependencies: sandbox-verify-core, serde, toml
// ============================================================================

//! ## Overview
//! `sandbox-verify-config` defines the configuration model for verification
//! runs. Every value the canonical plan and the sandbox request need can be
//! overridden from `sandbox-verify.toml`; validation is strict and fails
//! closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
