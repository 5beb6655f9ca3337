// crates/sandbox-verify-docker/src/lib.rs
// ============================================================================
// Module: Sandbox Verify Docker Runtime
// Description: Container-backed sandbox runtime for verification runs.
// Purpose: Provision disposable Docker containers for the sandbox controller.
// Dependencies: sandbox-verify-core, testcontainers, bollard
// ============================================================================

//! ## Overview
//! This crate provides [`DockerRuntime`], a [`SandboxRuntime`] that starts one
//! container per verification run from a base image, bind-mounts the source
//! tree, keeps the container alive with a long-running process, and executes
//! step commands through the Docker exec API. Containers are removed on
//! release, when a handle is dropped without release, and when a start fails
//! or is abandoned part way.
//!
//! [`SandboxRuntime`]: sandbox_verify_core::SandboxRuntime

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use runtime::DockerHandle;
pub use runtime::DEFAULT_NAME_PREFIX;
pub use runtime::DockerRuntime;
pub use runtime::ImageReference;
