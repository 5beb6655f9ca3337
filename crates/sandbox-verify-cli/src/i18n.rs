// crates/sandbox-verify-cli/src/i18n.rs
// ============================================================================
// Module: CLI Internationalization Helpers
// Description: Provides message catalog and translation utilities for the CLI.
// Purpose: Centralize user-facing strings for future localization support.
// Dependencies: Standard library collections and formatting utilities.
// ============================================================================

//! ## Overview
//! The Sandbox Verify CLI stores user-facing strings in a small translation
//! catalog to keep messaging consistent. All runtime output should be routed
//! through the [`t!`](crate::t) macro.
//!
//! ## Invariants
//! - The catalog is initialized once and read-only thereafter.
//! - Missing keys fall back to the key itself to avoid panics.
//! - Placeholder substitutions preserve deterministic order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A formatted message argument captured by the [`macro@crate::t`] macro.
#[derive(Clone)]
pub struct MessageArg {
    /// The placeholder name used in message templates (e.g., `"path"`).
    pub key: &'static str,
    /// The formatted string value to substitute for this placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`] from a key and displayable value.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Static catalog entries loaded into the message bundle.
pub(crate) const CATALOG_ITEMS: &[(&str, &str)] = &[
    ("main.version", "sandbox-verify {version}"),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("config.load_failed", "Failed to load config: {error}"),
    ("config.validate.ok", "Config valid."),
    ("plan.build_failed", "Failed to build verification plan: {error}"),
    ("plan.header", "Verification plan ({count} steps, image {image}, source {source} -> {mount}):"),
    ("plan.step", "{index}. {name}: {description}"),
    ("plan.command", "   command: {command}"),
    ("plan.expect.exit_code", "   expect: exit status {code}"),
    ("plan.expect.stdout", "   expect: stdout contains \"{token}\""),
    ("plan.capture", "   capture: first stdout line as {{name}}"),
    ("run.events_open_failed", "Failed to open event log {path}: {error}"),
    ("run.report_serialize_failed", "Failed to serialize run report: {error}"),
    ("run.error", "Verification aborted: {error}"),
    ("run.verdict.passed", "PASSED: all {count} steps succeeded."),
    ("run.verdict.failed", "FAILED at step {index}/{total} ({name})."),
    ("run.step_output", "{label}: {text}"),
    ("run.teardown_warning", "Warning: sandbox teardown failed: {error}"),
    ("progress.run_started", "Starting sandbox from {image} ({steps} steps)..."),
    ("progress.sandbox_acquired", "Sandbox ready: {host} mounted at {mount}."),
    ("progress.step_started", "[{index}/{total}] {description}"),
    ("progress.step_command", "    $ {command}"),
    ("progress.step_passed", "    ok (exit {code}, {duration} ms)"),
    ("progress.step_output", "    {label}: {text}"),
    ("progress.step_failed", "    failed: {reason}"),
    ("progress.step_errored", "    error: {error}"),
    ("progress.sandbox_released", "Sandbox released."),
    ("progress.teardown_failed", "Sandbox teardown failed: {error}"),
];

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Translates `key` using the English catalog while substituting `args`.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog().get(key).copied().unwrap_or(key);
    if args.is_empty() {
        return template.to_string();
    }

    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

/// Returns the static English catalog used by the CLI.
fn catalog() -> &'static HashMap<&'static str, &'static str> {
    static CATALOG: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();

    CATALOG.get_or_init(|| CATALOG_ITEMS.iter().copied().collect())
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a localized message from a key and named arguments.
///
/// # Arguments
///
/// - `$key` must match a catalog entry.
/// - Named arguments are substituted into `{placeholder}` positions.
///
/// # Returns
///
/// A localized [`String`] with placeholders substituted.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}
