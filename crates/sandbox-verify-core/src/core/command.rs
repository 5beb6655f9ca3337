// crates/sandbox-verify-core/src/core/command.rs
// ============================================================================
// Module: Command Results
// Description: Structured outcome of one command executed inside a sandbox.
// Purpose: Carry exit status and captured output across the runtime boundary.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`CommandResult`] is produced once per sandboxed command and is consumed
//! by the step that issued it. A non-zero exit status is a normal outcome, not
//! an error.
//! Invariants:
//! - Results are immutable once constructed.
//! - Output is decoded lossily so arbitrary tool output never fails a run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

// ============================================================================
// SECTION: Command Result
// ============================================================================

/// Outcome of a single command executed inside a sandbox environment.
///
/// # Invariants
/// - Fields are private; the value cannot change after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    /// Process exit status reported by the runtime.
    exit_code: i64,
    /// Captured standard output.
    stdout: String,
    /// Captured standard error.
    stderr: String,
}

impl CommandResult {
    /// Creates a result from already-decoded output.
    #[must_use]
    pub fn new(exit_code: i64, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Creates a result from raw output bytes, decoding them lossily as UTF-8.
    #[must_use]
    pub fn from_bytes(exit_code: i64, stdout: &[u8], stderr: &[u8]) -> Self {
        Self::new(
            exit_code,
            String::from_utf8_lossy(stdout).into_owned(),
            String::from_utf8_lossy(stderr).into_owned(),
        )
    }

    /// Successful result with the provided stdout and empty stderr.
    #[must_use]
    pub fn success(stdout: impl Into<String>) -> Self {
        Self::new(0, stdout, String::new())
    }

    /// Returns the exit status.
    #[must_use]
    pub const fn exit_code(&self) -> i64 {
        self.exit_code
    }

    /// Returns the captured standard output.
    #[must_use]
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    /// Returns the captured standard error.
    #[must_use]
    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// Returns true when the exit status is zero.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    /// Splits the result into `(exit_code, stdout, stderr)`.
    #[must_use]
    pub fn into_parts(self) -> (i64, String, String) {
        (self.exit_code, self.stdout, self.stderr)
    }
}

// ============================================================================
// SECTION: Shell Quoting
// ============================================================================

/// Returns true when `byte` can appear unquoted in a POSIX shell word.
const fn is_shell_safe(byte: u8) -> bool {
    matches!(
        byte,
        b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'_'
            | b'.'
            | b'/'
            | b'+'
            | b':'
            | b'='
            | b'@'
            | b'%'
            | b','
            | b'-'
    )
}

/// Quotes `value` for a POSIX shell only when it needs quoting.
///
/// Plain words such as package filenames are returned unchanged; anything else
/// is wrapped in single quotes with embedded quotes escaped.
#[must_use]
pub fn shell_quote(value: &str) -> String {
    if !value.is_empty() && value.bytes().all(is_shell_safe) {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(ch);
        }
    }
    quoted.push('\'');
    quoted
}

// ============================================================================
// SECTION: Tests
// ============================================================================
