// crates/sandbox-verify-cli/src/tests/progress.rs
// ============================================================================
// Module: CLI Progress Tests
// Description: Unit tests for progress line rendering.
// Purpose: Ensure lifecycle events produce readable terminal output.
// Dependencies: sandbox-verify-cli progress, sandbox-verify-core
// ============================================================================

use sandbox_verify_core::FailureReason;
use sandbox_verify_core::RunEvent;
use sandbox_verify_core::RunObserver;
use sandbox_verify_core::StepOutput;
use sandbox_verify_core::Verdict;

use crate::progress::ProgressObserver;
use crate::progress::describe;

/// Step start lines show the one-based position and the command.
#[test]
fn step_started_shows_position_and_command() {
    let line = describe(&RunEvent::StepStarted {
        index: 2,
        total: 5,
        name: "discover".to_string(),
        description: "Locate the built package".to_string(),
        command: "ls /app/build/*.deb".to_string(),
    })
    .unwrap();
    assert_eq!(line, "[3/5] Locate the built package\n    $ ls /app/build/*.deb");
}

/// A passing step with reported output shows it under the status line.
#[test]
fn step_passed_shows_reported_output() {
    let line = describe(&RunEvent::StepPassed {
        index: 4,
        name: "identity".to_string(),
        exit_code: 0,
        duration_ms: 12,
        output: Some(StepOutput {
            label: "Installed version".to_string(),
            text: "mount.efs version 2.1.0".to_string(),
        }),
    })
    .unwrap();
    assert_eq!(line, "    ok (exit 0, 12 ms)\n    Installed version: mount.efs version 2.1.0");
}

/// Step failures include the assertion reason.
#[test]
fn step_failed_includes_reason() {
    let line = describe(&RunEvent::StepFailed {
        index: 5,
        name: "identity".to_string(),
        exit_code: 0,
        reason: FailureReason::MissingToken {
            token: "amazon-efs-utils".to_string(),
        },
    })
    .unwrap();
    assert!(line.contains("stdout does not contain \"amazon-efs-utils\""));
}

/// Terminal events are left to the command's verdict output.
#[test]
fn terminal_events_are_silent() {
    assert!(
        describe(&RunEvent::RunFinished {
            verdict: Verdict::Passed,
        })
        .is_none()
    );
    assert!(
        describe(&RunEvent::RunErrored {
            error: "x".to_string(),
        })
        .is_none()
    );
}

/// The observer writes one block per non-silent event.
#[test]
fn observer_writes_lines() {
    let observer = ProgressObserver::new(Vec::new());
    observer.record(&RunEvent::SandboxReleased);
    observer.record(&RunEvent::RunFinished {
        verdict: Verdict::Failed,
    });
    let output = String::from_utf8(observer.into_inner()).unwrap();
    assert_eq!(output, "Sandbox released.\n");
}
