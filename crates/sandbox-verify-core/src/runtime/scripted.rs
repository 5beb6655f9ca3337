// crates/sandbox-verify-core/src/runtime/scripted.rs
// ============================================================================
// Module: Scripted Sandbox Runtime
// Description: In-memory sandbox runtime driven by scripted replies.
// Purpose: Exercise the controller and sequencer without a container backend.
// Dependencies: crate::{core, interfaces}, async-trait, tokio
// ============================================================================

//! ## Overview
//! [`ScriptedRuntime`] answers commands from a rule list (exact, prefix, or
//! substring match; first match wins) and falls back to a successful empty
//! result. It records every command, counts starts and teardowns, and can
//! simulate start failures, slow starts, teardown failures, command delays, and
//! a lost connection.
//! Clones share state, so a test can keep a clone for inspection after moving
//! the runtime into a controller.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::CommandResult;
use crate::core::SandboxRequest;
use crate::interfaces::SandboxError;
use crate::interfaces::SandboxRuntime;

// ============================================================================
// SECTION: Rules
// ============================================================================

/// How a rule selects commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandMatcher {
    /// Command text equals the value.
    Exact(String),
    /// Command text starts with the value.
    Prefix(String),
    /// Command text contains the value.
    Contains(String),
}

impl CommandMatcher {
    /// Returns true when `command` matches.
    fn matches(&self, command: &str) -> bool {
        match self {
            Self::Exact(value) => command == value,
            Self::Prefix(value) => command.starts_with(value.as_str()),
            Self::Contains(value) => command.contains(value.as_str()),
        }
    }
}

/// Scripted reply to a matched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Return this result immediately.
    Result(CommandResult),
    /// Wait, then return the result.
    Delayed(Duration, CommandResult),
    /// Fail as if the environment were unreachable.
    Unreachable(String),
}

/// Rule pairing a matcher with a reply.
#[derive(Debug, Clone)]
struct Rule {
    /// Command selector.
    matcher: CommandMatcher,
    /// Reply for matching commands.
    reply: Reply,
}

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared state behind every clone of a scripted runtime.
#[derive(Debug, Default)]
struct ScriptState {
    /// Ordered reply rules.
    rules: Mutex<Vec<Rule>>,
    /// Start failure message, if startup should fail.
    start_failure: Mutex<Option<String>>,
    /// Delay before `start` completes.
    start_delay: Mutex<Option<Duration>>,
    /// Teardown failure message, if teardown should fail.
    teardown_failure: Mutex<Option<String>>,
    /// Commands executed, in order (shell payload only).
    executed: Mutex<Vec<String>>,
    /// Full argv of each executed command.
    argvs: Mutex<Vec<Vec<String>>>,
    /// Requests received by `start`.
    requests: Mutex<Vec<SandboxRequest>>,
    /// Number of successful starts.
    starts: AtomicUsize,
    /// Number of teardowns.
    teardowns: AtomicUsize,
    /// Set when the runtime simulates a lost connection.
    disconnected: AtomicBool,
    /// Next handle identifier.
    next_id: AtomicU64,
}

/// Locks a mutex, recovering the data if a holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// SECTION: Runtime
// ============================================================================

/// Handle to a scripted environment.
#[derive(Debug)]
pub struct ScriptedHandle {
    /// Environment identifier.
    id: u64,
}

impl ScriptedHandle {
    /// Returns the environment identifier.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }
}

/// Sandbox runtime answering commands from scripted rules.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRuntime {
    /// State shared between clones.
    state: Arc<ScriptState>,
}

impl ScriptedRuntime {
    /// Creates a runtime where every command succeeds with empty output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a reply rule. Earlier rules take precedence.
    pub fn respond(&self, matcher: CommandMatcher, reply: Reply) {
        lock(&self.state.rules).push(Rule {
            matcher,
            reply,
        });
    }

    /// Makes every subsequent `start` fail with `message`.
    pub fn fail_start(&self, message: impl Into<String>) {
        *lock(&self.state.start_failure) = Some(message.into());
    }

    /// Makes every subsequent `start` wait `delay` before completing.
    pub fn delay_start(&self, delay: Duration) {
        *lock(&self.state.start_delay) = Some(delay);
    }

    /// Makes every subsequent teardown fail with `message`.
    pub fn fail_teardown(&self, message: impl Into<String>) {
        *lock(&self.state.teardown_failure) = Some(message.into());
    }

    /// Simulates losing contact with the runtime.
    pub fn disconnect(&self) {
        self.state.disconnected.store(true, Ordering::SeqCst);
    }

    /// Returns executed commands in order.
    #[must_use]
    pub fn executed(&self) -> Vec<String> {
        lock(&self.state.executed).clone()
    }

    /// Returns the full argv of each executed command.
    #[must_use]
    pub fn argvs(&self) -> Vec<Vec<String>> {
        lock(&self.state.argvs).clone()
    }

    /// Returns the requests passed to `start`.
    #[must_use]
    pub fn requests(&self) -> Vec<SandboxRequest> {
        lock(&self.state.requests).clone()
    }

    /// Returns the number of successful starts.
    #[must_use]
    pub fn starts(&self) -> usize {
        self.state.starts.load(Ordering::SeqCst)
    }

    /// Returns the number of teardowns.
    #[must_use]
    pub fn teardowns(&self) -> usize {
        self.state.teardowns.load(Ordering::SeqCst)
    }

    /// Finds the reply for a command.
    fn reply_for(&self, command: &str) -> Reply {
        lock(&self.state.rules)
            .iter()
            .find(|rule| rule.matcher.matches(command))
            .map_or_else(|| Reply::Result(CommandResult::success(String::new())), |rule| {
                rule.reply.clone()
            })
    }
}

#[async_trait]
impl SandboxRuntime for ScriptedRuntime {
    type Handle = ScriptedHandle;

    async fn start(&self, request: &SandboxRequest) -> Result<Self::Handle, SandboxError> {
        lock(&self.state.requests).push(request.clone());
        let delay = *lock(&self.state.start_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = lock(&self.state.start_failure).clone() {
            return Err(SandboxError::EnvironmentStart(message));
        }
        self.state.starts.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedHandle {
            id: self.state.next_id.fetch_add(1, Ordering::SeqCst) + 1,
        })
    }

    async fn run(
        &self,
        _handle: &Self::Handle,
        argv: &[String],
    ) -> Result<CommandResult, SandboxError> {
        if self.state.disconnected.load(Ordering::SeqCst) {
            return Err(SandboxError::Execution("scripted runtime disconnected".to_string()));
        }
        let command = argv.last().cloned().unwrap_or_default();
        lock(&self.state.executed).push(command.clone());
        lock(&self.state.argvs).push(argv.to_vec());
        match self.reply_for(&command) {
            Reply::Result(result) => Ok(result),
            Reply::Delayed(delay, result) => {
                tokio::time::sleep(delay).await;
                Ok(result)
            }
            Reply::Unreachable(message) => Err(SandboxError::Execution(message)),
        }
    }

    async fn teardown(&self, _handle: Self::Handle) -> Result<(), SandboxError> {
        self.state.teardowns.fetch_add(1, Ordering::SeqCst);
        lock(&self.state.teardown_failure)
            .clone()
            .map_or(Ok(()), |message| Err(SandboxError::Teardown(message)))
    }
}
