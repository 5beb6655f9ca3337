// crates/sandbox-verify-core/src/core/plan.rs
// ============================================================================
// Module: Verification Plan
// Description: Ordered steps, command templates, expectations, and captures.
// Purpose: Encode the all-or-nothing verification sequence as plain data.
// Dependencies: crate::core::{command, report, request}, serde, thiserror
// ============================================================================

//! ## Overview
//! A [`VerificationPlan`] is an ordered list of [`Step`] values. Each step is a
//! `(description, command, assertion)` triple: the command is a
//! [`CommandTemplate`] whose `{name}` placeholders are filled from values an
//! earlier step captured, and the assertion is a list of [`Expectation`]s
//! evaluated in order.
//! Invariants:
//! - Plans are validated on construction: non-empty, unique step names, and
//!   every placeholder bound by an earlier capture.
//! - Captured values are shell-quoted only when they need it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::core::command::CommandResult;
use crate::core::command::shell_quote;
use crate::core::report::FailureReason;
use crate::core::request::PackagingProfile;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Capture name binding the discovered artifact path.
pub const ARTIFACT_CAPTURE: &str = "artifact";
/// Label of the identity step's reported output.
pub const INSTALLED_VERSION_LABEL: &str = "Installed version";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Plan construction and rendering errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The plan has no steps.
    #[error("verification plan has no steps")]
    Empty,
    /// Two steps share a name.
    #[error("duplicate step name: {0}")]
    DuplicateStep(String),
    /// A step has an empty name or command.
    #[error("invalid step: {0}")]
    InvalidStep(String),
    /// A placeholder is not bound by an earlier capture.
    #[error("step {step} references unbound placeholder {{{name}}}")]
    UnboundPlaceholder {
        /// Step name.
        step: String,
        /// Placeholder name.
        name: String,
    },
}

// ============================================================================
// SECTION: Command Template
// ============================================================================

/// Parsed piece of a command template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Literal shell text.
    Literal(String),
    /// Placeholder filled from a captured value.
    Placeholder(String),
}

/// Shell command text with `{name}` placeholders.
///
/// `{{` and `}}` produce literal braces. `${...}` is left to the shell, and
/// braces that do not enclose an identifier stay literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    /// Source text as written.
    source: String,
    /// Parsed segments.
    segments: Vec<Segment>,
}

impl CommandTemplate {
    /// Parses a command template.
    #[must_use]
    pub fn parse(source: impl Into<String>) -> Self {
        let source = source.into();
        let segments = parse_segments(&source);
        Self {
            source,
            segments,
        }
    }

    /// Returns the template text as written.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the placeholder names in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Renders the template against captured values.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::UnboundPlaceholder`] when a placeholder has no value.
    pub fn render(
        &self,
        step: &str,
        bindings: &BTreeMap<String, String>,
    ) -> Result<String, PlanError> {
        let mut rendered = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Placeholder(name) => {
                    let value =
                        bindings.get(name).ok_or_else(|| PlanError::UnboundPlaceholder {
                            step: step.to_string(),
                            name: name.clone(),
                        })?;
                    rendered.push_str(&shell_quote(value));
                }
            }
        }
        Ok(rendered)
    }
}

/// Shows literal text unescaped and placeholders as `{name}`.
impl fmt::Display for CommandTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => f.write_str(text)?,
                Segment::Placeholder(name) => write!(f, "{{{name}}}")?,
            }
        }
        Ok(())
    }
}

/// Returns true when `name` is a valid placeholder identifier.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(ch) if ch.is_ascii_alphabetic() || ch == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

/// Escapes braces so `text` parses as a single literal segment.
fn escape_template(text: &str) -> String {
    text.replace('{', "{{").replace('}', "}}")
}

/// Splits template text into literal and placeholder segments.
fn parse_segments(source: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = source;
    while let Some(ch) = rest.chars().next() {
        if rest.starts_with("{{") {
            literal.push('{');
            rest = &rest[2 ..];
            continue;
        }
        if rest.starts_with("}}") {
            literal.push('}');
            rest = &rest[2 ..];
            continue;
        }
        if ch == '{' && !literal.ends_with('$') {
            if let Some(end) = rest.find('}') {
                let name = &rest[1 .. end];
                if is_identifier(name) {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name.to_string()));
                    rest = &rest[end + 1 ..];
                    continue;
                }
            }
        }
        literal.push(ch);
        rest = &rest[ch.len_utf8() ..];
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

// ============================================================================
// SECTION: Expectations and Captures
// ============================================================================

/// A single predicate applied to a [`CommandResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Expectation {
    /// Exit status must equal the value.
    ExitCode(i64),
    /// Standard output must contain the token.
    StdoutContains(String),
}

impl Expectation {
    /// Returns the failure reason when the result does not meet the expectation.
    #[must_use]
    pub fn check(&self, result: &CommandResult) -> Option<FailureReason> {
        match self {
            Self::ExitCode(expected) => (result.exit_code() != *expected).then(|| {
                FailureReason::ExitCode {
                    expected: *expected,
                    actual: result.exit_code(),
                }
            }),
            Self::StdoutContains(token) => {
                (!result.stdout().contains(token.as_str())).then(|| FailureReason::MissingToken {
                    token: token.clone(),
                })
            }
        }
    }
}

/// Value extracted from a passing step for use by later steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Capture {
    /// First non-empty stdout line, trimmed.
    FirstLine {
        /// Binding name.
        name: String,
    },
}

impl Capture {
    /// Returns the binding name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::FirstLine {
                name,
            } => name,
        }
    }

    /// Extracts the captured value, if any.
    #[must_use]
    pub fn extract(&self, result: &CommandResult) -> Option<String> {
        match self {
            Self::FirstLine {
                ..
            } => result
                .stdout()
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .map(ToString::to_string),
        }
    }
}

// ============================================================================
// SECTION: Step
// ============================================================================

/// One named verification step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Stable short name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Command to run.
    pub command: CommandTemplate,
    /// Expectations applied in order.
    pub expectations: Vec<Expectation>,
    /// Optional capture for later steps.
    pub capture: Option<Capture>,
    /// Label under which a passing step's stdout is reported.
    pub report_label: Option<String>,
}

impl Step {
    /// Creates a step expecting exit status zero.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            command: CommandTemplate::parse(command),
            expectations: vec![Expectation::ExitCode(0)],
            capture: None,
            report_label: None,
        }
    }

    /// Adds a stdout token expectation.
    #[must_use]
    pub fn expect_stdout(mut self, token: impl Into<String>) -> Self {
        self.expectations.push(Expectation::StdoutContains(token.into()));
        self
    }

    /// Captures the first stdout line under `name`.
    #[must_use]
    pub fn capture_first_line(mut self, name: impl Into<String>) -> Self {
        self.capture = Some(Capture::FirstLine {
            name: name.into(),
        });
        self
    }

    /// Reports the trimmed stdout of this step under `label` when it passes.
    #[must_use]
    pub fn report_output(mut self, label: impl Into<String>) -> Self {
        self.report_label = Some(label.into());
        self
    }

    /// Applies the expectations, then the capture, to a result.
    ///
    /// # Errors
    ///
    /// Returns the first [`FailureReason`] encountered.
    pub fn assess(&self, result: &CommandResult) -> Result<Option<(String, String)>, FailureReason> {
        if let Some(reason) = self.expectations.iter().find_map(|exp| exp.check(result)) {
            return Err(reason);
        }
        match &self.capture {
            None => Ok(None),
            Some(capture) => capture
                .extract(result)
                .map(|value| Some((capture.name().to_string(), value)))
                .ok_or_else(|| FailureReason::CaptureMissing {
                    name: capture.name().to_string(),
                }),
        }
    }
}

// ============================================================================
// SECTION: Verification Plan
// ============================================================================

/// Validated, ordered list of verification steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationPlan {
    /// Steps in execution order.
    steps: Vec<Step>,
}

impl VerificationPlan {
    /// Validates and wraps a step list.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] when the plan is empty, names collide, or a
    /// placeholder is not bound by an earlier capture.
    pub fn new(steps: Vec<Step>) -> Result<Self, PlanError> {
        let plan = Self {
            steps,
        };
        plan.validate()?;
        Ok(plan)
    }

    /// Builds the canonical five-step plan for a packaging profile.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] when profile values produce an invalid plan.
    pub fn canonical(profile: &PackagingProfile, mount_path: &str) -> Result<Self, PlanError> {
        let mount = mount_path.trim_end_matches('/');
        let mount = if mount.is_empty() { "/" } else { mount };
        let dependencies = if profile.packages.is_empty() {
            escape_template(&profile.refresh_command)
        } else {
            escape_template(&format!(
                "{} && {} {}",
                profile.refresh_command,
                profile.install_command,
                profile.packages.join(" ")
            ))
        };
        let output_dir = format!("{}/{}", mount.trim_end_matches('/'), profile.output_dir);
        Self::new(vec![
            Step::new("dependencies", "Install build dependencies", dependencies),
            Step::new(
                "build",
                "Run the packaging build script",
                escape_template(&format!("cd {} && {}", shell_quote(mount), profile.build_script)),
            ),
            Step::new(
                "discover",
                "Discover the produced package artifact",
                escape_template(&format!(
                    "ls {}/{}",
                    shell_quote(&output_dir),
                    profile.artifact_pattern
                )),
            )
            .expect_stdout(profile.product_token.clone())
            .capture_first_line(ARTIFACT_CAPTURE),
            Step::new(
                "install",
                "Install the discovered artifact",
                format!(
                    "{} {{{ARTIFACT_CAPTURE}}}",
                    escape_template(&profile.artifact_install_command)
                ),
            ),
            Step::new(
                "identity",
                "Check the installed artifact identity",
                escape_template(&profile.identity_command),
            )
            .expect_stdout(profile.identity_token.clone())
            .report_output(INSTALLED_VERSION_LABEL),
        ])
    }

    /// Checks structural invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] on the first violated invariant.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.steps.is_empty() {
            return Err(PlanError::Empty);
        }
        let mut names = BTreeSet::new();
        let mut bound = BTreeSet::new();
        for step in &self.steps {
            if step.name.trim().is_empty() {
                return Err(PlanError::InvalidStep("step name must be non-empty".to_string()));
            }
            if step.command.source().trim().is_empty() {
                return Err(PlanError::InvalidStep(format!("step {} has no command", step.name)));
            }
            if !names.insert(step.name.as_str()) {
                return Err(PlanError::DuplicateStep(step.name.clone()));
            }
            if let Some(name) = step.command.placeholders().find(|name| !bound.contains(*name)) {
                return Err(PlanError::UnboundPlaceholder {
                    step: step.name.clone(),
                    name: name.to_string(),
                });
            }
            if let Some(capture) = &step.capture {
                bound.insert(capture.name());
            }
        }
        Ok(())
    }

    /// Returns the steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Returns the number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true when the plan has no steps (never true for a validated plan).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
