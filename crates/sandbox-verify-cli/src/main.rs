// crates/sandbox-verify-cli/src/main.rs
// ============================================================================
// Module: Sandbox Verify CLI Entry Point
// Description: Command dispatcher for sandboxed packaging verification.
// Purpose: Load configuration, run the verification plan, and report verdicts.
// Dependencies: clap, sandbox-verify-config, sandbox-verify-core, sandbox-verify-docker, serde_json, thiserror, tokio.
// ============================================================================

//! ## Overview
//! The `sandbox-verify` binary builds a package inside a disposable Docker
//! container and checks that the result installs and identifies itself.
//! All user-facing strings are routed through the i18n catalog.
//!
//! Exit codes: `0` when every step passes, `1` when a step fails its
//! assertion, `2` for configuration, usage, and infrastructure errors.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use sandbox_verify_cli::progress::ProgressObserver;
use sandbox_verify_cli::t;
use sandbox_verify_config::SandboxVerifyConfig;
use sandbox_verify_config::config_toml_example;
use sandbox_verify_core::Capture;
use sandbox_verify_core::CompositeObserver;
use sandbox_verify_core::Expectation;
use sandbox_verify_core::JsonLinesObserver;
use sandbox_verify_core::RunReport;
use sandbox_verify_core::SandboxController;
use sandbox_verify_core::SandboxRequest;
use sandbox_verify_core::TeardownStatus;
use sandbox_verify_core::VerificationPlan;
use sandbox_verify_core::VerificationRunner;
use sandbox_verify_docker::DockerRuntime;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Exit status when a verification step fails its assertion.
const EXIT_VERIFICATION_FAILED: u8 = 1;
/// Exit status for configuration, usage, and infrastructure errors.
const EXIT_INFRASTRUCTURE: u8 = 2;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "sandbox-verify", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Build and verify the package inside a fresh sandbox.
    Run(RunCommand),
    /// Print the verification steps without starting a sandbox.
    Plan(PlanCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Options shared by commands that resolve a sandbox request.
#[derive(Args, Debug, Default)]
struct SandboxArgs {
    /// Config file path (defaults to `sandbox-verify.toml` or the env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Host source directory, overriding `sandbox.source`.
    #[arg(long, value_name = "DIR")]
    source: Option<PathBuf>,
    /// Base image reference, overriding `sandbox.image`.
    #[arg(long, value_name = "IMAGE")]
    image: Option<String>,
}

/// Arguments for `run`.
#[derive(Args, Debug)]
struct RunCommand {
    /// Sandbox resolution options.
    #[command(flatten)]
    sandbox: SandboxArgs,
    /// Output format for the verdict.
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
    /// Write run events as JSON lines to this file.
    #[arg(long, value_name = "PATH")]
    events: Option<PathBuf>,
    /// Suppress progress output on stderr.
    #[arg(long, action = ArgAction::SetTrue)]
    quiet: bool,
}

/// Arguments for `plan`.
#[derive(Args, Debug)]
struct PlanCommand {
    /// Sandbox resolution options.
    #[command(flatten)]
    sandbox: SandboxArgs,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a Sandbox Verify configuration file.
    Validate(ConfigValidateCommand),
    /// Print an example configuration with every default spelled out.
    Example,
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Config file path (defaults to `sandbox-verify.toml` or the env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Verdict output formats.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Pretty-printed JSON run report.
    Json,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing failures.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Localized error message.
    message: String,
}

impl CliError {
    /// Creates a new CLI error.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// Result alias for CLI operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Parses arguments and dispatches to the selected command.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Run(command) => command_run(command).await,
        Commands::Plan(command) => command_plan(&command),
        Commands::Config {
            command,
        } => command_config(command),
    }
}

/// Prints top-level help.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes the verification plan in a Docker sandbox.
async fn command_run(command: RunCommand) -> CliResult<ExitCode> {
    let (config, request) = resolve_sandbox(&command.sandbox)?;
    let plan = build_plan(&config)?;

    let mut observer = CompositeObserver::new();
    if !command.quiet {
        observer = observer.with(Box::new(ProgressObserver::new(std::io::stderr())));
    }
    if let Some(path) = &command.events {
        let file = File::create(path).map_err(|err| {
            CliError::new(t!("run.events_open_failed", path = path.display(), error = err))
        })?;
        observer = observer.with(Box::new(JsonLinesObserver::new(file)));
    }

    let runner = VerificationRunner::new(
        SandboxController::new(DockerRuntime::new()),
        plan,
        config.run_limits(),
    );
    let report = runner
        .run(&request, &observer)
        .await
        .map_err(|err| CliError::new(t!("run.error", error = err)))?;

    emit_report(&report, command.format)?;
    Ok(ExitCode::from(verdict_exit_status(&report)))
}

/// Writes the verdict to stdout and diagnostics to stderr.
fn emit_report(report: &RunReport, format: OutputFormat) -> CliResult<()> {
    let mut lines = Vec::new();
    match format {
        OutputFormat::Text => {
            lines.push(verdict_line(report));
            lines.extend(output_lines(report));
        }
        OutputFormat::Json => lines.push(
            serde_json::to_string_pretty(report)
                .map_err(|err| CliError::new(t!("run.report_serialize_failed", error = err)))?,
        ),
    }
    for line in &lines {
        write_stdout_line(line).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    if let Some(failure) = &report.failure {
        write_stderr(&failure.to_string())
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }
    if let TeardownStatus::Failed(error) = &report.teardown {
        write_stderr_line(&t!("run.teardown_warning", error = error))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }
    Ok(())
}

/// Returns the one-line text verdict.
fn verdict_line(report: &RunReport) -> String {
    match &report.failure {
        None => t!("run.verdict.passed", count = report.steps.len()),
        Some(failure) => t!(
            "run.verdict.failed",
            index = failure.index + 1,
            total = failure.total,
            name = failure.name
        ),
    }
}

/// Returns the reported outputs of passing steps, e.g. the installed version.
fn output_lines(report: &RunReport) -> Vec<String> {
    report
        .steps
        .iter()
        .filter_map(|step| step.output.as_ref())
        .map(|output| t!("run.step_output", label = output.label, text = output.text))
        .collect()
}

/// Maps a report to the process exit status.
fn verdict_exit_status(report: &RunReport) -> u8 {
    if report.passed() { 0 } else { EXIT_VERIFICATION_FAILED }
}

// ============================================================================
// SECTION: Plan Command
// ============================================================================

/// Prints the verification plan.
fn command_plan(command: &PlanCommand) -> CliResult<ExitCode> {
    let (config, request) = resolve_sandbox(&command.sandbox)?;
    let plan = build_plan(&config)?;
    for line in render_plan(&plan, &request) {
        write_stdout_line(&line).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Renders a plan as human-readable lines.
fn render_plan(plan: &VerificationPlan, request: &SandboxRequest) -> Vec<String> {
    let mut lines = vec![t!(
        "plan.header",
        count = plan.len(),
        image = request.image,
        source = request.binding.host_path.display(),
        mount = request.binding.sandbox_path
    )];
    for (index, step) in plan.steps().iter().enumerate() {
        lines.push(t!(
            "plan.step",
            index = index + 1,
            name = step.name,
            description = step.description
        ));
        lines.push(t!("plan.command", command = step.command));
        for expectation in &step.expectations {
            lines.push(match expectation {
                Expectation::ExitCode(code) => t!("plan.expect.exit_code", code = code),
                Expectation::StdoutContains(token) => t!("plan.expect.stdout", token = token),
            });
        }
        if let Some(Capture::FirstLine {
            name,
        }) = &step.capture
        {
            lines.push(t!("plan.capture", name = name));
        }
    }
    lines
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => {
            load_config(command.config.as_deref())?;
            write_stdout_line(&t!("config.validate.ok"))
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        }
        ConfigCommand::Example => {
            write_stdout(&config_toml_example())
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Resolution Helpers
// ============================================================================

/// Loads configuration from `path` or the default locations.
fn load_config(path: Option<&Path>) -> CliResult<SandboxVerifyConfig> {
    SandboxVerifyConfig::load(path).map_err(|err| CliError::new(t!("config.load_failed", error = err)))
}

/// Loads configuration, applies command-line overrides, and builds the request.
///
/// A `--source` override resolves against the working directory; a
/// configured source resolves against the config file's directory.
fn resolve_sandbox(args: &SandboxArgs) -> CliResult<(SandboxVerifyConfig, SandboxRequest)> {
    let config = load_config(args.config.as_deref())?;
    apply_overrides(config, args)
}

/// Applies `--image` and `--source` to a loaded config and revalidates it.
fn apply_overrides(
    mut config: SandboxVerifyConfig,
    args: &SandboxArgs,
) -> CliResult<(SandboxVerifyConfig, SandboxRequest)> {
    if let Some(image) = &args.image {
        config.sandbox.image.clone_from(image);
    }
    let base_dir = match &args.source {
        Some(source) => {
            config.sandbox.source.clone_from(source);
            PathBuf::from(".")
        }
        None => config.base_dir(),
    };
    config.validate().map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    let request = config.sandbox_request(&base_dir);
    Ok((config, request))
}

/// Builds the canonical plan from configuration.
fn build_plan(config: &SandboxVerifyConfig) -> CliResult<VerificationPlan> {
    VerificationPlan::canonical(&config.profile(), &config.sandbox.mount_path)
        .map_err(|err| CliError::new(t!("plan.build_failed", error = err)))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes text to stdout without adding a newline.
fn write_stdout(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(message.as_bytes())
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Writes text to stderr without adding a newline.
fn write_stderr(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    stderr.write_all(message.as_bytes())
}

/// Formats a localized output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns the infrastructure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::from(EXIT_INFRASTRUCTURE)
}
