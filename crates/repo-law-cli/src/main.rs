// crates/repo-law-cli/src/main.rs
// ============================================================================
// Module: Repo Law CLI Entry Point
// Description: Command dispatcher for policy runs and emergency approvals.
// Purpose: Run the engine against one or many repositories and report.
// Dependencies: clap, repo-law-config, repo-law-core, repo-law-github, tokio
// ============================================================================

//! ## Overview
//! `repo-law` loads the operator configuration, builds the engine against the
//! GitHub API, and runs the full lifecycle for one repository (`single`) or
//! every matching repository (`run`). Compliance failures are part of the
//! report; the process only fails when a run aborts or setup fails.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use repo_law_cli::report::ReportFormat;
use repo_law_cli::report::render;
use repo_law_config::RepoLawConfig;
use repo_law_core::ApprovalRequest;
use repo_law_core::Engine;
use repo_law_core::FleetReport;
use repo_law_core::Platform;
use repo_law_core::RepoRef;
use repo_law_core::Scanner;
use repo_law_core::emergency_approve;
use repo_law_core::run_fleet;
use repo_law_github::GitHubClient;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "repo-law", version, disable_help_subcommand = true)]
struct Cli {
    /// Config file path (defaults to repo-law.toml or `REPO_LAW_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full lifecycle against one repository.
    Single(SingleCommand),
    /// Run the full lifecycle against every matching repository.
    Run(RunCommand),
    /// Emergency approval utilities.
    Emergency {
        /// Selected emergency subcommand.
        #[command(subcommand)]
        command: EmergencyCommand,
    },
    /// Print the policy-document schema for the configured rules.
    Schema,
}

/// Report and enforcement flags shared by run commands.
#[derive(Args, Debug)]
struct ReportArgs {
    /// Run the enforce phase regardless of configuration.
    #[arg(long, action = ArgAction::SetTrue)]
    enforce: bool,
    /// Write the report to a file instead of stdout.
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
    /// Report format.
    #[arg(long, value_enum, default_value_t = FormatArg::Markdown)]
    format: FormatArg,
}

/// Arguments for `single`.
#[derive(Args, Debug)]
struct SingleCommand {
    /// Repository owner.
    owner: String,
    /// Repository name.
    repo: String,
    /// Report settings.
    #[command(flatten)]
    output: ReportArgs,
}

/// Arguments for `run`.
#[derive(Args, Debug)]
struct RunCommand {
    /// `owner/name` glob patterns; every repository when omitted.
    #[arg(long = "repos", value_name = "GLOB", num_args = 1..)]
    repos: Vec<String>,
    /// Report settings.
    #[command(flatten)]
    output: ReportArgs,
}

/// Emergency subcommands.
#[derive(Subcommand, Debug)]
enum EmergencyCommand {
    /// Approve a pull request when the emergency policy allows it.
    Approve(ApproveCommand),
}

/// Arguments for `emergency approve`.
#[derive(Args, Debug)]
struct ApproveCommand {
    /// Repository owner.
    owner: String,
    /// Repository name.
    repo: String,
    /// Pull request number.
    pr: u64,
}

/// Report format selector.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum FormatArg {
    /// Markdown summary.
    Markdown,
    /// Pretty-printed JSON.
    Json,
}

impl From<FormatArg> for ReportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Markdown => Self::Markdown,
            FormatArg::Json => Self::Json,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error carrying a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Single(command) => command_single(&config, command).await,
        Commands::Run(command) => command_run(&config, command).await,
        Commands::Emergency {
            command: EmergencyCommand::Approve(command),
        } => command_emergency_approve(&config, &command).await,
        Commands::Schema => command_schema(&config),
    }
}

/// Loads and validates the operator configuration.
fn load_config(path: Option<&Path>) -> CliResult<RepoLawConfig> {
    RepoLawConfig::load(path).map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

// ============================================================================
// SECTION: Run Commands
// ============================================================================

/// Executes the `single` command.
async fn command_single(config: &RepoLawConfig, command: SingleCommand) -> CliResult<ExitCode> {
    let engine = build_engine(config, command.output.enforce)?;
    let run = Scanner::new(engine).single(&command.owner, &command.repo);
    let report = run_fleet(vec![run], 1).await;
    Ok(exit_code(emit_report(&report, &command.output)?))
}

/// Executes the `run` command.
async fn command_run(config: &RepoLawConfig, command: RunCommand) -> CliResult<ExitCode> {
    let engine = build_engine(config, command.output.enforce)?;
    let scanner = Scanner::new(engine).with_page_size(config.github.page_size);
    let runs = scanner
        .run(&command.repos)
        .await
        .map_err(|err| CliError::new(format!("repository discovery failed: {err}")))?;
    write_stderr_line(&format!("repo-law: {} repositories selected", runs.len()))
        .map_err(|err| output_error("stderr", &err))?;
    let report = run_fleet(runs, config.run.concurrency).await;
    Ok(exit_code(emit_report(&report, &command.output)?))
}

/// Builds the GitHub platform client.
fn build_platform(config: &RepoLawConfig) -> CliResult<Arc<dyn Platform>> {
    let client = GitHubClient::new(&config.github_client_config())
        .map_err(|err| CliError::new(format!("failed to build GitHub client: {err}")))?;
    Ok(Arc::new(client))
}

/// Assembles the engine from configuration.
fn build_engine(config: &RepoLawConfig, enforce: bool) -> CliResult<Engine> {
    let platform = build_platform(config)?;
    let rules = config.rule_set().map_err(|err| CliError::new(err.to_string()))?;
    let audit = config.audit_sink().map_err(|err| CliError::new(err.to_string()))?;
    Engine::new(platform, rules, audit, config.run_options(enforce))
        .map_err(|err| CliError::new(format!("failed to build engine: {err}")))
}

/// Renders the report to its destination; returns whether every run completed.
fn emit_report(report: &FleetReport, output: &ReportArgs) -> CliResult<bool> {
    let rendered = render(report, output.format.into())
        .map_err(|err| CliError::new(format!("failed to render report: {err}")))?;
    write_report(&rendered, output.report.as_deref())?;
    for failure in &report.failures {
        write_stderr_line(&format!(
            "repo-law: {}/{} failed: {}",
            failure.owner, failure.repo, failure.error
        ))
        .map_err(|err| output_error("stderr", &err))?;
    }
    Ok(report.is_complete())
}

/// Maps run completeness to the process exit code.
fn exit_code(complete: bool) -> ExitCode {
    if complete { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

/// Writes rendered output to a file or stdout.
fn write_report(rendered: &str, path: Option<&Path>) -> CliResult<()> {
    match path {
        Some(path) => fs::write(path, rendered).map_err(|err| {
            CliError::new(format!("failed to write report {}: {err}", path.display()))
        }),
        None => write_stdout_bytes(rendered.as_bytes()).map_err(|err| output_error("stdout", &err)),
    }
}

// ============================================================================
// SECTION: Emergency Commands
// ============================================================================

/// Executes the `emergency approve` command.
async fn command_emergency_approve(
    config: &RepoLawConfig,
    command: &ApproveCommand,
) -> CliResult<ExitCode> {
    let validator = config
        .approval_validator()
        .map_err(|err| CliError::new(err.to_string()))?
        .ok_or_else(|| CliError::new("emergency approval is not configured"))?;
    let platform = build_platform(config)?;
    let request = ApprovalRequest {
        repo: RepoRef::new(command.owner.as_str(), command.repo.as_str()),
        number: command.pr,
    };
    emergency_approve(platform.as_ref(), validator.as_ref(), &request)
        .await
        .map_err(|err| CliError::new(err.to_string()))?;
    write_stdout_line(&format!("approved {}#{}", request.repo, request.number))
        .map_err(|err| output_error("stdout", &err))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Schema Command
// ============================================================================

/// Executes the `schema` command.
fn command_schema(config: &RepoLawConfig) -> CliResult<ExitCode> {
    write_stdout_line(&schema_text(config)?).map_err(|err| output_error("stdout", &err))?;
    Ok(ExitCode::SUCCESS)
}

/// Renders the composite policy-document schema as pretty JSON.
fn schema_text(config: &RepoLawConfig) -> CliResult<String> {
    let rules = config.rule_set().map_err(|err| CliError::new(err.to_string()))?;
    serde_json::to_string_pretty(&rules.composite_schema())
        .map_err(|err| CliError::new(format!("failed to serialize schema: {err}")))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Builds an output failure error.
fn output_error(stream: &str, error: &std::io::Error) -> CliError {
    CliError::new(format!("failed to write {stream}: {error}"))
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
