// crates/invoker-tck-cli/src/main.rs
// ============================================================================
// Module: Invoker TCK CLI Entry Point
// Description: Command dispatcher for running and listing conformance suites.
// Purpose: Run the built-in suites against candidate images under Docker.
// Dependencies: clap, invoker-tck-config, invoker-tck-core, invoker-tck-docker, invoker-tck-suites, serde, thiserror, tokio.
// ============================================================================

//! ## Overview
//! `invoker-tck run` loads the TCK configuration, layers command-line
//! overrides on top, runs the selected suites through the Docker engine, and
//! exits with the aggregated verdict (`0` unless a mandatory case failed).
//! `invoker-tck list` prints the registered suites and their cases.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use invoker_tck_config::TckConfig;
use invoker_tck_core::LifecycleManager;
use invoker_tck_core::ReadinessProber;
use invoker_tck_core::Requirement;
use invoker_tck_core::Runner;
use invoker_tck_core::Suite;
use invoker_tck_core::SuiteReport;
use invoker_tck_core::runtime::render_json;
use invoker_tck_core::runtime::summarize;
use invoker_tck_docker::TestcontainersEngine;
use invoker_tck_docker::ensure_docker_available;
use invoker_tck_suites::all_suites;
use invoker_tck_suites::find_suite;
use invoker_tck_suites::suite_names;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "invoker-tck", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run conformance suites against candidate images.
    Run(RunCommand),
    /// List registered suites and their cases.
    List(ListCommand),
}

/// Arguments for `run`.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
struct RunCommand {
    /// TCK configuration file (defaults to `INVOKER_TCK_CONFIG`, then `invoker-tck.toml`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Suite to run; repeatable. Every registered suite runs when omitted.
    #[arg(long = "suite", value_name = "NAME")]
    suites: Vec<String>,
    /// Case to run; repeatable. Replaces `run.cases` from the configuration.
    #[arg(long = "case", value_name = "NAME")]
    cases: Vec<String>,
    /// Logical image mapping; repeatable.
    #[arg(long = "image", value_name = "LOGICAL=REF", value_parser = parse_image_mapping)]
    images: Vec<(String, String)>,
    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Upper bound on each verification procedure, in seconds.
    #[arg(
        long = "verification-timeout-sec",
        value_name = "N",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    verification_timeout_sec: Option<u64>,
}

/// Arguments for `list`.
#[derive(Args, Debug, Clone, Copy, PartialEq, Eq)]
struct ListCommand {
    /// Listing format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Output formats.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
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
    match cli.command {
        Commands::Run(command) => command_run(command).await,
        Commands::List(command) => command_list(command),
    }
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes the `run` command.
async fn command_run(command: RunCommand) -> CliResult<ExitCode> {
    let config = build_config(&command)?;
    let suites = select_suites(&command.suites)?;
    let events = config.event_sink().map_err(|err| CliError::new(err.to_string()))?;
    ensure_docker_available().map_err(|err| CliError::new(err.to_string()))?;

    let lifecycle = LifecycleManager::new(
        Arc::new(TestcontainersEngine::new()),
        config.port_allocator(),
        ReadinessProber::new(config.readiness_policy()),
    )
    .with_images(config.image_resolver())
    .with_events(events);
    let runner = Runner::new(Arc::new(lifecycle), config.run_options());
    let reports = runner.run_all(&suites).await.map_err(|err| CliError::new(err.to_string()))?;

    write_report(&reports, command.format)?;
    Ok(ExitCode::from(summarize(&reports).exit_code))
}

/// Loads the configuration and applies command-line overrides.
///
/// # Errors
///
/// Returns [`CliError`] when loading or validation fails.
fn build_config(command: &RunCommand) -> CliResult<TckConfig> {
    let mut config =
        TckConfig::load(command.config.as_deref()).map_err(|err| CliError::new(err.to_string()))?;
    if let Some(timeout) = command.verification_timeout_sec {
        config.run.verification_timeout_sec = Some(timeout);
    }
    if !command.cases.is_empty() {
        config.run.cases.clone_from(&command.cases);
    }
    for (logical, reference) in &command.images {
        config.images.insert(logical.clone(), reference.clone());
    }
    config.validate().map_err(|err| CliError::new(err.to_string()))?;
    Ok(config)
}

/// Resolves suite names; an empty list selects every registered suite.
///
/// # Errors
///
/// Returns [`CliError`] when a name is not registered.
fn select_suites(names: &[String]) -> CliResult<Vec<Suite>> {
    if names.is_empty() {
        return all_suites().map_err(|err| CliError::new(err.to_string()));
    }
    let mut suites: Vec<Suite> = Vec::with_capacity(names.len());
    for name in names {
        if suites.iter().any(|suite| suite.name().as_str() == name) {
            continue;
        }
        let suite = find_suite(name).map_err(|err| CliError::new(err.to_string()))?;
        let Some(suite) = suite else {
            return Err(CliError::new(format!(
                "unknown suite: {name} (available: {})",
                suite_names().join(", ")
            )));
        };
        suites.push(suite);
    }
    Ok(suites)
}

/// Writes the run report in the requested format.
fn write_report(reports: &[SuiteReport], format: OutputFormat) -> CliResult<()> {
    let rendered = match format {
        OutputFormat::Text => summarize(reports).rendered,
        OutputFormat::Json => {
            let mut json = render_json(reports)
                .map_err(|err| CliError::new(format!("failed to render report: {err}")))?;
            json.push('\n');
            json
        }
    };
    write_stdout(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Parses a `LOGICAL=REF` image mapping.
///
/// # Errors
///
/// Returns a message when either side is empty or `=` is missing.
fn parse_image_mapping(raw: &str) -> Result<(String, String), String> {
    let Some((logical, reference)) = raw.split_once('=') else {
        return Err(format!("expected LOGICAL=REF, got {raw}"));
    };
    let (logical, reference) = (logical.trim(), reference.trim());
    if logical.is_empty() || reference.is_empty() {
        return Err(format!("expected LOGICAL=REF, got {raw}"));
    }
    Ok((logical.to_string(), reference.to_string()))
}

// ============================================================================
// SECTION: List Command
// ============================================================================

/// Listed suite.
#[derive(Debug, Serialize)]
struct SuiteListing<'a> {
    /// Suite name.
    name: &'a str,
    /// Suite description.
    description: &'a str,
    /// Container port the candidate listens on.
    default_port: u16,
    /// Declared cases.
    cases: Vec<CaseListing<'a>>,
}

/// Listed case.
#[derive(Debug, Serialize)]
struct CaseListing<'a> {
    /// Case name.
    name: &'a str,
    /// Requirement level.
    requirement: Requirement,
    /// Logical image.
    image: &'a str,
    /// Case description.
    description: &'a str,
}

/// Executes the `list` command.
fn command_list(command: ListCommand) -> CliResult<ExitCode> {
    let suites = all_suites().map_err(|err| CliError::new(err.to_string()))?;
    let rendered = render_listing(&suites, command.format)?;
    write_stdout(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Renders the suite listing.
fn render_listing(suites: &[Suite], format: OutputFormat) -> CliResult<String> {
    let listings: Vec<SuiteListing<'_>> = suites.iter().map(suite_listing).collect();
    match format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&listings)
                .map_err(|err| CliError::new(format!("failed to render listing: {err}")))?;
            json.push('\n');
            Ok(json)
        }
        OutputFormat::Text => {
            let mut out = String::new();
            for suite in &listings {
                let _ = writeln!(
                    out,
                    "{}: {} (port {})",
                    suite.name, suite.description, suite.default_port
                );
                for case in &suite.cases {
                    let _ = writeln!(
                        out,
                        "  {:<8} {}  {}",
                        format!("[{}]", case.requirement.label()),
                        case.name,
                        case.description
                    );
                }
            }
            Ok(out)
        }
    }
}

/// Builds the listing of one suite.
fn suite_listing(suite: &Suite) -> SuiteListing<'_> {
    SuiteListing {
        name: suite.name().as_str(),
        description: suite.description(),
        default_port: suite.default_port(),
        cases: suite
            .cases()
            .iter()
            .map(|case| CaseListing {
                name: case.name().as_str(),
                requirement: case.requirement(),
                image: case.image().as_str(),
                description: case.description(),
            })
            .collect(),
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes pre-rendered text to stdout.
fn write_stdout(text: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(&format!("invoker-tck: {message}"));
    ExitCode::from(2)
}
