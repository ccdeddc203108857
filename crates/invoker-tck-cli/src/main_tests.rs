// crates/invoker-tck-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and config overrides.
// Purpose: Ensure command-line input is validated before any container runs.
// Dependencies: clap, invoker-tck-cli main helpers, tempfile
// ============================================================================

//! ## Overview
//! Covers argument parsing, image mapping syntax, suite selection, the way
//! flags override the configuration file, and the `list` renderings.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::time::Duration;

use clap::Parser;
use invoker_tck_core::CaseName;
use invoker_tck_core::ImageRef;
use invoker_tck_suites::all_suites;
use tempfile::NamedTempFile;

use super::Cli;
use super::Commands;
use super::OutputFormat;
use super::RunCommand;
use super::build_config;
use super::parse_image_mapping;
use super::render_listing;
use super::select_suites;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn parse_run(args: &[&str]) -> RunCommand {
    let cli = Cli::try_parse_from(std::iter::once("invoker-tck").chain(args.iter().copied()))
        .expect("arguments should parse");
    match cli.command {
        Commands::Run(command) => command,
        Commands::List(_) => panic!("expected run"),
    }
}

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

// ============================================================================
// SECTION: Argument Parsing
// ============================================================================

#[test]
fn run_accepts_repeated_selectors() {
    let command = parse_run(&[
        "run",
        "--suite",
        "rr",
        "--case",
        "rr-0001",
        "--case",
        "rr-0004",
        "--image",
        "upper=ghcr.io/acme/upper:1.0",
        "--format",
        "json",
        "--verification-timeout-sec",
        "30",
    ]);
    assert_eq!(command.suites, vec!["rr".to_string()]);
    assert_eq!(command.cases, vec!["rr-0001".to_string(), "rr-0004".to_string()]);
    assert_eq!(
        command.images,
        vec![("upper".to_string(), "ghcr.io/acme/upper:1.0".to_string())]
    );
    assert_eq!(command.format, OutputFormat::Json);
    assert_eq!(command.verification_timeout_sec, Some(30));
}

#[test]
fn run_rejects_zero_timeout_and_malformed_images() {
    let zero = Cli::try_parse_from(["invoker-tck", "run", "--verification-timeout-sec", "0"]);
    assert!(zero.is_err());
    let image = Cli::try_parse_from(["invoker-tck", "run", "--image", "upper"]);
    assert!(image.is_err());
}

#[test]
fn image_mapping_requires_both_sides() {
    assert_eq!(
        parse_image_mapping(" upper = localhost:5000/upper:dev "),
        Ok(("upper".to_string(), "localhost:5000/upper:dev".to_string()))
    );
    assert!(parse_image_mapping("=ref").is_err());
    assert!(parse_image_mapping("upper=").is_err());
    assert!(parse_image_mapping("upper").is_err());
}

// ============================================================================
// SECTION: Suite Selection
// ============================================================================

#[test]
fn empty_selection_runs_every_suite() {
    let suites = select_suites(&[]).unwrap();
    assert_eq!(suites.len(), all_suites().unwrap().len());
}

#[test]
fn duplicate_suite_names_run_once() {
    let suites = select_suites(&["rr".to_string(), "rr".to_string()]).unwrap();
    assert_eq!(suites.len(), 1);
}

#[test]
fn unknown_suite_lists_available_names() {
    let err = select_suites(&["pubsub".to_string()]).unwrap_err();
    assert_eq!(err.to_string(), "unknown suite: pubsub (available: rr)");
}

// ============================================================================
// SECTION: Config Overrides
// ============================================================================

#[test]
fn flags_override_the_config_file() {
    let file = config_file(
        "[run]\nverification_timeout_sec = 5\ncases = [\"rr-0002\"]\n\n[images]\nupper = \"upper-go\"\n",
    );
    let path = file.path().display().to_string();
    let command = parse_run(&[
        "run",
        "--config",
        &path,
        "--case",
        "rr-0004",
        "--image",
        "upper=upper-rust:2",
        "--verification-timeout-sec",
        "9",
    ]);

    let config = build_config(&command).unwrap();

    let options = config.run_options();
    assert_eq!(options.verification_timeout, Some(Duration::from_secs(9)));
    assert!(options.selection.includes(&CaseName::new("rr-0004")));
    assert!(!options.selection.includes(&CaseName::new("rr-0002")));
    assert_eq!(config.image_resolver().resolve(&ImageRef::new("upper")).as_str(), "upper-rust:2");
}

#[test]
fn config_file_values_survive_without_flags() {
    let file = config_file("[run]\ncases = [\"rr-0002\"]\n");
    let path = file.path().display().to_string();
    let command = parse_run(&["run", "--config", &path]);

    let config = build_config(&command).unwrap();

    assert_eq!(config.run.cases, vec!["rr-0002".to_string()]);
}

#[test]
fn invalid_config_is_reported() {
    let file = config_file("[readiness]\nmax_attempts = 0\n");
    let path = file.path().display().to_string();
    let command = parse_run(&["run", "--config", &path]);

    assert!(build_config(&command).is_err());
}

// ============================================================================
// SECTION: Listing
// ============================================================================

#[test]
fn text_listing_shows_requirement_levels() {
    let suites = all_suites().unwrap();
    let text = render_listing(&suites, OutputFormat::Text).unwrap();
    assert!(text.starts_with("rr: Request / Reply Interaction (port 8080)\n"));
    assert!(text.contains("[MUST]   rr-0001  MUST NOT reply on paths other than / or methods other than POST"));
    assert!(text.contains("[SHOULD] rr-0005  SHOULD reply with 406 on inability to marshall back"));
}

#[test]
fn json_listing_is_machine_readable() {
    let suites = all_suites().unwrap();
    let json = render_listing(&suites, OutputFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value[0]["name"], "rr");
    assert_eq!(value[0]["default_port"], 8080);
    assert_eq!(value[0]["cases"][2]["name"], "rr-0003");
    assert_eq!(value[0]["cases"][2]["requirement"], "should");
    assert_eq!(value[0]["cases"][2]["image"], "upper");
}
