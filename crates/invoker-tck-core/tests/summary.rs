// crates/invoker-tck-core/tests/summary.rs
// ============================================================================
// Module: Result Aggregation Tests
// Description: Exit codes and rendering of suite reports.
// Purpose: Ensure optional failures never affect the exit code.
// Dependencies: invoker-tck-core, serde_json
// ============================================================================

//! ## Overview
//! Builds reports by hand and checks the derived verdict, exit code, and the
//! text and JSON renderings.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::time::Duration;

use invoker_tck_core::CaseOutcome;
use invoker_tck_core::FailureKind;
use invoker_tck_core::SuiteName;
use invoker_tck_core::SuiteReport;
use invoker_tck_core::SuiteStatus;
use invoker_tck_core::TestCase;
use invoker_tck_core::VerificationFailure;
use invoker_tck_core::runtime::EXIT_FAILED;
use invoker_tck_core::runtime::EXIT_PASSED;
use invoker_tck_core::runtime::render_json;
use invoker_tck_core::runtime::summarize;

async fn pass(_port: u16) -> Result<(), VerificationFailure> {
    Ok(())
}

fn case(name: &str, optional: bool) -> TestCase {
    let builder = TestCase::builder(name).description(format!("{name} checks")).image("upper");
    let builder = if optional { builder.optional() } else { builder };
    builder.verify(pass).build().unwrap()
}

fn report(outcomes: Vec<CaseOutcome>) -> SuiteReport {
    let mut report = SuiteReport::new(SuiteName::new("rr"), "Request / Reply Interaction");
    for outcome in outcomes {
        report.push(outcome);
    }
    report
}

#[test]
fn optional_failures_keep_exit_code_zero() {
    let reports = vec![report(vec![
        CaseOutcome::passed(&case("rr-0002", false), Duration::from_millis(12)),
        CaseOutcome::failed(
            &case("rr-0003", true),
            FailureKind::Verification,
            "Expected http status 415, got 200",
            Duration::from_millis(7),
        ),
    ])];

    let summary = summarize(&reports);

    assert_eq!(summary.status, SuiteStatus::Passed);
    assert_eq!(summary.exit_code, EXIT_PASSED);
    assert!(summary.rendered.contains("FAIL [SHOULD]"));
    assert!(summary.rendered.contains("-> Expected http status 415, got 200"));
    assert!(summary.rendered.contains("Overall: PASSED"));
}

#[test]
fn mandatory_failure_sets_exit_code_one() {
    let reports = vec![
        report(vec![CaseOutcome::passed(&case("a-0001", false), Duration::ZERO)]),
        report(vec![CaseOutcome::failed(
            &case("rr-0004", false),
            FailureKind::ReadinessTimeout,
            "instance at localhost:1 not ready after 10 attempts: refused",
            Duration::ZERO,
        )]),
    ];

    let summary = summarize(&reports);

    assert_eq!(summary.status, SuiteStatus::Failed);
    assert_eq!(summary.exit_code, EXIT_FAILED);
    assert!(summary.rendered.contains("FAIL [MUST]"));
    assert!(summary.rendered.contains("=> rr: FAILED (0 passed, 1 mandatory failed, 0 optional failed, 0 skipped)"));
    assert!(summary.rendered.ends_with("Overall: FAILED\n"));
}

#[test]
fn skipped_cases_do_not_fail_the_run() {
    let reports =
        vec![report(vec![CaseOutcome::skipped(&case("rr-0001", false), "not selected")])];

    let summary = summarize(&reports);

    assert_eq!(summary.exit_code, EXIT_PASSED);
    assert!(summary.rendered.contains("SKIP [MUST]"));
}

#[test]
fn empty_run_passes() {
    let summary = summarize(&[]);
    assert_eq!(summary.exit_code, EXIT_PASSED);
    assert_eq!(summary.rendered, "Overall: PASSED\n");
}

#[test]
fn json_rendering_carries_outcomes_and_exit_code() {
    let reports = vec![report(vec![
        CaseOutcome::passed(&case("rr-0001", false), Duration::from_millis(3)),
        CaseOutcome::failed(
            &case("rr-0005", true),
            FailureKind::Verification,
            "Expected http status 406, got 200",
            Duration::from_millis(4),
        ),
    ])];

    let value: serde_json::Value = serde_json::from_str(&render_json(&reports).unwrap()).unwrap();

    assert_eq!(value["status"], "passed");
    assert_eq!(value["exit_code"], 0);
    let suite = &value["suites"][0];
    assert_eq!(suite["suite"], "rr");
    assert_eq!(suite["outcomes"][0]["status"], "passed");
    assert_eq!(suite["outcomes"][0]["duration_ms"], 3);
    assert_eq!(suite["outcomes"][1]["requirement"], "should");
    assert_eq!(suite["outcomes"][1]["failure"], "verification");
}
