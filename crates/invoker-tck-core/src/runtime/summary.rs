// crates/invoker-tck-core/src/runtime/summary.rs
// ============================================================================
// Module: Result Aggregation
// Description: Exit status and rendered summaries for suite reports.
// Purpose: Turn suite reports into a deterministic verdict for callers.
// Dependencies: serde, serde_json, crate::core
// ============================================================================

//! ## Overview
//! The exit code is non-zero only when some suite contains a failed mandatory
//! case; optional failures are rendered but never change the exit code.
//! Rendering depends only on the reports, in the order given.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write;

use serde::Serialize;

use crate::core::CaseOutcome;
use crate::core::SuiteName;
use crate::core::SuiteReport;
use crate::core::SuiteStatus;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Exit code when every mandatory case passed.
pub const EXIT_PASSED: u8 = 0;
/// Exit code when at least one mandatory case failed.
pub const EXIT_FAILED: u8 = 1;

// ============================================================================
// SECTION: Summary
// ============================================================================

/// Aggregated verdict of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Overall status across suites.
    pub status: SuiteStatus,
    /// Process exit code.
    pub exit_code: u8,
    /// Human-readable rendering.
    pub rendered: String,
}

/// Computes the overall status across reports.
#[must_use]
pub fn overall_status(reports: &[SuiteReport]) -> SuiteStatus {
    if reports.iter().any(|report| report.status() == SuiteStatus::Failed) {
        SuiteStatus::Failed
    } else {
        SuiteStatus::Passed
    }
}

/// Summarizes reports into an exit code and a text rendering.
#[must_use]
pub fn summarize(reports: &[SuiteReport]) -> RunSummary {
    let status = overall_status(reports);
    let mut rendered = String::new();
    for report in reports {
        render_report(&mut rendered, report);
    }
    let _ = writeln!(rendered, "Overall: {}", status_label(status));
    RunSummary {
        status,
        exit_code: exit_code(status),
        rendered,
    }
}

/// Renders reports as a JSON document.
///
/// # Errors
///
/// Returns [`serde_json::Error`] when serialization fails.
pub fn render_json(reports: &[SuiteReport]) -> Result<String, serde_json::Error> {
    let status = overall_status(reports);
    let document = RunDocument {
        status,
        exit_code: exit_code(status),
        suites: reports
            .iter()
            .map(|report| SuiteDocument {
                suite: &report.suite,
                description: &report.description,
                status: report.status(),
                outcomes: &report.outcomes,
            })
            .collect(),
    };
    serde_json::to_string_pretty(&document)
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// JSON document for a whole run.
#[derive(Serialize)]
struct RunDocument<'a> {
    /// Overall status.
    status: SuiteStatus,
    /// Process exit code.
    exit_code: u8,
    /// Per-suite documents.
    suites: Vec<SuiteDocument<'a>>,
}

/// JSON document for one suite.
#[derive(Serialize)]
struct SuiteDocument<'a> {
    /// Suite name.
    suite: &'a SuiteName,
    /// Suite description.
    description: &'a str,
    /// Derived suite status.
    status: SuiteStatus,
    /// Ordered outcomes.
    outcomes: &'a [CaseOutcome],
}

/// Maps a status onto the process exit code.
const fn exit_code(status: SuiteStatus) -> u8 {
    match status {
        SuiteStatus::Passed => EXIT_PASSED,
        SuiteStatus::Failed => EXIT_FAILED,
    }
}

/// Returns the uppercase label for a status.
const fn status_label(status: SuiteStatus) -> &'static str {
    match status {
        SuiteStatus::Passed => "PASSED",
        SuiteStatus::Failed => "FAILED",
    }
}

/// Appends the text rendering of one report.
fn render_report(out: &mut String, report: &SuiteReport) {
    let _ = writeln!(out, "Suite {}: {}", report.suite, report.description);
    let name_width = report.outcomes.iter().map(|outcome| outcome.name.as_str().len()).max();
    let name_width = name_width.unwrap_or(0);
    for outcome in &report.outcomes {
        let _ = writeln!(
            out,
            "  {} {:<8} {:<name_width$}  {}",
            outcome.status.label(),
            format!("[{}]", outcome.requirement.label()),
            outcome.name.as_str(),
            outcome.description,
        );
        if let Some(diagnostic) = &outcome.diagnostic {
            let _ = writeln!(out, "       -> {diagnostic}");
        }
    }
    let _ = writeln!(
        out,
        "  => {}: {} ({} passed, {} mandatory failed, {} optional failed, {} skipped)",
        report.suite,
        status_label(report.status()),
        report.passed(),
        report.failed_mandatory(),
        report.failed_optional(),
        report.skipped(),
    );
}
