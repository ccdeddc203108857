// crates/invoker-tck-core/src/core/outcome.rs
// ============================================================================
// Module: Case Outcomes and Suite Reports
// Description: Recorded results of running cases and suites.
// Purpose: Provide serializable outcomes with derived suite verdicts.
// Dependencies: serde, crate::core
// ============================================================================

//! ## Overview
//! A [`CaseOutcome`] is recorded for every declared case, including cases that
//! were not selected. A [`SuiteReport`] derives its verdict from its outcomes:
//! it fails only when a mandatory case failed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::core::case::Requirement;
use crate::core::case::TestCase;
use crate::core::identifiers::CaseName;
use crate::core::identifiers::SuiteName;

// ============================================================================
// SECTION: Case Outcome
// ============================================================================

/// Status of a single case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    /// Verification completed normally.
    Passed,
    /// Setup or verification failed.
    Failed,
    /// The case was not executed.
    Skipped,
}

impl CaseStatus {
    /// Returns a short uppercase label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Passed => "PASS",
            Self::Failed => "FAIL",
            Self::Skipped => "SKIP",
        }
    }
}

/// Classification of a failed case.
///
/// # Invariants
/// - Variants are stable for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The image could not be pulled.
    ImageUnavailable,
    /// No host port could be reserved.
    PortExhaustion,
    /// The container could not be created or started.
    StartFailure,
    /// The instance never accepted connections.
    ReadinessTimeout,
    /// The setup strategy terminated abnormally.
    SetupPanic,
    /// The verification procedure reported a failure.
    Verification,
    /// The verification procedure terminated abnormally.
    VerificationPanic,
    /// The verification procedure exceeded its time budget.
    VerificationTimeout,
}

/// Recorded result of one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseOutcome {
    /// Case name.
    pub name: CaseName,
    /// Case description.
    pub description: String,
    /// Requirement level carried over from the descriptor.
    pub requirement: Requirement,
    /// Case status.
    pub status: CaseStatus,
    /// Failure classification when the case failed.
    pub failure: Option<FailureKind>,
    /// Diagnostic message, if any.
    pub diagnostic: Option<String>,
    /// Wall time spent on the case in milliseconds.
    pub duration_ms: u64,
}

impl CaseOutcome {
    /// Records a passed case.
    #[must_use]
    pub fn passed(case: &TestCase, elapsed: Duration) -> Self {
        Self::record(case, CaseStatus::Passed, None, None, elapsed)
    }

    /// Records a failed case.
    #[must_use]
    pub fn failed(
        case: &TestCase,
        kind: FailureKind,
        diagnostic: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self::record(case, CaseStatus::Failed, Some(kind), Some(diagnostic.into()), elapsed)
    }

    /// Records a skipped case.
    #[must_use]
    pub fn skipped(case: &TestCase, reason: impl Into<String>) -> Self {
        Self::record(case, CaseStatus::Skipped, None, Some(reason.into()), Duration::ZERO)
    }

    /// Returns true when this outcome fails its suite.
    #[must_use]
    pub const fn is_mandatory_failure(&self) -> bool {
        matches!(self.status, CaseStatus::Failed) && self.requirement.is_mandatory()
    }

    /// Builds an outcome from its parts.
    fn record(
        case: &TestCase,
        status: CaseStatus,
        failure: Option<FailureKind>,
        diagnostic: Option<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            name: case.name().clone(),
            description: case.description().to_string(),
            requirement: case.requirement(),
            status,
            failure,
            diagnostic,
            duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

// ============================================================================
// SECTION: Suite Report
// ============================================================================

/// Overall verdict of a suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuiteStatus {
    /// No mandatory case failed.
    Passed,
    /// At least one mandatory case failed.
    Failed,
}

/// Ordered outcomes of one suite run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Suite name.
    pub suite: SuiteName,
    /// Suite description.
    pub description: String,
    /// Outcomes in case declaration order.
    pub outcomes: Vec<CaseOutcome>,
}

impl SuiteReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new(suite: SuiteName, description: impl Into<String>) -> Self {
        Self {
            suite,
            description: description.into(),
            outcomes: Vec::new(),
        }
    }

    /// Appends an outcome.
    pub fn push(&mut self, outcome: CaseOutcome) {
        self.outcomes.push(outcome);
    }

    /// Derives the suite verdict.
    #[must_use]
    pub fn status(&self) -> SuiteStatus {
        if self.outcomes.iter().any(CaseOutcome::is_mandatory_failure) {
            SuiteStatus::Failed
        } else {
            SuiteStatus::Passed
        }
    }

    /// Counts passed cases.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.count(|outcome| outcome.status == CaseStatus::Passed)
    }

    /// Counts failed mandatory cases.
    #[must_use]
    pub fn failed_mandatory(&self) -> usize {
        self.count(CaseOutcome::is_mandatory_failure)
    }

    /// Counts failed optional cases.
    #[must_use]
    pub fn failed_optional(&self) -> usize {
        self.count(|outcome| {
            outcome.status == CaseStatus::Failed && !outcome.requirement.is_mandatory()
        })
    }

    /// Counts skipped cases.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|outcome| outcome.status == CaseStatus::Skipped)
    }

    /// Counts outcomes matching a predicate.
    fn count(&self, predicate: impl Fn(&CaseOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|outcome| predicate(outcome)).count()
    }
}
