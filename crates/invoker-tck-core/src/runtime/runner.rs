// crates/invoker-tck-core/src/runtime/runner.rs
// ============================================================================
// Module: Execution Engine
// Description: Sequential, isolated execution of suite cases.
// Purpose: Record exactly one outcome per declared case, in order.
// Dependencies: thiserror, tokio, crate::runtime::lifecycle
// ============================================================================

//! ## Overview
//! For each case the runner resolves the image, invokes the case's setup
//! strategy, runs the verification procedure, and always invokes the teardown
//! strategy for a handle that setup produced. Each phase runs on its own task,
//! so a panic in any of them is captured at the case boundary and the run
//! still reports every case. Setup failures are terminal for the case and skip
//! teardown (no handle exists). Teardown errors and panics are logged and
//! never change the recorded outcome.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::any::Any;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use thiserror::Error;
use tokio::task::JoinError;

use crate::core::CaseName;
use crate::core::CaseOutcome;
use crate::core::FailureKind;
use crate::core::Suite;
use crate::core::SuiteReport;
use crate::core::TestCase;
use crate::events::TckEventKind;
use crate::interfaces::SetupRequest;
use crate::runtime::lifecycle::InstanceHandle;
use crate::runtime::lifecycle::LifecycleManager;

// ============================================================================
// SECTION: Options
// ============================================================================

/// Diagnostic recorded for cases left out of a selection.
pub const NOT_SELECTED: &str = "not selected";

/// Which cases of a suite are executed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CaseSelection {
    /// Execute every case.
    #[default]
    All,
    /// Execute only the named cases; others are reported as skipped.
    Only(BTreeSet<CaseName>),
}

impl CaseSelection {
    /// Builds a selection from names; an empty list selects every case.
    #[must_use]
    pub fn from_names(names: impl IntoIterator<Item = CaseName>) -> Self {
        let names: BTreeSet<CaseName> = names.into_iter().collect();
        if names.is_empty() { Self::All } else { Self::Only(names) }
    }

    /// Returns true when the case should run.
    #[must_use]
    pub fn includes(&self, name: &CaseName) -> bool {
        match self {
            Self::All => true,
            Self::Only(names) => names.contains(name),
        }
    }
}

/// Runner options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Case selection.
    pub selection: CaseSelection,
    /// Upper bound on a single verification procedure; unbounded when `None`.
    pub verification_timeout: Option<Duration>,
}

/// Errors detected before any case runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// A selected case name is not declared by any suite.
    #[error("unknown case: {0}")]
    UnknownCase(CaseName),
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Sequential execution engine.
pub struct Runner {
    /// Lifecycle manager shared by every case.
    lifecycle: Arc<LifecycleManager>,
    /// Run options.
    options: RunOptions,
}

/// Captured failure of the verification phase.
struct CaseFailure {
    /// Failure classification.
    kind: FailureKind,
    /// Diagnostic message.
    message: String,
}

impl Runner {
    /// Creates a runner.
    #[must_use]
    pub const fn new(lifecycle: Arc<LifecycleManager>, options: RunOptions) -> Self {
        Self {
            lifecycle,
            options,
        }
    }

    /// Runs every suite in order after validating the case selection.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::UnknownCase`] when the selection names a case that
    /// no suite declares. No case runs in that situation.
    pub async fn run_all(&self, suites: &[Suite]) -> Result<Vec<SuiteReport>, RunError> {
        if let CaseSelection::Only(names) = &self.options.selection
            && let Some(unknown) = names
                .iter()
                .find(|name| !suites.iter().any(|suite| suite.case(name).is_some()))
        {
            return Err(RunError::UnknownCase(unknown.clone()));
        }
        let mut reports = Vec::with_capacity(suites.len());
        for suite in suites {
            reports.push(self.run(suite).await);
        }
        Ok(reports)
    }

    /// Runs one suite, producing one outcome per declared case in order.
    pub async fn run(&self, suite: &Suite) -> SuiteReport {
        let mut report = SuiteReport::new(suite.name().clone(), suite.description());
        for case in suite.cases() {
            let outcome = self.run_case(suite, case).await;
            report.push(outcome);
        }
        report
    }

    /// Executes a single case through setup, verification, and teardown.
    async fn run_case(&self, suite: &Suite, case: &TestCase) -> CaseOutcome {
        let events = self.lifecycle.events();
        if !self.options.selection.includes(case.name()) {
            events.emit(TckEventKind::CaseSkipped {
                suite: suite.name().clone(),
                case: case.name().clone(),
            });
            return CaseOutcome::skipped(case, NOT_SELECTED);
        }
        events.emit(TckEventKind::CaseStarted {
            suite: suite.name().clone(),
            case: case.name().clone(),
        });
        let started = Instant::now();
        let request = SetupRequest {
            case: case.name().clone(),
            image: self.lifecycle.resolve_image(case.image()),
            default_port: suite.default_port(),
        };
        let outcome = match self.setup_isolated(case, request).await {
            Err(failure) => {
                CaseOutcome::failed(case, failure.kind, failure.message, started.elapsed())
            }
            Ok(handle) => {
                let verdict = self.verify_isolated(case, handle.port()).await;
                events.emit(TckEventKind::VerificationFinished {
                    case: case.name().clone(),
                    failure: verdict.as_ref().err().map(|failure| failure.kind),
                });
                self.teardown_isolated(case, handle).await;
                match verdict {
                    Ok(()) => CaseOutcome::passed(case, started.elapsed()),
                    Err(failure) => {
                        CaseOutcome::failed(case, failure.kind, failure.message, started.elapsed())
                    }
                }
            }
        };
        events.emit(TckEventKind::CaseFinished {
            suite: suite.name().clone(),
            case: case.name().clone(),
            status: outcome.status,
            failure: outcome.failure,
            duration_ms: outcome.duration_ms,
        });
        outcome
    }

    /// Runs the setup strategy on its own task. A panic becomes
    /// [`FailureKind::SetupPanic`]; the handle, if any, is dropped with the task.
    async fn setup_isolated(
        &self,
        case: &TestCase,
        request: SetupRequest,
    ) -> Result<InstanceHandle, CaseFailure> {
        let setup = case.setup();
        let lifecycle = Arc::clone(&self.lifecycle);
        let task = tokio::spawn(async move { setup.setup(&lifecycle, &request).await });
        match task.await {
            Ok(Ok(handle)) => Ok(handle),
            Ok(Err(err)) => Err(CaseFailure {
                kind: err.kind(),
                message: err.to_string(),
            }),
            Err(err) => Err(CaseFailure {
                kind: FailureKind::SetupPanic,
                message: format!("setup {}", join_failure(err)),
            }),
        }
    }

    /// Runs the teardown strategy on its own task. Errors and panics are
    /// logged as `teardown_failed` and never reach the outcome.
    async fn teardown_isolated(&self, case: &TestCase, handle: InstanceHandle) {
        let teardown = case.teardown();
        let lifecycle = Arc::clone(&self.lifecycle);
        let task = tokio::spawn(async move { teardown.teardown(&lifecycle, handle).await });
        let error = match task.await {
            Ok(Ok(())) => return,
            Ok(Err(err)) => err.to_string(),
            Err(err) => format!("teardown {}", join_failure(err)),
        };
        self.lifecycle.events().emit(TckEventKind::TeardownFailed {
            case: case.name().clone(),
            error,
        });
    }

    /// Runs the verification procedure on its own task. Panics become
    /// [`FailureKind::VerificationPanic`]. With a configured limit, a procedure
    /// that is still running at the deadline is aborted and detached, and one
    /// that finished after the deadline is also recorded as
    /// [`FailureKind::VerificationTimeout`].
    async fn verify_isolated(&self, case: &TestCase, port: u16) -> Result<(), CaseFailure> {
        let verification = case.verification();
        let started = Instant::now();
        let mut task = tokio::spawn(async move { verification.verify(port).await });
        let joined = match self.options.verification_timeout {
            None => task.await,
            Some(limit) => match tokio::time::timeout(limit, &mut task).await {
                Ok(joined) if started.elapsed() <= limit => joined,
                Ok(_) => return Err(timeout_failure(limit)),
                Err(_) => {
                    task.abort();
                    return Err(timeout_failure(limit));
                }
            },
        };
        match joined {
            Ok(Ok(())) => Ok(()),
            Ok(Err(failure)) => Err(CaseFailure {
                kind: FailureKind::Verification,
                message: failure.message().to_string(),
            }),
            Err(err) => Err(CaseFailure {
                kind: FailureKind::VerificationPanic,
                message: format!("verification {}", join_failure(err)),
            }),
        }
    }
}

/// Failure recorded when verification overruns `limit`.
fn timeout_failure(limit: Duration) -> CaseFailure {
    CaseFailure {
        kind: FailureKind::VerificationTimeout,
        message: format!("verification did not complete within {} ms", limit.as_millis()),
    }
}

/// Describes a task that did not return normally.
fn join_failure(err: JoinError) -> String {
    if err.is_panic() {
        let payload = err.into_panic();
        format!("panicked: {}", panic_message(payload.as_ref()))
    } else {
        format!("task did not complete: {err}")
    }
}

/// Extracts a readable message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
