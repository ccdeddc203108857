// crates/invoker-tck-core/src/core/suite.rs
// ============================================================================
// Module: Test Suites
// Description: Named, ordered collections of test cases sharing defaults.
// Purpose: Validate suite registration eagerly.
// Dependencies: thiserror, crate::core
// ============================================================================

//! ## Overview
//! A [`Suite`] groups cases under a name, a description, and a default port.
//! Registration rejects duplicate case names, empty suites, and a zero port so
//! that reporting and selective execution can key on case names safely.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use thiserror::Error;

use crate::core::case::TestCase;
use crate::core::identifiers::CaseName;
use crate::core::identifiers::SuiteName;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Registration errors for suites and cases.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SuiteError {
    /// A case was declared without a verification procedure.
    #[error("case {0} has no verification procedure")]
    MissingVerification(CaseName),
    /// A required case field was missing or empty.
    #[error("case {case} has an empty {field}")]
    EmptyField {
        /// Case being registered.
        case: CaseName,
        /// Offending field.
        field: &'static str,
    },
    /// Two cases share the same name.
    #[error("suite {suite} declares case {case} more than once")]
    DuplicateCase {
        /// Suite being registered.
        suite: SuiteName,
        /// Duplicated case name.
        case: CaseName,
    },
    /// The suite declares no cases.
    #[error("suite {0} declares no cases")]
    EmptySuite(SuiteName),
    /// The suite name is empty.
    #[error("suite name must not be empty")]
    EmptyName,
    /// The suite default port is not usable.
    #[error("suite {0} default port must be non-zero")]
    InvalidPort(SuiteName),
}

// ============================================================================
// SECTION: Suite
// ============================================================================

/// Immutable, validated test suite.
///
/// # Invariants
/// - Case names are unique.
/// - At least one case is declared.
/// - `default_port` is non-zero.
#[derive(Debug, Clone)]
pub struct Suite {
    /// Suite name.
    name: SuiteName,
    /// Human-readable description.
    description: String,
    /// Default container port for cases that do not override it.
    default_port: u16,
    /// Cases in declaration order.
    cases: Vec<TestCase>,
}

impl Suite {
    /// Registers a suite.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError`] when the suite is empty, has a zero port, or
    /// declares duplicate case names.
    pub fn new(
        name: impl Into<SuiteName>,
        description: impl Into<String>,
        default_port: u16,
        cases: Vec<TestCase>,
    ) -> Result<Self, SuiteError> {
        let name = name.into();
        if name.as_str().trim().is_empty() {
            return Err(SuiteError::EmptyName);
        }
        if default_port == 0 {
            return Err(SuiteError::InvalidPort(name));
        }
        if cases.is_empty() {
            return Err(SuiteError::EmptySuite(name));
        }
        let mut seen = BTreeSet::new();
        for case in &cases {
            if !seen.insert(case.name().clone()) {
                return Err(SuiteError::DuplicateCase {
                    suite: name,
                    case: case.name().clone(),
                });
            }
        }
        Ok(Self {
            name,
            description: description.into(),
            default_port,
            cases,
        })
    }

    /// Returns the suite name.
    #[must_use]
    pub const fn name(&self) -> &SuiteName {
        &self.name
    }

    /// Returns the suite description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the default container port.
    #[must_use]
    pub const fn default_port(&self) -> u16 {
        self.default_port
    }

    /// Returns the cases in declaration order.
    #[must_use]
    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    /// Looks up a case by name.
    #[must_use]
    pub fn case(&self, name: &CaseName) -> Option<&TestCase> {
        self.cases.iter().find(|case| case.name() == name)
    }
}
