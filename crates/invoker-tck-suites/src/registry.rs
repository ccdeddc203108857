// crates/invoker-tck-suites/src/registry.rs
// ============================================================================
// Module: Suite Registry
// Description: Lookup of built-in suites by name.
// Purpose: Give the CLI and tests one place to enumerate suites.
// Dependencies: invoker-tck-core
// ============================================================================

//! ## Overview
//! Suites are constructed on demand; registration errors surface as
//! [`SuiteError`] instead of panicking at startup.

// ============================================================================
// SECTION: Imports
// ============================================================================

use invoker_tck_core::Suite;
use invoker_tck_core::SuiteError;

use crate::request_reply;

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Constructor of a built-in suite.
type SuiteFactory = fn() -> Result<Suite, SuiteError>;

/// Built-in suites in run order.
const SUITES: &[(&str, SuiteFactory)] = &[(request_reply::SUITE_NAME, request_reply::suite)];

/// Returns the names of every built-in suite, in run order.
#[must_use]
pub fn suite_names() -> Vec<&'static str> {
    SUITES.iter().map(|(name, _)| *name).collect()
}

/// Builds every built-in suite, in run order.
///
/// # Errors
///
/// Returns [`SuiteError`] if a suite declaration is invalid.
pub fn all_suites() -> Result<Vec<Suite>, SuiteError> {
    SUITES.iter().map(|(_, factory)| factory()).collect()
}

/// Builds the suite named `name`, if it exists.
///
/// # Errors
///
/// Returns [`SuiteError`] if the suite declaration is invalid.
pub fn find_suite(name: &str) -> Result<Option<Suite>, SuiteError> {
    SUITES.iter().find(|(candidate, _)| *candidate == name).map(|(_, factory)| factory()).transpose()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only assertions favor direct unwrap for clarity.")]
mod tests {
    use super::all_suites;
    use super::find_suite;
    use super::suite_names;

    #[test]
    fn registry_lists_request_reply() {
        assert_eq!(suite_names(), vec!["rr"]);
        let suites = all_suites().unwrap();
        assert_eq!(suites.len(), 1);
        assert_eq!(suites[0].cases().len(), 5);
    }

    #[test]
    fn find_suite_by_name() {
        assert!(find_suite("rr").unwrap().is_some());
        assert!(find_suite("streaming").unwrap().is_none());
    }
}
