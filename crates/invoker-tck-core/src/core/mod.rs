// crates/invoker-tck-core/src/core/mod.rs
// ============================================================================
// Module: Invoker TCK Core Types
// Description: Suites, cases, identifiers, and recorded outcomes.
// Purpose: Provide the immutable model driven by the execution engine.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Core types define what a suite declares and what a run records. Suites and
//! cases are validated at registration; outcomes and reports are plain
//! serializable data.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod case;
pub mod identifiers;
pub mod outcome;
pub mod suite;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use case::Requirement;
pub use case::TestCase;
pub use case::TestCaseBuilder;
pub use identifiers::CaseName;
pub use identifiers::ContainerId;
pub use identifiers::DEFAULT_IMAGE_TAG;
pub use identifiers::ImageRef;
pub use identifiers::SuiteName;
pub use outcome::CaseOutcome;
pub use outcome::CaseStatus;
pub use outcome::FailureKind;
pub use outcome::SuiteReport;
pub use outcome::SuiteStatus;
pub use suite::Suite;
pub use suite::SuiteError;
