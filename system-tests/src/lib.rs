// system-tests/src/lib.rs
// ============================================================================
// Module: Invoker TCK System Tests Library
// Description: Reference candidate, in-process engine, and test configuration.
// Purpose: Run the built-in suites end to end without a container runtime.
// Dependencies: axum, invoker-tck-core, tokio
// ============================================================================

//! ## Overview
//! This crate hosts the pieces the end-to-end tests in `system-tests/tests`
//! share: an HTTP [`candidate::Candidate`] implementing the request/reply
//! contract in several degrees of compliance, an [`engine::InProcessEngine`]
//! that "runs" those candidates on the leased host port, and environment
//! configuration for the Docker-backed scenarios.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod candidate;
pub mod config;
pub mod engine;
