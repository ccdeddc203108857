// crates/invoker-tck-suites/src/lib.rs
// ============================================================================
// Module: Invoker TCK Suites Library
// Description: Built-in conformance suites and their registry.
// Purpose: Declare what a compliant function invoker must do.
// Dependencies: invoker-tck-core, reqwest
// ============================================================================

//! ## Overview
//! Suites are declared with the core model and verified over HTTP with
//! `reqwest`. The registry exposes every built-in suite by name; custom setup
//! strategies shared by suites live in [`strategies`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod http;
pub mod registry;
pub mod request_reply;
pub mod strategies;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use registry::all_suites;
pub use registry::find_suite;
pub use registry::suite_names;
pub use strategies::PortEnvVarSetup;
