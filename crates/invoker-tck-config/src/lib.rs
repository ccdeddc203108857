// crates/invoker-tck-config/src/lib.rs
// ============================================================================
// Module: Invoker TCK Config Library
// Description: Configuration model, loading, and runtime wiring.
// Purpose: Single source of truth for invoker-tck.toml semantics.
// Dependencies: invoker-tck-core, serde, toml
// ============================================================================

//! ## Overview
//! `invoker-tck-config` loads `invoker-tck.toml`, applies environment
//! overrides, validates the result fail-closed, and builds the runtime pieces
//! (readiness policy, port allocator, run options, image resolver, event sink)
//! consumed by the execution engine.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod env;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use env::EnvOverrides;
pub use env::TckEnv;
