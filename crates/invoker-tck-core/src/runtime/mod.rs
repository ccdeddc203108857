// crates/invoker-tck-core/src/runtime/mod.rs
// ============================================================================
// Module: Invoker TCK Runtime
// Description: Port allocation, readiness, lifecycle, execution, aggregation.
// Purpose: Drive suites against live container instances.
// Dependencies: tokio, crate::{core, events, interfaces}
// ============================================================================

//! ## Overview
//! The runtime owns everything that happens between registration and the
//! final verdict: leasing host ports, starting and probing instances, running
//! cases in isolation, and summarizing the recorded outcomes.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod lifecycle;
pub mod ports;
pub mod readiness;
pub mod runner;
pub mod summary;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use lifecycle::DEFAULT_INSTANCE_HOST;
pub use lifecycle::DefaultSetup;
pub use lifecycle::DefaultTeardown;
pub use lifecycle::ImageResolver;
pub use lifecycle::InstanceHandle;
pub use lifecycle::LifecycleManager;
pub use lifecycle::PORT_ENV_VAR;
pub use ports::DEFAULT_PORT_ATTEMPTS;
pub use ports::PortAllocator;
pub use ports::PortLease;
pub use readiness::ReadinessPolicy;
pub use readiness::ReadinessProber;
pub use readiness::TcpConnectCheck;
pub use runner::CaseSelection;
pub use runner::NOT_SELECTED;
pub use runner::RunError;
pub use runner::RunOptions;
pub use runner::Runner;
pub use summary::EXIT_FAILED;
pub use summary::EXIT_PASSED;
pub use summary::RunSummary;
pub use summary::overall_status;
pub use summary::render_json;
pub use summary::summarize;
