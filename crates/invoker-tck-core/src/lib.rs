// crates/invoker-tck-core/src/lib.rs
// ============================================================================
// Module: Invoker TCK Core Library
// Description: Public API surface for the conformance kit execution engine.
// Purpose: Expose the model, interfaces, event sinks, and runtime.
// Dependencies: crate::{core, events, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Invoker TCK core runs declarative conformance cases against candidate
//! services packaged as container images. Each case gets a freshly started,
//! readiness-gated instance that is torn down once the case concludes, and
//! the recorded outcomes distinguish mandatory from optional requirements.
//! Container engines, setup/teardown strategies, and verification procedures
//! are integrated through explicit interfaces.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod events;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use events::FileEventSink;
pub use events::MemoryEventSink;
pub use events::NoopEventSink;
pub use events::StderrEventSink;
pub use events::TckEvent;
pub use events::TckEventKind;
pub use events::TckEventSink;
pub use interfaces::ConnectivityCheck;
pub use interfaces::ContainerEngine;
pub use interfaces::ContainerSpec;
pub use interfaces::EngineError;
pub use interfaces::SetupError;
pub use interfaces::SetupRequest;
pub use interfaces::SetupStrategy;
pub use interfaces::TeardownError;
pub use interfaces::TeardownStrategy;
pub use interfaces::Verification;
pub use interfaces::VerificationFailure;
pub use interfaces::VerificationFuture;
pub use runtime::CaseSelection;
pub use runtime::DefaultSetup;
pub use runtime::DefaultTeardown;
pub use runtime::ImageResolver;
pub use runtime::InstanceHandle;
pub use runtime::LifecycleManager;
pub use runtime::PortAllocator;
pub use runtime::PortLease;
pub use runtime::ReadinessPolicy;
pub use runtime::ReadinessProber;
pub use runtime::RunError;
pub use runtime::RunOptions;
pub use runtime::RunSummary;
pub use runtime::Runner;
