// system-tests/tests/common/mod.rs
// ============================================================================
// Module: Common System Test Fixtures
// Description: Runtime wiring around the in-process engine.
// Purpose: Build lifecycle managers and runners for end-to-end scenarios.
// Dependencies: invoker-tck-core, system-tests, tokio
// ============================================================================

//! ## Overview
//! [`Stack`] wires an [`InProcessEngine`] into a lifecycle manager with fast
//! readiness probing and an in-memory event sink. [`serve`] binds a single
//! candidate for calling verification procedures directly.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::unwrap_in_result,
    reason = "Test fixtures favor direct unwraps for setup clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use invoker_tck_core::LifecycleManager;
use invoker_tck_core::MemoryEventSink;
use invoker_tck_core::PortAllocator;
use invoker_tck_core::ReadinessPolicy;
use invoker_tck_core::ReadinessProber;
use invoker_tck_core::RunOptions;
use invoker_tck_core::Runner;
use invoker_tck_core::Suite;
use invoker_tck_core::SuiteReport;
use system_tests::candidate::Candidate;
use system_tests::candidate::CandidateServer;
use system_tests::engine::InProcessEngine;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Readiness policy sized for in-process candidates.
pub fn fast_policy() -> ReadinessPolicy {
    ReadinessPolicy {
        max_attempts: 5,
        base_delay: Duration::from_millis(5),
        settle_delay: Duration::ZERO,
        connect_timeout: Duration::from_millis(500),
    }
}

/// In-process engine wired into a lifecycle manager.
pub struct Stack {
    pub engine: Arc<InProcessEngine>,
    pub events: Arc<MemoryEventSink>,
    pub lifecycle: Arc<LifecycleManager>,
}

impl Stack {
    pub fn new(engine: InProcessEngine) -> Self {
        let engine = Arc::new(engine);
        let events = Arc::new(MemoryEventSink::new());
        let lifecycle = LifecycleManager::new(
            engine.clone(),
            PortAllocator::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8),
            ReadinessProber::new(fast_policy()),
        )
        .with_host("127.0.0.1")
        .with_events(events.clone());
        Self {
            engine,
            events,
            lifecycle: Arc::new(lifecycle),
        }
    }

    /// Stack serving `candidate` as the `upper` image.
    pub fn upper(candidate: Candidate) -> Self {
        Self::new(InProcessEngine::new().with_image("upper", candidate))
    }

    pub async fn run(&self, suites: &[Suite], options: RunOptions) -> Vec<SuiteReport> {
        Runner::new(Arc::clone(&self.lifecycle), options).run_all(suites).await.unwrap()
    }
}

/// Binds `candidate` to an ephemeral loopback port.
pub async fn serve(candidate: Candidate) -> CandidateServer {
    CandidateServer::bind(candidate, SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0))
        .await
        .unwrap()
}
