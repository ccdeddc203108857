// crates/invoker-tck-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Fake container engine and case builders for runtime tests.
// Purpose: Exercise the execution engine without a container runtime.
// Dependencies: invoker-tck-core, tokio
// ============================================================================

//! ## Overview
//! The fake engine records every call and, when started, listens on the
//! container's published host port so readiness probing sees a real socket.
//! Behavior switches inject failures at each engine step.

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

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use invoker_tck_core::ContainerEngine;
use invoker_tck_core::ContainerId;
use invoker_tck_core::ContainerSpec;
use invoker_tck_core::DefaultTeardown;
use invoker_tck_core::EngineError;
use invoker_tck_core::ImageRef;
use invoker_tck_core::InstanceHandle;
use invoker_tck_core::LifecycleManager;
use invoker_tck_core::MemoryEventSink;
use invoker_tck_core::PortAllocator;
use invoker_tck_core::ReadinessPolicy;
use invoker_tck_core::ReadinessProber;
use invoker_tck_core::RunOptions;
use invoker_tck_core::Runner;
use invoker_tck_core::SetupError;
use invoker_tck_core::SetupRequest;
use invoker_tck_core::SetupStrategy;
use invoker_tck_core::TeardownError;
use invoker_tck_core::TeardownStrategy;
use invoker_tck_core::VerificationFailure;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

// ============================================================================
// SECTION: Fake Engine
// ============================================================================

/// Failure injection switches for [`FakeEngine`].
#[derive(Debug, Clone, Copy)]
pub struct FakeBehavior {
    pub fail_pull: bool,
    pub fail_create: bool,
    pub fail_start: bool,
    pub fail_stop: bool,
    /// Whether started containers accept connections.
    pub listen: bool,
}

impl Default for FakeBehavior {
    fn default() -> Self {
        Self {
            fail_pull: false,
            fail_create: false,
            fail_start: false,
            fail_stop: false,
            listen: true,
        }
    }
}

#[derive(Default)]
struct FakeState {
    next_id: u32,
    specs: BTreeMap<String, ContainerSpec>,
    created: Vec<ContainerSpec>,
    listeners: BTreeMap<String, JoinHandle<()>>,
    calls: Vec<String>,
}

/// In-memory container engine.
pub struct FakeEngine {
    behavior: FakeBehavior,
    state: Mutex<FakeState>,
}

impl FakeEngine {
    pub fn new(behavior: FakeBehavior) -> Self {
        Self {
            behavior,
            state: Mutex::new(FakeState::default()),
        }
    }

    /// Returns the engine calls in order (`op:argument`).
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Returns the specs of containers that were created and not yet removed.
    pub fn live_specs(&self) -> Vec<ContainerSpec> {
        self.state.lock().unwrap().specs.values().cloned().collect()
    }

    /// Returns every spec passed to `create`, in order.
    pub fn created_specs(&self) -> Vec<ContainerSpec> {
        self.state.lock().unwrap().created.clone()
    }

    /// Counts recorded calls starting with `op:`.
    pub fn count(&self, op: &str) -> usize {
        let prefix = format!("{op}:");
        self.calls().iter().filter(|call| call.starts_with(&prefix)).count()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl ContainerEngine for FakeEngine {
    async fn pull(&self, image: &ImageRef) -> Result<(), EngineError> {
        self.record(format!("pull:{image}"));
        if self.behavior.fail_pull {
            return Err(EngineError::Backend(format!("manifest for {image} not found")));
        }
        Ok(())
    }

    async fn create(&self, spec: &ContainerSpec) -> Result<ContainerId, EngineError> {
        if self.behavior.fail_create {
            self.record("create:rejected".to_string());
            return Err(EngineError::Backend("create rejected".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("fake-{}", state.next_id);
        state.calls.push(format!("create:{id}"));
        state.specs.insert(id.clone(), spec.clone());
        state.created.push(spec.clone());
        Ok(ContainerId::new(id))
    }

    async fn start(&self, id: &ContainerId) -> Result<(), EngineError> {
        self.record(format!("start:{id}"));
        if self.behavior.fail_start {
            return Err(EngineError::Backend("start rejected".to_string()));
        }
        let spec = self
            .state
            .lock()
            .unwrap()
            .specs
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| EngineError::UnknownContainer(id.clone()))?;
        if self.behavior.listen {
            let listener = TcpListener::bind(("127.0.0.1", spec.host_port))
                .await
                .map_err(|err| EngineError::Backend(err.to_string()))?;
            let accept = tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    drop(stream);
                }
            });
            self.state.lock().unwrap().listeners.insert(id.as_str().to_string(), accept);
        }
        Ok(())
    }

    async fn stop(&self, id: &ContainerId) -> Result<(), EngineError> {
        self.record(format!("stop:{id}"));
        if let Some(listener) = self.state.lock().unwrap().listeners.remove(id.as_str()) {
            listener.abort();
        }
        if self.behavior.fail_stop {
            return Err(EngineError::Backend("stop rejected".to_string()));
        }
        Ok(())
    }

    async fn remove(&self, id: &ContainerId) -> Result<(), EngineError> {
        self.record(format!("remove:{id}"));
        let mut state = self.state.lock().unwrap();
        if let Some(listener) = state.listeners.remove(id.as_str()) {
            listener.abort();
        }
        state
            .specs
            .remove(id.as_str())
            .map(|_| ())
            .ok_or_else(|| EngineError::UnknownContainer(id.clone()))
    }
}

// ============================================================================
// SECTION: Harness
// ============================================================================

/// Readiness policy that keeps tests fast.
pub fn fast_policy() -> ReadinessPolicy {
    ReadinessPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        settle_delay: Duration::ZERO,
        connect_timeout: Duration::from_millis(200),
    }
}

/// Fake engine wired into a lifecycle manager with an in-memory event sink.
pub struct Harness {
    pub engine: Arc<FakeEngine>,
    pub events: Arc<MemoryEventSink>,
    pub lifecycle: Arc<LifecycleManager>,
}

impl Harness {
    pub fn new(behavior: FakeBehavior) -> Self {
        let engine = Arc::new(FakeEngine::new(behavior));
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

    pub fn runner(&self, options: RunOptions) -> Runner {
        Runner::new(Arc::clone(&self.lifecycle), options)
    }
}

// ============================================================================
// SECTION: Strategies and Procedures
// ============================================================================

/// Teardown that counts invocations before delegating to the default.
#[derive(Default)]
pub struct CountingTeardown {
    pub calls: AtomicUsize,
}

impl CountingTeardown {
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TeardownStrategy for CountingTeardown {
    async fn teardown(
        &self,
        lifecycle: &LifecycleManager,
        handle: InstanceHandle,
    ) -> Result<(), TeardownError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        DefaultTeardown.teardown(lifecycle, handle).await
    }
}

/// Setup strategy that panics before touching the engine.
pub struct PanickingSetup;

#[async_trait]
impl SetupStrategy for PanickingSetup {
    async fn setup(
        &self,
        _lifecycle: &LifecycleManager,
        request: &SetupRequest,
    ) -> Result<InstanceHandle, SetupError> {
        panic!("no port convention for {}", request.case)
    }
}

/// Teardown strategy that panics and leaves the instance running.
pub struct PanickingTeardown;

#[async_trait]
impl TeardownStrategy for PanickingTeardown {
    async fn teardown(
        &self,
        _lifecycle: &LifecycleManager,
        handle: InstanceHandle,
    ) -> Result<(), TeardownError> {
        panic!("cannot stop {}", handle.container())
    }
}

pub async fn pass(_port: u16) -> Result<(), VerificationFailure> {
    Ok(())
}

pub async fn fail(_port: u16) -> Result<(), VerificationFailure> {
    Err(VerificationFailure::new("Expected http status 200, got 404"))
}

pub async fn explode(_port: u16) -> Result<(), VerificationFailure> {
    panic!("The function should only be exposed on /")
}

pub async fn hang(_port: u16) -> Result<(), VerificationFailure> {
    tokio::time::sleep(Duration::from_secs(3_600)).await;
    Ok(())
}

/// Blocks its worker thread for 300 ms, then passes.
pub async fn block_briefly(_port: u16) -> Result<(), VerificationFailure> {
    std::thread::sleep(Duration::from_millis(300));
    Ok(())
}

/// Blocks its worker thread for 3 s without yielding, then passes.
pub async fn block_long(_port: u16) -> Result<(), VerificationFailure> {
    std::thread::sleep(Duration::from_secs(3));
    Ok(())
}

/// Connects to the instance, proving verification runs after readiness.
pub async fn connect(port: u16) -> Result<(), VerificationFailure> {
    tokio::net::TcpStream::connect(("127.0.0.1", port))
        .await
        .map(|_| ())
        .map_err(|err| VerificationFailure::with_context("connect", err))
}
