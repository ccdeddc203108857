// system-tests/src/engine.rs
// ============================================================================
// Module: In-Process Container Engine
// Description: ContainerEngine that serves reference candidates in-process.
// Purpose: Drive the real runner and suites without a container runtime.
// Dependencies: async-trait, invoker-tck-core, tokio
// ============================================================================

//! ## Overview
//! Images are registered against a [`Candidate`]. Starting a container binds
//! the candidate to the published host port, mirroring a container that
//! listens on the port announced through its environment. A container whose
//! environment does not announce its container port starts but never
//! listens, like a real image that reads the wrong variable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::net::SocketAddr;

use async_trait::async_trait;
use invoker_tck_core::ContainerEngine;
use invoker_tck_core::ContainerId;
use invoker_tck_core::ContainerSpec;
use invoker_tck_core::EngineError;
use invoker_tck_core::ImageRef;
use invoker_tck_core::runtime::PORT_ENV_VAR;
use tokio::sync::Mutex;

use crate::candidate::Candidate;
use crate::candidate::CandidateServer;

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Mutable engine state.
#[derive(Default)]
struct EngineState {
    /// Next container sequence number.
    next_id: u64,
    /// Containers created and not yet removed.
    containers: BTreeMap<String, ContainerSpec>,
    /// Servers of started containers.
    servers: BTreeMap<String, CandidateServer>,
    /// Every spec passed to `create`, in order.
    history: Vec<ContainerSpec>,
}

/// Container engine backed by in-process candidates.
///
/// # Invariants
/// - At most one server is bound per container.
pub struct InProcessEngine {
    /// Registered images.
    images: BTreeMap<String, Candidate>,
    /// Variable a candidate reads its listening port from.
    port_env: String,
    /// Interface servers bind to.
    bind_host: IpAddr,
    /// Containers and servers.
    state: Mutex<EngineState>,
}

impl InProcessEngine {
    /// Creates an engine with no images, binding to the loopback interface.
    #[must_use]
    pub fn new() -> Self {
        Self {
            images: BTreeMap::new(),
            port_env: PORT_ENV_VAR.to_string(),
            bind_host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            state: Mutex::new(EngineState::default()),
        }
    }

    /// Registers `candidate` under the image reference `image`.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>, candidate: Candidate) -> Self {
        self.images.insert(image.into(), candidate);
        self
    }

    /// Makes candidates read their port from `name` instead of `PORT`.
    #[must_use]
    pub fn with_port_env(mut self, name: impl Into<String>) -> Self {
        self.port_env = name.into();
        self
    }

    /// Returns every spec passed to `create`, in order.
    pub async fn created_specs(&self) -> Vec<ContainerSpec> {
        self.state.lock().await.history.clone()
    }

    /// Returns the number of containers not yet removed.
    pub async fn live_count(&self) -> usize {
        self.state.lock().await.containers.len()
    }

    /// Returns the candidate registered for `image`.
    fn candidate(&self, image: &ImageRef) -> Result<Candidate, EngineError> {
        self.images
            .get(image.as_str())
            .copied()
            .ok_or_else(|| EngineError::Backend(format!("pull access denied for {image}")))
    }

    /// Returns true when the environment announces the container port.
    fn announces_port(&self, spec: &ContainerSpec) -> bool {
        spec.env.get(&self.port_env).is_some_and(|value| *value == spec.container_port.to_string())
    }
}

impl Default for InProcessEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContainerEngine for InProcessEngine {
    async fn pull(&self, image: &ImageRef) -> Result<(), EngineError> {
        self.candidate(image).map(|_| ())
    }

    async fn create(&self, spec: &ContainerSpec) -> Result<ContainerId, EngineError> {
        self.candidate(&spec.image)?;
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let id = format!("in-process-{}", state.next_id);
        state.containers.insert(id.clone(), spec.clone());
        state.history.push(spec.clone());
        Ok(ContainerId::new(id))
    }

    async fn start(&self, id: &ContainerId) -> Result<(), EngineError> {
        let mut state = self.state.lock().await;
        let spec = state
            .containers
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| EngineError::UnknownContainer(id.clone()))?;
        if state.servers.contains_key(id.as_str()) || !self.announces_port(&spec) {
            return Ok(());
        }
        let candidate = self.candidate(&spec.image)?;
        let server = CandidateServer::bind(candidate, SocketAddr::new(self.bind_host, spec.host_port))
            .await
            .map_err(|err| EngineError::Backend(format!("bind {}: {err}", spec.host_port)))?;
        state.servers.insert(id.as_str().to_string(), server);
        Ok(())
    }

    async fn stop(&self, id: &ContainerId) -> Result<(), EngineError> {
        let server = {
            let mut state = self.state.lock().await;
            if !state.containers.contains_key(id.as_str()) {
                return Err(EngineError::UnknownContainer(id.clone()));
            }
            state.servers.remove(id.as_str())
        };
        if let Some(server) = server {
            server.shutdown().await;
        }
        Ok(())
    }

    async fn remove(&self, id: &ContainerId) -> Result<(), EngineError> {
        let server = {
            let mut state = self.state.lock().await;
            if state.containers.remove(id.as_str()).is_none() {
                return Err(EngineError::UnknownContainer(id.clone()));
            }
            state.servers.remove(id.as_str())
        };
        if let Some(server) = server {
            server.shutdown().await;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only assertions favor direct unwrap for clarity.")]
mod tests {
    use std::collections::BTreeMap;

    use invoker_tck_core::ContainerEngine;
    use invoker_tck_core::ContainerSpec;
    use invoker_tck_core::EngineError;
    use invoker_tck_core::ImageRef;

    use super::InProcessEngine;
    use crate::candidate::Candidate;

    fn spec(image: &str) -> ContainerSpec {
        ContainerSpec {
            image: ImageRef::new(image),
            host_port: 0,
            container_port: 8080,
            env: BTreeMap::from([("PORT".to_string(), "8080".to_string())]),
        }
    }

    #[tokio::test]
    async fn unknown_images_fail_to_pull() {
        let engine = InProcessEngine::new().with_image("upper", Candidate::Compliant);
        engine.pull(&ImageRef::new("upper")).await.unwrap();
        let err = engine.pull(&ImageRef::new("lower")).await.unwrap_err();
        assert_eq!(err, EngineError::Backend("pull access denied for lower".to_string()));
    }

    #[tokio::test]
    async fn remove_forgets_the_container() {
        let engine = InProcessEngine::new().with_image("upper", Candidate::Compliant);
        let id = engine.create(&spec("upper")).await.unwrap();
        assert_eq!(engine.live_count().await, 1);
        engine.remove(&id).await.unwrap();
        assert_eq!(engine.live_count().await, 0);
        assert!(matches!(engine.stop(&id).await, Err(EngineError::UnknownContainer(_))));
        assert_eq!(engine.created_specs().await.len(), 1);
    }
}
