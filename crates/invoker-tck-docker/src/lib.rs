// crates/invoker-tck-docker/src/lib.rs
// ============================================================================
// Module: Docker Container Engine
// Description: ContainerEngine implementation backed by testcontainers.
// Purpose: Run candidate images under a local Docker daemon.
// Dependencies: async-trait, invoker-tck-core, testcontainers, tokio
// ============================================================================

//! ## Overview
//! testcontainers creates and starts a container in one call, so `create`
//! records a pending request under an engine-assigned container name and
//! `start` materializes it. The container name doubles as the
//! [`ContainerId`] handed back to the lifecycle manager. Containers still held
//! when the engine is dropped are removed by testcontainers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::process::Command;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use invoker_tck_core::ContainerEngine;
use invoker_tck_core::ContainerId;
use invoker_tck_core::ContainerSpec;
use invoker_tck_core::EngineError;
use invoker_tck_core::ImageRef;
use testcontainers::ContainerAsync;
use testcontainers::ContainerRequest;
use testcontainers::GenericImage;
use testcontainers::ImageExt;
use testcontainers::core::IntoContainerPort;
use testcontainers::runners::AsyncRunner;
use tokio::sync::Mutex;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Prefix of every container name assigned by the engine.
pub const CONTAINER_NAME_PREFIX: &str = "invoker-tck";

// ============================================================================
// SECTION: Availability
// ============================================================================

/// Checks that a Docker daemon answers `docker info`.
///
/// # Errors
///
/// Returns [`EngineError::Unavailable`] when the CLI is missing or the daemon
/// is unreachable.
pub fn ensure_docker_available() -> Result<(), EngineError> {
    let output = Command::new("docker")
        .arg("info")
        .output()
        .map_err(|err| EngineError::Unavailable(format!("docker info failed: {err}")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(EngineError::Unavailable(format!("docker info failed: {}", stderr.trim())));
    }
    Ok(())
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Container tracked by the engine.
enum Slot {
    /// Created but not yet started.
    Pending(Box<ContainerRequest<GenericImage>>),
    /// Running under Docker.
    Running(ContainerAsync<GenericImage>),
}

/// Docker-backed container engine.
///
/// # Invariants
/// - Container names are unique per engine and carry the process id.
/// - The slot table lock is never held across a Docker call; a container is
///   checked out for the duration of its start or stop.
pub struct TestcontainersEngine {
    /// Distinguishes engines within a process run.
    run_tag: String,
    /// Monotonic container counter.
    sequence: AtomicU64,
    /// Containers by name.
    slots: Mutex<BTreeMap<String, Slot>>,
}

impl TestcontainersEngine {
    /// Creates an engine. Docker is contacted lazily.
    #[must_use]
    pub fn new() -> Self {
        let millis = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            run_tag: format!("{}-{millis}", std::process::id()),
            sequence: AtomicU64::new(0),
            slots: Mutex::new(BTreeMap::new()),
        }
    }

    /// Returns the number of containers currently tracked.
    pub async fn tracked(&self) -> usize {
        self.slots.lock().await.len()
    }

    /// Takes a container out of the table so Docker calls run without the lock.
    async fn checkout(&self, id: &ContainerId) -> Result<Slot, EngineError> {
        self.slots
            .lock()
            .await
            .remove(id.as_str())
            .ok_or_else(|| EngineError::UnknownContainer(id.clone()))
    }

    /// Returns a container taken with [`Self::checkout`].
    async fn checkin(&self, id: &ContainerId, slot: Slot) {
        self.slots.lock().await.insert(id.as_str().to_string(), slot);
    }

    /// Assigns the next container name.
    fn next_name(&self) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{CONTAINER_NAME_PREFIX}-{}-{sequence}", self.run_tag)
    }
}

impl Default for TestcontainersEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the generic image for a reference.
fn generic_image(image: &ImageRef) -> GenericImage {
    GenericImage::new(image.repository(), image.tag())
}

#[async_trait]
impl ContainerEngine for TestcontainersEngine {
    async fn pull(&self, image: &ImageRef) -> Result<(), EngineError> {
        generic_image(image)
            .pull_image()
            .await
            .map(|_| ())
            .map_err(|err| EngineError::Backend(err.to_string()))
    }

    async fn create(&self, spec: &ContainerSpec) -> Result<ContainerId, EngineError> {
        let name = self.next_name();
        let mut request = generic_image(&spec.image)
            .with_container_name(name.clone())
            .with_mapped_port(spec.host_port, spec.container_port.tcp());
        for (key, value) in &spec.env {
            request = request.with_env_var(key.clone(), value.clone());
        }
        self.slots.lock().await.insert(name.clone(), Slot::Pending(Box::new(request)));
        Ok(ContainerId::new(name))
    }

    async fn start(&self, id: &ContainerId) -> Result<(), EngineError> {
        let request = match self.checkout(id).await? {
            Slot::Pending(request) => request,
            running @ Slot::Running(_) => {
                self.checkin(id, running).await;
                return Ok(());
            }
        };
        let container =
            (*request).start().await.map_err(|err| EngineError::Backend(err.to_string()))?;
        self.checkin(id, Slot::Running(container)).await;
        Ok(())
    }

    async fn stop(&self, id: &ContainerId) -> Result<(), EngineError> {
        let slot = self.checkout(id).await?;
        let stopped = match &slot {
            Slot::Running(container) => {
                container.stop().await.map_err(|err| EngineError::Backend(err.to_string()))
            }
            Slot::Pending(_) => Ok(()),
        };
        self.checkin(id, slot).await;
        stopped
    }

    async fn remove(&self, id: &ContainerId) -> Result<(), EngineError> {
        let slot = self.slots.lock().await.remove(id.as_str());
        match slot {
            Some(Slot::Running(container)) => {
                container.rm().await.map_err(|err| EngineError::Backend(err.to_string()))
            }
            Some(Slot::Pending(_)) => Ok(()),
            None => Err(EngineError::UnknownContainer(id.clone())),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
