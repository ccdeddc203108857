// crates/invoker-tck-core/src/runtime/lifecycle.rs
// ============================================================================
// Module: Instance Lifecycle
// Description: Image acquisition, container start/stop, and default strategies.
// Purpose: Own every container started for a case from creation to removal.
// Dependencies: async-trait, crate::interfaces, crate::runtime::{ports, readiness}
// ============================================================================

//! ## Overview
//! The [`LifecycleManager`] wraps a [`ContainerEngine`] with the port
//! allocator and readiness prober. It exposes the individual steps (acquire,
//! allocate, start, wait, stop) so custom strategies can recombine them, and
//! provides [`DefaultSetup`] and [`DefaultTeardown`] as the strategies bound to
//! cases that do not override them.
//!
//! Instance handles own their port lease and are consumed by teardown, so a
//! handle cannot outlive its case or be reused by another case.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::ContainerId;
use crate::core::ImageRef;
use crate::events::NoopEventSink;
use crate::events::TckEventKind;
use crate::events::TckEventSink;
use crate::interfaces::ContainerEngine;
use crate::interfaces::ContainerSpec;
use crate::interfaces::SetupError;
use crate::interfaces::SetupRequest;
use crate::interfaces::SetupStrategy;
use crate::interfaces::TeardownError;
use crate::interfaces::TeardownStrategy;
use crate::runtime::ports::PortAllocator;
use crate::runtime::ports::PortLease;
use crate::runtime::readiness::ReadinessProber;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable carrying the port the candidate must listen on.
pub const PORT_ENV_VAR: &str = "PORT";
/// Host name used to reach published ports.
pub const DEFAULT_INSTANCE_HOST: &str = "localhost";

// ============================================================================
// SECTION: Instance Handle
// ============================================================================

/// Live container started for exactly one case.
///
/// # Invariants
/// - The host port lease is held until the handle is stopped or dropped.
#[derive(Debug)]
pub struct InstanceHandle {
    /// Engine-assigned container identifier.
    container: ContainerId,
    /// Image the container runs.
    image: ImageRef,
    /// Host name used to reach the published port.
    host: String,
    /// Leased host port.
    lease: PortLease,
}

impl InstanceHandle {
    /// Returns the container identifier.
    #[must_use]
    pub const fn container(&self) -> &ContainerId {
        &self.container
    }

    /// Returns the image the container runs.
    #[must_use]
    pub const fn image(&self) -> &ImageRef {
        &self.image
    }

    /// Returns the published host port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.lease.port()
    }

    /// Returns the `host:port` address of the instance.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.lease.port())
    }
}

// ============================================================================
// SECTION: Image Resolution
// ============================================================================

/// Maps logical image names declared by cases to concrete references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageResolver {
    /// Logical name to concrete reference.
    mappings: BTreeMap<String, ImageRef>,
}

impl ImageResolver {
    /// Creates a resolver from explicit mappings.
    #[must_use]
    pub const fn new(mappings: BTreeMap<String, ImageRef>) -> Self {
        Self {
            mappings,
        }
    }

    /// Returns the concrete reference for `image`, or `image` itself when unmapped.
    #[must_use]
    pub fn resolve(&self, image: &ImageRef) -> ImageRef {
        self.mappings.get(image.as_str()).cloned().unwrap_or_else(|| image.clone())
    }
}

// ============================================================================
// SECTION: Lifecycle Manager
// ============================================================================

/// Coordinates container engine, port allocation, and readiness probing.
pub struct LifecycleManager {
    /// Container engine capability.
    engine: Arc<dyn ContainerEngine>,
    /// Host port allocator shared by every instance.
    ports: PortAllocator,
    /// Readiness prober.
    prober: ReadinessProber,
    /// Logical image mappings.
    images: ImageResolver,
    /// Host name used to reach published ports.
    host: String,
    /// Event sink.
    events: Arc<dyn TckEventSink>,
}

impl LifecycleManager {
    /// Creates a manager with no image mappings and a discarding event sink.
    #[must_use]
    pub fn new(
        engine: Arc<dyn ContainerEngine>,
        ports: PortAllocator,
        prober: ReadinessProber,
    ) -> Self {
        Self {
            engine,
            ports,
            prober,
            images: ImageResolver::default(),
            host: DEFAULT_INSTANCE_HOST.to_string(),
            events: Arc::new(NoopEventSink),
        }
    }

    /// Sets the logical image mappings.
    #[must_use]
    pub fn with_images(mut self, images: ImageResolver) -> Self {
        self.images = images;
        self
    }

    /// Sets the host name used to reach published ports.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn TckEventSink>) -> Self {
        self.events = events;
        self
    }

    /// Returns the event sink.
    #[must_use]
    pub fn events(&self) -> &dyn TckEventSink {
        self.events.as_ref()
    }

    /// Returns the port allocator.
    #[must_use]
    pub const fn ports(&self) -> &PortAllocator {
        &self.ports
    }

    /// Resolves a logical image name to a concrete reference.
    #[must_use]
    pub fn resolve_image(&self, image: &ImageRef) -> ImageRef {
        self.images.resolve(image)
    }

    /// Ensures the image is available locally.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::ImageUnavailable`] when the pull fails.
    pub async fn acquire(&self, image: &ImageRef) -> Result<(), SetupError> {
        self.engine.pull(image).await.map_err(|source| SetupError::ImageUnavailable {
            image: image.clone(),
            source,
        })?;
        self.events.emit(TckEventKind::ImagePulled {
            image: image.clone(),
        });
        Ok(())
    }

    /// Leases a free host port.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::PortExhaustion`] when no port is available.
    pub fn allocate_port(&self) -> Result<PortLease, SetupError> {
        let lease = self.ports.allocate()?;
        self.events.emit(TckEventKind::PortAllocated {
            port: lease.port(),
        });
        Ok(lease)
    }

    /// Creates and starts a container publishing `container_port` on the
    /// leased host port. A container that was created but failed to start is
    /// removed before returning.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::StartFailure`] when creation or start fails.
    pub async fn start_instance(
        &self,
        image: &ImageRef,
        lease: PortLease,
        container_port: u16,
        env: BTreeMap<String, String>,
    ) -> Result<InstanceHandle, SetupError> {
        let spec = ContainerSpec {
            image: image.clone(),
            host_port: lease.port(),
            container_port,
            env,
        };
        let container = self.engine.create(&spec).await.map_err(|source| {
            SetupError::StartFailure {
                image: image.clone(),
                source,
            }
        })?;
        if let Err(source) = self.engine.start(&container).await {
            if let Err(err) = self.engine.remove(&container).await {
                self.events.emit(TckEventKind::CleanupFailed {
                    container: container.clone(),
                    error: err.to_string(),
                });
            }
            return Err(SetupError::StartFailure {
                image: image.clone(),
                source,
            });
        }
        self.events.emit(TckEventKind::InstanceStarted {
            container: container.clone(),
            image: image.clone(),
            host_port: lease.port(),
            container_port,
        });
        Ok(InstanceHandle {
            container,
            image: image.clone(),
            host: self.host.clone(),
            lease,
        })
    }

    /// Blocks until the instance accepts connections.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::ReadinessTimeout`] when the attempt budget is spent.
    pub async fn wait_ready(&self, handle: &InstanceHandle) -> Result<(), SetupError> {
        self.prober
            .wait_ready(&handle.address(), self.prober.policy().max_attempts, self.events())
            .await
            .map(|_| ())
    }

    /// Stops and removes the container, then releases its port. Removal is
    /// attempted even when stopping fails.
    ///
    /// # Errors
    ///
    /// Returns [`TeardownError`] describing the first failed step.
    pub async fn stop(&self, handle: InstanceHandle) -> Result<(), TeardownError> {
        let InstanceHandle {
            container,
            lease,
            ..
        } = handle;
        let stopped = self.engine.stop(&container).await;
        let removed = self.engine.remove(&container).await;
        drop(lease);
        match (stopped, removed) {
            (Err(source), _) => Err(TeardownError::Stop {
                container,
                source,
            }),
            (Ok(()), Err(source)) => Err(TeardownError::Remove {
                container,
                source,
            }),
            (Ok(()), Ok(())) => {
                self.events.emit(TckEventKind::InstanceStopped {
                    container,
                });
                Ok(())
            }
        }
    }

    /// Stops an instance whose setup did not complete, logging failures.
    pub async fn discard(&self, handle: InstanceHandle) {
        let container = handle.container().clone();
        if let Err(err) = self.stop(handle).await {
            self.events.emit(TckEventKind::CleanupFailed {
                container,
                error: err.to_string(),
            });
        }
    }
}

// ============================================================================
// SECTION: Default Strategies
// ============================================================================

/// Default setup: pull, allocate, start with the port convention, wait ready.
///
/// The container port is the suite default unless pinned with
/// [`DefaultSetup::with_container_port`]; it is also passed to the candidate
/// through [`PORT_ENV_VAR`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultSetup {
    /// Container port override.
    container_port: Option<u16>,
}

impl DefaultSetup {
    /// Creates a setup strategy that always uses `container_port`.
    #[must_use]
    pub const fn with_container_port(container_port: u16) -> Self {
        Self {
            container_port: Some(container_port),
        }
    }
}

#[async_trait]
impl SetupStrategy for DefaultSetup {
    async fn setup(
        &self,
        lifecycle: &LifecycleManager,
        request: &SetupRequest,
    ) -> Result<InstanceHandle, SetupError> {
        lifecycle.acquire(&request.image).await?;
        let lease = lifecycle.allocate_port()?;
        let container_port = self.container_port.unwrap_or(request.default_port);
        let env = BTreeMap::from([(PORT_ENV_VAR.to_string(), container_port.to_string())]);
        let handle = lifecycle.start_instance(&request.image, lease, container_port, env).await?;
        if let Err(err) = lifecycle.wait_ready(&handle).await {
            lifecycle.discard(handle).await;
            return Err(err);
        }
        Ok(handle)
    }
}

/// Default teardown: stop and remove the container unconditionally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultTeardown;

#[async_trait]
impl TeardownStrategy for DefaultTeardown {
    async fn teardown(
        &self,
        lifecycle: &LifecycleManager,
        handle: InstanceHandle,
    ) -> Result<(), TeardownError> {
        lifecycle.stop(handle).await
    }
}
