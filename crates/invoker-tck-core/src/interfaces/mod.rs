// crates/invoker-tck-core/src/interfaces/mod.rs
// ============================================================================
// Module: Invoker TCK Interfaces
// Description: Backend-agnostic interfaces for containers, strategies, and probes.
// Purpose: Define the contract surfaces used by the execution engine.
// Dependencies: async-trait, thiserror, crate::core, crate::runtime
// ============================================================================

//! ## Overview
//! Interfaces define how the kit integrates with external systems without
//! embedding backend-specific details. The container engine, the per-case
//! setup/teardown strategies, the verification procedure, and the readiness
//! connectivity check are all trait seams so suites and tests can substitute
//! their own behavior.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::CaseName;
use crate::core::ContainerId;
use crate::core::FailureKind;
use crate::core::ImageRef;
use crate::runtime::InstanceHandle;
use crate::runtime::LifecycleManager;

// ============================================================================
// SECTION: Container Engine
// ============================================================================

/// Request to create a container with a single published port.
///
/// # Invariants
/// - `host_port` is leased from the port allocator for the container lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Image to run.
    pub image: ImageRef,
    /// Host port the container port is published on.
    pub host_port: u16,
    /// Port exposed by the container.
    pub container_port: u16,
    /// Environment variables passed to the candidate process.
    pub env: BTreeMap<String, String>,
}

/// Container engine errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine itself cannot be reached.
    #[error("container engine unavailable: {0}")]
    Unavailable(String),
    /// The referenced container is unknown to the engine.
    #[error("unknown container: {0}")]
    UnknownContainer(ContainerId),
    /// The engine reported an error.
    #[error("container engine error: {0}")]
    Backend(String),
}

/// Container engine capability consumed by the lifecycle manager.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Ensures the image is present locally, fetching it when absent.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the image cannot be fetched.
    async fn pull(&self, image: &ImageRef) -> Result<(), EngineError>;

    /// Creates a container for the given spec without starting it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the container cannot be created.
    async fn create(&self, spec: &ContainerSpec) -> Result<ContainerId, EngineError>;

    /// Starts a previously created container.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the container cannot be started.
    async fn start(&self, id: &ContainerId) -> Result<(), EngineError>;

    /// Stops a running container.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the container cannot be stopped.
    async fn stop(&self, id: &ContainerId) -> Result<(), EngineError>;

    /// Removes a container.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the container cannot be removed.
    async fn remove(&self, id: &ContainerId) -> Result<(), EngineError>;
}

// ============================================================================
// SECTION: Setup / Teardown Strategies
// ============================================================================

/// Inputs handed to a setup strategy for one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupRequest {
    /// Case being set up.
    pub case: CaseName,
    /// Concrete image to run (after logical name resolution).
    pub image: ImageRef,
    /// Suite default port, used as the container port unless overridden.
    pub default_port: u16,
}

/// Setup-phase errors. Any of these is terminal for the case.
///
/// # Invariants
/// - Variants map one-to-one onto setup [`FailureKind`]s.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The image could not be made available locally.
    #[error("image {image} unavailable: {source}")]
    ImageUnavailable {
        /// Image that failed to pull.
        image: ImageRef,
        /// Underlying engine error.
        #[source]
        source: EngineError,
    },
    /// No free host port could be reserved.
    #[error("no free host port after {attempts} attempts: {reason}")]
    PortExhaustion {
        /// Bind attempts made.
        attempts: u32,
        /// Last observed failure.
        reason: String,
    },
    /// The container could not be created or started.
    #[error("failed to start container for {image}: {source}")]
    StartFailure {
        /// Image being started.
        image: ImageRef,
        /// Underlying engine error.
        #[source]
        source: EngineError,
    },
    /// The instance never accepted connections.
    #[error("instance at {address} not ready after {attempts} attempts: {reason}")]
    ReadinessTimeout {
        /// Address that was probed.
        address: String,
        /// Connection attempts made.
        attempts: u32,
        /// Last connectivity error.
        reason: String,
    },
}

impl SetupError {
    /// Returns the failure classification recorded on the case outcome.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::ImageUnavailable {
                ..
            } => FailureKind::ImageUnavailable,
            Self::PortExhaustion {
                ..
            } => FailureKind::PortExhaustion,
            Self::StartFailure {
                ..
            } => FailureKind::StartFailure,
            Self::ReadinessTimeout {
                ..
            } => FailureKind::ReadinessTimeout,
        }
    }
}

/// Teardown errors. Logged by the runner, never part of a case verdict.
#[derive(Debug, Error)]
pub enum TeardownError {
    /// The container could not be stopped.
    #[error("failed to stop container {container}: {source}")]
    Stop {
        /// Container being stopped.
        container: ContainerId,
        /// Underlying engine error.
        #[source]
        source: EngineError,
    },
    /// The container could not be removed.
    #[error("failed to remove container {container}: {source}")]
    Remove {
        /// Container being removed.
        container: ContainerId,
        /// Underlying engine error.
        #[source]
        source: EngineError,
    },
}

/// Produces a ready instance for a case.
#[async_trait]
pub trait SetupStrategy: Send + Sync {
    /// Acquires the image, starts an instance, and waits until it is ready.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] when any setup step fails. Implementations must
    /// not leave a started container behind when they return an error.
    async fn setup(
        &self,
        lifecycle: &LifecycleManager,
        request: &SetupRequest,
    ) -> Result<InstanceHandle, SetupError>;
}

/// Disposes of an instance once its case has concluded.
#[async_trait]
pub trait TeardownStrategy: Send + Sync {
    /// Tears the instance down. The handle is consumed so it cannot be reused.
    ///
    /// # Errors
    ///
    /// Returns [`TeardownError`] when cleanup fails.
    async fn teardown(
        &self,
        lifecycle: &LifecycleManager,
        handle: InstanceHandle,
    ) -> Result<(), TeardownError>;
}

// ============================================================================
// SECTION: Verification Procedure
// ============================================================================

/// Failure raised by a verification procedure, carrying a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct VerificationFailure {
    /// Human-readable diagnostic.
    message: String,
}

impl VerificationFailure {
    /// Creates a failure with the given diagnostic.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Wraps an underlying error with a short context label.
    #[must_use]
    pub fn with_context(context: &str, error: impl fmt::Display) -> Self {
        Self::new(format!("{context}: {error}"))
    }

    /// Returns the diagnostic message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for VerificationFailure {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for VerificationFailure {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Boxed future returned by verification procedures.
pub type VerificationFuture =
    Pin<Box<dyn Future<Output = Result<(), VerificationFailure>> + Send + 'static>>;

/// Verification procedure run against a ready instance.
///
/// Any `Fn(u16) -> impl Future<Output = Result<(), VerificationFailure>>`
/// (including plain `async fn`s taking the port) implements this trait.
pub trait Verification: Send + Sync {
    /// Verifies the instance reachable on `port` of the local host.
    fn verify(&self, port: u16) -> VerificationFuture;
}

impl<F, Fut> Verification for F
where
    F: Fn(u16) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), VerificationFailure>> + Send + 'static,
{
    fn verify(&self, port: u16) -> VerificationFuture {
        Box::pin(self(port))
    }
}

// ============================================================================
// SECTION: Connectivity Check
// ============================================================================

/// Single connectivity attempt used by the readiness prober.
#[async_trait]
pub trait ConnectivityCheck: Send + Sync {
    /// Attempts to reach `address` once.
    ///
    /// # Errors
    ///
    /// Returns a diagnostic string when the address is not reachable.
    async fn check(&self, address: &str) -> Result<(), String>;
}
