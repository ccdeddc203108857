// crates/invoker-tck-suites/src/strategies.rs
// ============================================================================
// Module: Custom Setup Strategies
// Description: Setup overrides shared by suite cases.
// Purpose: Start candidates on an explicit container port announced via env.
// Dependencies: async-trait, invoker-tck-core
// ============================================================================

//! ## Overview
//! [`PortEnvVarSetup`] pins the container port instead of using the suite
//! default and announces it through an environment variable (`PORT` unless
//! renamed). It is composed from the lifecycle manager's individual steps and,
//! like the default strategy, leaves nothing running when it fails.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use async_trait::async_trait;
use invoker_tck_core::InstanceHandle;
use invoker_tck_core::LifecycleManager;
use invoker_tck_core::SetupError;
use invoker_tck_core::SetupRequest;
use invoker_tck_core::SetupStrategy;
use invoker_tck_core::runtime::PORT_ENV_VAR;

// ============================================================================
// SECTION: Strategy
// ============================================================================

/// Setup that starts the candidate on a fixed container port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortEnvVarSetup {
    /// Container port the candidate must listen on.
    container_port: u16,
    /// Environment variable carrying the port.
    env_var: String,
    /// Extra environment passed to the candidate.
    extra_env: BTreeMap<String, String>,
}

impl PortEnvVarSetup {
    /// Creates a strategy announcing `container_port` through `PORT`.
    #[must_use]
    pub fn new(container_port: u16) -> Self {
        Self {
            container_port,
            env_var: PORT_ENV_VAR.to_string(),
            extra_env: BTreeMap::new(),
        }
    }

    /// Announces the port through `name` instead of `PORT`.
    #[must_use]
    pub fn with_env_var(mut self, name: impl Into<String>) -> Self {
        self.env_var = name.into();
        self
    }

    /// Adds an environment variable passed to the candidate.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_env.insert(key.into(), value.into());
        self
    }

    /// Returns the container port.
    #[must_use]
    pub const fn container_port(&self) -> u16 {
        self.container_port
    }

    /// Builds the container environment; the port variable wins on conflict.
    fn environment(&self) -> BTreeMap<String, String> {
        let mut env = self.extra_env.clone();
        env.insert(self.env_var.clone(), self.container_port.to_string());
        env
    }
}

#[async_trait]
impl SetupStrategy for PortEnvVarSetup {
    async fn setup(
        &self,
        lifecycle: &LifecycleManager,
        request: &SetupRequest,
    ) -> Result<InstanceHandle, SetupError> {
        lifecycle.acquire(&request.image).await?;
        let lease = lifecycle.allocate_port()?;
        let handle = lifecycle
            .start_instance(&request.image, lease, self.container_port, self.environment())
            .await?;
        if let Err(err) = lifecycle.wait_ready(&handle).await {
            lifecycle.discard(handle).await;
            return Err(err);
        }
        Ok(handle)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
