// system-tests/src/config.rs
// ============================================================================
// Module: System Test Configuration
// Description: Settings for the Docker-backed system tests.
// Purpose: Name the candidate image and decide whether missing Docker is fatal.
// Dependencies: invoker-tck-config
// ============================================================================

//! ## Overview
//! Docker-backed scenarios need a real candidate image, which only the
//! environment can supply. Values are read with the same strict rules as the
//! kit's own overrides: invalid UTF-8 and blank values fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use invoker_tck_config::env::parse_flag;
use invoker_tck_config::env::parse_positive;
use invoker_tck_config::env::read_env_strict;
use invoker_tck_config::env::read_nonempty;

// ============================================================================
// SECTION: Environment Keys
// ============================================================================

/// Environment keys read by the system tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemTestEnv {
    /// Image reference of the candidate exercised under Docker.
    Image,
    /// Per-verification timeout in seconds.
    TimeoutSeconds,
    /// Fail instead of skipping when Docker is unavailable.
    RequireDocker,
}

impl SystemTestEnv {
    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "INVOKER_TCK_SYSTEM_TEST_IMAGE",
            Self::TimeoutSeconds => "INVOKER_TCK_SYSTEM_TEST_TIMEOUT_SEC",
            Self::RequireDocker => "INVOKER_TCK_SYSTEM_TEST_REQUIRE_DOCKER",
        }
    }
}

// ============================================================================
// SECTION: Config
// ============================================================================

/// System test settings. Docker scenarios are skipped when `image` is unset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SystemTestConfig {
    /// Candidate image for Docker-backed runs.
    pub image: Option<String>,
    /// Per-verification timeout.
    pub timeout: Option<Duration>,
    /// Fail instead of skipping when Docker is unavailable.
    pub require_docker: bool,
}

impl SystemTestConfig {
    /// Reads the settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a message when a value is not valid UTF-8, is blank, or fails
    /// to parse.
    pub fn load() -> Result<Self, String> {
        Self::from_lookup(read_env_strict)
    }

    /// Reads the settings through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns a message when a value is blank or fails to parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Result<Option<String>, String>,
    {
        let read = |key: SystemTestEnv| read_nonempty(&lookup, key.as_str());
        let image = read(SystemTestEnv::Image)?.map(|value| value.trim().to_string());
        let timeout = read(SystemTestEnv::TimeoutSeconds)?
            .map(|raw| parse_positive(SystemTestEnv::TimeoutSeconds.as_str(), &raw))
            .transpose()?
            .map(Duration::from_secs);
        let require_docker = read(SystemTestEnv::RequireDocker)?
            .map(|raw| parse_flag(SystemTestEnv::RequireDocker.as_str(), &raw))
            .transpose()?
            .unwrap_or(false);
        Ok(Self {
            image,
            timeout,
            require_docker,
        })
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
