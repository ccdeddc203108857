// crates/invoker-tck-config/src/config.rs
// ============================================================================
// Module: TCK Configuration
// Description: TOML configuration model, loader, validation, and wiring.
// Purpose: Turn invoker-tck.toml into runtime components for the engine.
// Dependencies: invoker-tck-core, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! Configuration is resolved from an explicit path, then
//! `INVOKER_TCK_CONFIG`, then `invoker-tck.toml` in the working directory.
//! A missing default file yields built-in defaults; a missing explicit file is
//! an error. Every section is optional and unknown keys are rejected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use invoker_tck_core::CaseName;
use invoker_tck_core::CaseSelection;
use invoker_tck_core::FileEventSink;
use invoker_tck_core::ImageRef;
use invoker_tck_core::ImageResolver;
use invoker_tck_core::NoopEventSink;
use invoker_tck_core::PortAllocator;
use invoker_tck_core::ReadinessPolicy;
use invoker_tck_core::RunOptions;
use invoker_tck_core::StderrEventSink;
use invoker_tck_core::TckEventSink;
use serde::Deserialize;
use thiserror::Error;

use crate::env::EnvOverrides;
use crate::env::TckEnv;
use crate::env::read_env_strict;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default config filename.
pub const DEFAULT_CONFIG_NAME: &str = "invoker-tck.toml";
/// Maximum allowed config file size in bytes.
const MAX_CONFIG_FILE_SIZE: usize = 512 * 1024;
/// Maximum total path length for config-related paths.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Config errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// I/O error.
    #[error("config io error: {0}")]
    Io(String),
    /// Parse error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration.
    #[error("config invalid: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Model
// ============================================================================

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TckConfig {
    /// Readiness probing parameters.
    #[serde(default)]
    pub readiness: ReadinessConfig,
    /// Host port allocation.
    #[serde(default)]
    pub ports: PortsConfig,
    /// Run options.
    #[serde(default)]
    pub run: RunConfig,
    /// Logical image name to concrete image reference.
    #[serde(default)]
    pub images: BTreeMap<String, String>,
    /// Event logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[readiness]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ReadinessConfig {
    /// Maximum connection attempts.
    pub max_attempts: u32,
    /// Backoff base in milliseconds.
    pub base_delay_ms: u64,
    /// Delay after the first successful connection, in milliseconds.
    pub settle_delay_ms: u64,
    /// Per-attempt connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        let policy = ReadinessPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            base_delay_ms: duration_ms(policy.base_delay),
            settle_delay_ms: duration_ms(policy.settle_delay),
            connect_timeout_ms: duration_ms(policy.connect_timeout),
        }
    }
}

/// `[ports]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PortsConfig {
    /// Host address probed for free ports.
    pub bind_host: IpAddr,
    /// Maximum bind attempts per allocation.
    pub max_attempts: u32,
}

impl Default for PortsConfig {
    fn default() -> Self {
        Self {
            bind_host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            max_attempts: invoker_tck_core::runtime::DEFAULT_PORT_ATTEMPTS,
        }
    }
}

/// `[run]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RunConfig {
    /// Verification timeout in seconds; unbounded when absent.
    pub verification_timeout_sec: Option<u64>,
    /// Cases to run; every case when empty.
    pub cases: Vec<String>,
}

/// Event sink selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSinkKind {
    /// JSON lines on stderr.
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Events are discarded.
    #[default]
    #[serde(rename = "none")]
    Disabled,
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    /// Sink selection.
    pub sink: LogSinkKind,
    /// Log file path for the `file` sink.
    pub path: Option<PathBuf>,
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl TckConfig {
    /// Loads configuration, applies environment overrides, and validates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading, overriding, or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_lookup(path, read_env_strict)
    }

    /// Same as [`Self::load`], reading variables through `lookup`. The file
    /// is validated only after overrides are applied, so an override can
    /// repair a setting the file gets wrong.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading, overriding, or validation fails.
    pub fn load_with_lookup<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<Option<String>, String>,
    {
        let env_path = lookup(TckEnv::ConfigPath.as_str()).map_err(ConfigError::Invalid)?;
        let mut config = match resolve_path(path, env_path.as_deref())? {
            Some(resolved) => Self::read_file(&resolved)?,
            None => Self::default(),
        };
        config.apply_overrides(&EnvOverrides::from_lookup(&lookup)?);
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a configuration file without environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, parsed, or validated.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a configuration file under the size and UTF-8 limits.
    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        validate_path(path)?;
        let bytes = fs::read(path)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not a valid config.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Applies environment overrides.
    pub fn apply_overrides(&mut self, overrides: &EnvOverrides) {
        if let Some(seconds) = overrides.verification_timeout_sec {
            self.run.verification_timeout_sec = Some(seconds);
        }
        if let Some(millis) = overrides.settle_delay_ms {
            self.readiness.settle_delay_ms = millis;
        }
        if let Some(sink) = overrides.log_sink {
            self.logging.sink = sink;
        }
    }

    /// Validates configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.readiness.max_attempts == 0 {
            return Err(invalid("readiness.max_attempts must be positive"));
        }
        if self.readiness.connect_timeout_ms == 0 {
            return Err(invalid("readiness.connect_timeout_ms must be positive"));
        }
        if self.ports.max_attempts == 0 {
            return Err(invalid("ports.max_attempts must be positive"));
        }
        if self.run.verification_timeout_sec == Some(0) {
            return Err(invalid("run.verification_timeout_sec must be positive"));
        }
        if self.run.cases.iter().any(|case| case.trim().is_empty()) {
            return Err(invalid("run.cases must not contain empty names"));
        }
        for (logical, reference) in &self.images {
            if logical.trim().is_empty() || reference.trim().is_empty() {
                return Err(invalid("images entries must map non-empty names"));
            }
        }
        match (&self.logging.sink, &self.logging.path) {
            (LogSinkKind::File, None) => {
                return Err(invalid("logging.path is required for the file sink"));
            }
            (_, Some(path)) => validate_path(path)?,
            _ => {}
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Wiring
// ============================================================================

impl TckConfig {
    /// Builds the readiness policy.
    #[must_use]
    pub const fn readiness_policy(&self) -> ReadinessPolicy {
        ReadinessPolicy {
            max_attempts: self.readiness.max_attempts,
            base_delay: Duration::from_millis(self.readiness.base_delay_ms),
            settle_delay: Duration::from_millis(self.readiness.settle_delay_ms),
            connect_timeout: Duration::from_millis(self.readiness.connect_timeout_ms),
        }
    }

    /// Builds the host port allocator.
    #[must_use]
    pub fn port_allocator(&self) -> PortAllocator {
        PortAllocator::new(self.ports.bind_host, self.ports.max_attempts)
    }

    /// Builds runner options.
    #[must_use]
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            selection: CaseSelection::from_names(self.run.cases.iter().map(CaseName::new)),
            verification_timeout: self.run.verification_timeout_sec.map(Duration::from_secs),
        }
    }

    /// Builds the logical image resolver.
    #[must_use]
    pub fn image_resolver(&self) -> ImageResolver {
        ImageResolver::new(
            self.images
                .iter()
                .map(|(logical, reference)| (logical.clone(), ImageRef::new(reference.clone())))
                .collect(),
        )
    }

    /// Builds the configured event sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the log file cannot be opened.
    pub fn event_sink(&self) -> Result<Arc<dyn TckEventSink>, ConfigError> {
        match self.logging.sink {
            LogSinkKind::Stderr => Ok(Arc::new(StderrEventSink)),
            LogSinkKind::Disabled => Ok(Arc::new(NoopEventSink)),
            LogSinkKind::File => {
                let path = self
                    .logging
                    .path
                    .as_deref()
                    .ok_or_else(|| invalid("logging.path is required for the file sink"))?;
                let sink = FileEventSink::new(path)
                    .map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
                Ok(Arc::new(sink))
            }
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds an invalid-config error.
fn invalid(message: &str) -> ConfigError {
    ConfigError::Invalid(message.to_string())
}

/// Converts a duration to whole milliseconds, saturating.
fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Resolves the config path from explicit input, environment, or default.
/// Returns `None` when no explicit path is given and the default is absent.
fn resolve_path(
    explicit: Option<&Path>,
    env_path: Option<&str>,
) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = explicit {
        return Ok(Some(path.to_path_buf()));
    }
    if let Some(env_path) = env_path {
        if env_path.trim().is_empty() {
            return Err(invalid("INVOKER_TCK_CONFIG must not be empty"));
        }
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(invalid("config path exceeds max length"));
        }
        return Ok(Some(PathBuf::from(env_path)));
    }
    let default = PathBuf::from(DEFAULT_CONFIG_NAME);
    Ok(default.is_file().then_some(default))
}

/// Validates path length and components.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(invalid("config path exceeds max length"));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(invalid("config path component too long"));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
