// crates/invoker-tck-config/src/env.rs
// ============================================================================
// Module: Environment Overrides
// Description: Strict parsing of INVOKER_TCK_* environment variables.
// Purpose: Let CI override selected settings without editing config files.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid silent
//! misconfiguration. Set-but-empty values and malformed numbers fail closed.
//! Lookups go through a caller-supplied function so parsing can be exercised
//! without mutating the process environment. The readers and parsers are
//! public so harnesses with their own variables share the same rules.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::config::ConfigError;
use crate::config::LogSinkKind;

// ============================================================================
// SECTION: Environment Keys
// ============================================================================

/// Environment keys recognized by the kit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TckEnv {
    /// Config file path.
    ConfigPath,
    /// Verification timeout in seconds (positive integer).
    VerificationTimeoutSeconds,
    /// Readiness settle delay in milliseconds (non-negative integer).
    SettleDelayMs,
    /// Event sink selection (`stderr`, `file`, `none`).
    LogSink,
}

impl TckEnv {
    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfigPath => "INVOKER_TCK_CONFIG",
            Self::VerificationTimeoutSeconds => "INVOKER_TCK_VERIFICATION_TIMEOUT_SEC",
            Self::SettleDelayMs => "INVOKER_TCK_SETTLE_DELAY_MS",
            Self::LogSink => "INVOKER_TCK_LOG_SINK",
        }
    }
}

// ============================================================================
// SECTION: Overrides
// ============================================================================

/// Settings overridden through the environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    /// Verification timeout in seconds.
    pub verification_timeout_sec: Option<u64>,
    /// Readiness settle delay in milliseconds.
    pub settle_delay_ms: Option<u64>,
    /// Event sink selection.
    pub log_sink: Option<LogSinkKind>,
}

impl EnvOverrides {
    /// Reads overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a value is not valid UTF-8, is
    /// empty, or fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(read_env_strict)
    }

    /// Reads overrides through `lookup`, which returns the raw value of a
    /// variable or an error message.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a value is empty or fails to parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<Option<String>, String>,
    {
        let read = |key: TckEnv| read_nonempty(&lookup, key.as_str()).map_err(ConfigError::Invalid);
        let verification_timeout_sec = read(TckEnv::VerificationTimeoutSeconds)?
            .map(|raw| parse_positive(TckEnv::VerificationTimeoutSeconds.as_str(), &raw))
            .transpose()
            .map_err(ConfigError::Invalid)?;
        let settle_delay_ms = read(TckEnv::SettleDelayMs)?
            .map(|raw| parse_non_negative(TckEnv::SettleDelayMs.as_str(), &raw))
            .transpose()
            .map_err(ConfigError::Invalid)?;
        let log_sink = read(TckEnv::LogSink)?
            .map(|raw| parse_log_sink(TckEnv::LogSink.as_str(), &raw))
            .transpose()
            .map_err(ConfigError::Invalid)?;
        Ok(Self {
            verification_timeout_sec,
            settle_delay_ms,
            log_sink,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns an error when the environment variable contains invalid UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, String> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string().map(Some).map_err(|_| format!("{name} must be valid UTF-8"))
    })
}

/// Reads a variable through `lookup` and rejects empty values.
///
/// # Errors
///
/// Returns the lookup error, or a message when the value is blank.
pub fn read_nonempty<F>(lookup: &F, name: &str) -> Result<Option<String>, String>
where
    F: Fn(&str) -> Result<Option<String>, String>,
{
    match lookup(name)? {
        Some(value) if value.trim().is_empty() => Err(format!("{name} must not be empty")),
        Some(value) => Ok(Some(value)),
        None => Ok(None),
    }
}

/// Parses a positive integer.
///
/// # Errors
///
/// Returns a message naming `name` when `raw` is not a positive integer.
pub fn parse_positive(name: &str, raw: &str) -> Result<u64, String> {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(format!("{name} must be a positive integer")),
    }
}

/// Parses a non-negative integer.
fn parse_non_negative(name: &str, raw: &str) -> Result<u64, String> {
    raw.trim().parse::<u64>().map_err(|_| format!("{name} must be a non-negative integer"))
}

/// Parses a boolean switch (`true`/`false` or `1`/`0`, case-insensitive).
///
/// # Errors
///
/// Returns a message naming `name` for any other literal.
pub fn parse_flag(name: &str, raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(format!("{name} must be 1, 0, true, or false")),
    }
}

/// Parses an event sink selection.
fn parse_log_sink(name: &str, raw: &str) -> Result<LogSinkKind, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "stderr" => Ok(LogSinkKind::Stderr),
        "file" => Ok(LogSinkKind::File),
        "none" => Ok(LogSinkKind::Disabled),
        _ => Err(format!("{name} must be one of stderr, file, none")),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
