// crates/invoker-tck-core/src/runtime/readiness.rs
// ============================================================================
// Module: Readiness Prober
// Description: Bounded exponential-backoff connectivity probing.
// Purpose: Gate verification on an instance accepting connections.
// Dependencies: async-trait, tokio
// ============================================================================

//! ## Overview
//! The prober attempts a connection to the instance address; after the `n`th
//! failed attempt (zero-based) it sleeps `base_delay * 2^n` and tries again,
//! giving up after `max_attempts` attempts. Each attempt is bounded by a
//! connect timeout, so probing always terminates.
//!
//! Accepting a TCP connection does not mean the candidate is ready to serve
//! requests (a published port may be accepted by the engine's proxy before the
//! process listens). After the first successful connection the prober waits a
//! fixed settle delay. Supplying an application-level [`ConnectivityCheck`]
//! and a zero settle delay replaces that heuristic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::sleep;
use tokio::time::timeout;

use crate::events::TckEventKind;
use crate::events::TckEventSink;
use crate::interfaces::ConnectivityCheck;
use crate::interfaces::SetupError;

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Default number of connection attempts.
pub const DEFAULT_READINESS_ATTEMPTS: u32 = 10;
/// Default base delay of the exponential backoff.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(10);
/// Default delay after the first successful connection.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1_000);
/// Default bound on a single connection attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Readiness probing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    /// Maximum connection attempts.
    pub max_attempts: u32,
    /// Base delay; attempt `n` failing waits `base_delay * 2^n`.
    pub base_delay: Duration,
    /// Delay applied after connectivity first succeeds.
    pub settle_delay: Duration,
    /// Bound on each connection attempt.
    pub connect_timeout: Duration,
}

impl ReadinessPolicy {
    /// Returns the sleep applied after failed attempt `attempt` (zero-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1_u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_READINESS_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            settle_delay: DEFAULT_SETTLE_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

// ============================================================================
// SECTION: TCP Check
// ============================================================================

/// Connectivity check that opens (and immediately drops) a TCP connection.
#[derive(Debug, Clone, Copy)]
pub struct TcpConnectCheck {
    /// Bound on the connection attempt.
    connect_timeout: Duration,
}

impl TcpConnectCheck {
    /// Creates a check bounded by `connect_timeout`.
    #[must_use]
    pub const fn new(connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
        }
    }
}

#[async_trait]
impl ConnectivityCheck for TcpConnectCheck {
    async fn check(&self, address: &str) -> Result<(), String> {
        match timeout(self.connect_timeout, TcpStream::connect(address)).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(err)) => Err(err.to_string()),
            Err(_) => {
                Err(format!("connect timed out after {} ms", self.connect_timeout.as_millis()))
            }
        }
    }
}

// ============================================================================
// SECTION: Prober
// ============================================================================

/// Polls an address until it accepts connections or the budget is spent.
#[derive(Clone)]
pub struct ReadinessProber {
    /// Probing parameters.
    policy: ReadinessPolicy,
    /// Connectivity check applied per attempt.
    check: Arc<dyn ConnectivityCheck>,
}

impl ReadinessProber {
    /// Creates a prober using TCP connects bounded by the policy timeout.
    #[must_use]
    pub fn new(policy: ReadinessPolicy) -> Self {
        Self {
            policy,
            check: Arc::new(TcpConnectCheck::new(policy.connect_timeout)),
        }
    }

    /// Replaces the connectivity check.
    #[must_use]
    pub fn with_check(mut self, check: Arc<dyn ConnectivityCheck>) -> Self {
        self.check = check;
        self
    }

    /// Returns the probing parameters.
    #[must_use]
    pub const fn policy(&self) -> &ReadinessPolicy {
        &self.policy
    }

    /// Waits until `address` is reachable, making at most `max_attempts`
    /// attempts. Returns the number of attempts used.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::ReadinessTimeout`] when no attempt succeeds.
    pub async fn wait_ready(
        &self,
        address: &str,
        max_attempts: u32,
        events: &dyn TckEventSink,
    ) -> Result<u32, SetupError> {
        let mut reason = String::from("no attempt made");
        for attempt in 0 .. max_attempts {
            match self.check.check(address).await {
                Ok(()) => {
                    events.emit(TckEventKind::ReadinessAttempt {
                        address: address.to_string(),
                        attempt,
                        connected: true,
                        error: None,
                    });
                    if !self.policy.settle_delay.is_zero() {
                        sleep(self.policy.settle_delay).await;
                    }
                    let attempts = attempt + 1;
                    events.emit(TckEventKind::InstanceReady {
                        address: address.to_string(),
                        attempts,
                    });
                    return Ok(attempts);
                }
                Err(err) => {
                    events.emit(TckEventKind::ReadinessAttempt {
                        address: address.to_string(),
                        attempt,
                        connected: false,
                        error: Some(err.clone()),
                    });
                    reason = err;
                    if attempt + 1 < max_attempts {
                        sleep(self.policy.backoff(attempt)).await;
                    }
                }
            }
        }
        Err(SetupError::ReadinessTimeout {
            address: address.to_string(),
            attempts: max_attempts,
            reason,
        })
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::ReadinessPolicy;

    #[test]
    fn backoff_doubles_from_base() {
        let policy = ReadinessPolicy {
            base_delay: Duration::from_millis(10),
            ..ReadinessPolicy::default()
        };
        assert_eq!(policy.backoff(0), Duration::from_millis(10));
        assert_eq!(policy.backoff(1), Duration::from_millis(20));
        assert_eq!(policy.backoff(4), Duration::from_millis(160));
    }

    #[test]
    fn backoff_saturates_instead_of_overflowing() {
        let policy = ReadinessPolicy::default();
        assert_eq!(policy.backoff(40), policy.base_delay.saturating_mul(u32::MAX));
    }
}
