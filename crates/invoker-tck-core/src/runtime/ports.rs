// crates/invoker-tck-core/src/runtime/ports.rs
// ============================================================================
// Module: Host Port Allocation
// Description: Serialized allocator for ephemeral host ports.
// Purpose: Never hand the same host port to two live instances.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The allocator asks the OS for a free port by binding port `0`, reads the
//! assigned port, and closes the listener. Ports currently leased are never
//! handed out again; a lease returns its port to the allocator when dropped.
//! Allocation is serialized by an internal lock, so one allocator shared by
//! all runners in a process cannot race two instances onto the same port.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;
use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::net::SocketAddr;
use std::net::TcpListener;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use crate::interfaces::SetupError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default number of bind attempts before reporting exhaustion.
pub const DEFAULT_PORT_ATTEMPTS: u32 = 8;

// ============================================================================
// SECTION: Allocator
// ============================================================================

/// Shared state behind an allocator and its leases.
struct AllocatorState {
    /// Interface used for probing free ports.
    bind_host: IpAddr,
    /// Bind attempts per allocation.
    max_attempts: u32,
    /// Ports currently leased.
    leased: Mutex<BTreeSet<u16>>,
}

/// Injected allocator for ephemeral host ports.
///
/// # Invariants
/// - A port is leased to at most one holder at a time.
#[derive(Clone)]
pub struct PortAllocator {
    /// Shared allocator state.
    state: Arc<AllocatorState>,
}

impl PortAllocator {
    /// Creates an allocator probing `bind_host` with up to `max_attempts` binds.
    #[must_use]
    pub fn new(bind_host: IpAddr, max_attempts: u32) -> Self {
        Self {
            state: Arc::new(AllocatorState {
                bind_host,
                max_attempts: max_attempts.max(1),
                leased: Mutex::new(BTreeSet::new()),
            }),
        }
    }

    /// Leases a free host port.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::PortExhaustion`] when no unleased port could be
    /// bound within the attempt budget.
    pub fn allocate(&self) -> Result<PortLease, SetupError> {
        let mut leased = self.state.leased.lock().unwrap_or_else(PoisonError::into_inner);
        let mut reason = String::from("no bind attempted");
        for _ in 0 .. self.state.max_attempts {
            match probe_free_port(self.state.bind_host) {
                Ok(port) if leased.insert(port) => {
                    return Ok(PortLease {
                        port,
                        state: Arc::clone(&self.state),
                    });
                }
                Ok(port) => reason = format!("port {port} is already leased"),
                Err(err) => reason = err,
            }
        }
        Err(SetupError::PortExhaustion {
            attempts: self.state.max_attempts,
            reason,
        })
    }

    /// Returns the number of ports currently leased.
    #[must_use]
    pub fn leased_count(&self) -> usize {
        self.state.leased.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Default for PortAllocator {
    fn default() -> Self {
        Self::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT_ATTEMPTS)
    }
}

impl fmt::Debug for PortAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortAllocator")
            .field("bind_host", &self.state.bind_host)
            .field("max_attempts", &self.state.max_attempts)
            .finish_non_exhaustive()
    }
}

/// Binds port zero on `host` and returns the OS-assigned port.
fn probe_free_port(host: IpAddr) -> Result<u16, String> {
    let listener = TcpListener::bind(SocketAddr::new(host, 0))
        .map_err(|err| format!("failed to bind {host}: {err}"))?;
    let addr =
        listener.local_addr().map_err(|err| format!("failed to read listener address: {err}"))?;
    drop(listener);
    Ok(addr.port())
}

// ============================================================================
// SECTION: Lease
// ============================================================================

/// Exclusive lease on a host port, released on drop.
pub struct PortLease {
    /// Leased port.
    port: u16,
    /// Allocator the port returns to.
    state: Arc<AllocatorState>,
}

impl PortLease {
    /// Returns the leased port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Debug for PortLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortLease").field("port", &self.port).finish()
    }
}

impl Drop for PortLease {
    fn drop(&mut self) {
        let mut leased = self.state.leased.lock().unwrap_or_else(PoisonError::into_inner);
        leased.remove(&self.port);
    }
}
