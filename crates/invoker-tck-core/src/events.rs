// crates/invoker-tck-core/src/events.rs
// ============================================================================
// Module: Run Event Logging
// Description: Structured lifecycle events emitted while suites run.
// Purpose: Emit JSON-line logs without hard dependencies on a logging stack.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The engine reports container lifecycle and case progress through a
//! [`TckEventSink`]. Events serialize to one JSON object per line so they can
//! be routed to stderr, a file, or discarded. Sinks never fail the run: write
//! errors are ignored.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::CaseName;
use crate::core::CaseStatus;
use crate::core::ContainerId;
use crate::core::FailureKind;
use crate::core::ImageRef;
use crate::core::SuiteName;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TckEventKind {
    /// A case began executing.
    CaseStarted {
        /// Suite name.
        suite: SuiteName,
        /// Case name.
        case: CaseName,
    },
    /// A case was not selected for execution.
    CaseSkipped {
        /// Suite name.
        suite: SuiteName,
        /// Case name.
        case: CaseName,
    },
    /// An image is present locally.
    ImagePulled {
        /// Image reference.
        image: ImageRef,
    },
    /// A host port was leased.
    PortAllocated {
        /// Leased host port.
        port: u16,
    },
    /// A container was created and started.
    InstanceStarted {
        /// Container identifier.
        container: ContainerId,
        /// Image reference.
        image: ImageRef,
        /// Published host port.
        host_port: u16,
        /// Container port.
        container_port: u16,
    },
    /// One readiness connection attempt concluded.
    ReadinessAttempt {
        /// Probed address.
        address: String,
        /// Zero-based attempt index.
        attempt: u32,
        /// Whether the attempt connected.
        connected: bool,
        /// Error observed on failure.
        error: Option<String>,
    },
    /// The instance was declared ready.
    InstanceReady {
        /// Probed address.
        address: String,
        /// Attempts used.
        attempts: u32,
    },
    /// A verification procedure concluded.
    VerificationFinished {
        /// Case name.
        case: CaseName,
        /// Failure classification, if the procedure failed.
        failure: Option<FailureKind>,
    },
    /// A container was stopped and removed.
    InstanceStopped {
        /// Container identifier.
        container: ContainerId,
    },
    /// A container left behind by a failed setup could not be cleaned up.
    CleanupFailed {
        /// Container identifier.
        container: ContainerId,
        /// Error description.
        error: String,
    },
    /// Teardown failed; logged and swallowed.
    TeardownFailed {
        /// Case name.
        case: CaseName,
        /// Error description.
        error: String,
    },
    /// A case finished with a recorded outcome.
    CaseFinished {
        /// Suite name.
        suite: SuiteName,
        /// Case name.
        case: CaseName,
        /// Recorded status.
        status: CaseStatus,
        /// Failure classification, if failed.
        failure: Option<FailureKind>,
        /// Wall time in milliseconds.
        duration_ms: u64,
    },
}

/// Timestamped event envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TckEvent {
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event payload.
    #[serde(flatten)]
    pub kind: TckEventKind,
}

impl TckEvent {
    /// Creates a new event stamped with the current time.
    #[must_use]
    pub fn new(kind: TckEventKind) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            timestamp_ms,
            kind,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Sink for run events.
pub trait TckEventSink: Send + Sync {
    /// Records an event.
    fn record(&self, event: &TckEvent);

    /// Stamps and records an event payload.
    fn emit(&self, kind: TckEventKind) {
        self.record(&TckEvent::new(kind));
    }
}

/// Event sink that logs JSON lines to stderr.
pub struct StderrEventSink;

impl TckEventSink for StderrEventSink {
    fn record(&self, event: &TckEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Event sink that logs JSON lines to a file.
pub struct FileEventSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileEventSink {
    /// Opens the log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl TckEventSink for FileEventSink {
    fn record(&self, event: &TckEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Event sink that discards events.
pub struct NoopEventSink;

impl TckEventSink for NoopEventSink {
    fn record(&self, _event: &TckEvent) {}
}

/// Event sink that keeps events in memory, for inspection after a run.
#[derive(Default)]
pub struct MemoryEventSink {
    /// Recorded events in emission order.
    events: Mutex<Vec<TckEvent>>,
}

impl MemoryEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded event payloads.
    #[must_use]
    pub fn kinds(&self) -> Vec<TckEventKind> {
        self.events
            .lock()
            .map(|events| events.iter().map(|event| event.kind.clone()).collect())
            .unwrap_or_default()
    }
}

impl TckEventSink for MemoryEventSink {
    fn record(&self, event: &TckEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
