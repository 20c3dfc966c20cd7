//! Per-store problems that do not abort a pass

use serde::{Deserialize, Serialize};
use std::fmt;

/// What went wrong for one store
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Rack node payload is not the expected JSON
    MalformedPayload { path: String, reason: String },
    /// Rack node exists but carries no payload
    EmptyPayload { path: String },
    /// Two rack entries resolve to the same IP; the other one was kept
    DuplicateAddress { path: String, kept: String },
    /// Store id is claimed by entries at two IPs; only `kept` gets its group
    DuplicateStoreId { store_id: String, kept: String },
    /// Store id appears under more than one group; the lowest was kept
    MultipleGroups { groups: Vec<String>, kept: String },
    /// `/info` answered with a non-success status
    TelemetryStatus { code: u16 },
    /// `/info` could not be reached
    TelemetryRequest { reason: String },
    /// `/info` did not answer within the per-request timeout
    TelemetryTimeout { timeout_ms: u64 },
    /// `/info` body is not the expected JSON
    MalformedTelemetry { reason: String },
    /// Pass deadline expired before this store's telemetry arrived
    DeadlineExceeded,
    /// Volumes report zero processed commands, so no average delay
    NoProcessedCommands,
}

/// A diagnostic attached to a store (IP, or tree path when no IP is known)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Diagnostic {
    pub store: String,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(store: impl Into<String>, kind: DiagnosticKind) -> Self {
        Self {
            store: store.into(),
            kind,
        }
    }

    /// Failures that left the store without metrics
    pub fn is_telemetry_failure(&self) -> bool {
        matches!(
            self.kind,
            DiagnosticKind::TelemetryStatus { .. }
                | DiagnosticKind::TelemetryRequest { .. }
                | DiagnosticKind::TelemetryTimeout { .. }
                | DiagnosticKind::MalformedTelemetry { .. }
                | DiagnosticKind::DeadlineExceeded
        )
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedPayload { path, reason } => {
                write!(f, "malformed payload at {}: {}", path, reason)
            }
            Self::EmptyPayload { path } => write!(f, "empty payload at {}", path),
            Self::DuplicateAddress { path, kept } => {
                write!(f, "{} shares its address with {}, ignored", path, kept)
            }
            Self::DuplicateStoreId { store_id, kept } => {
                write!(f, "store id {} already belongs to {}, group not applied", store_id, kept)
            }
            Self::MultipleGroups { groups, kept } => {
                write!(f, "listed in groups {}, using {}", groups.join(","), kept)
            }
            Self::TelemetryStatus { code } => write!(f, "telemetry returned HTTP {}", code),
            Self::TelemetryRequest { reason } => write!(f, "telemetry request failed: {}", reason),
            Self::TelemetryTimeout { timeout_ms } => {
                write!(f, "telemetry timed out after {}ms", timeout_ms)
            }
            Self::MalformedTelemetry { reason } => write!(f, "malformed telemetry: {}", reason),
            Self::DeadlineExceeded => write!(f, "pass deadline exceeded"),
            Self::NoProcessedCommands => write!(f, "no processed commands, delay undefined"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.store, self.kind)
    }
}
