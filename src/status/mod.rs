//! Store records and the steps that fill them in
//!
//! Registry → merge ← topology, then telemetry → metrics.

pub mod diagnostics;
pub mod merger;
pub mod metrics;
pub mod registry;
pub mod store;
pub mod telemetry;

pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use merger::{index_racks, merge, MergedStatus, RackIndex};
pub use metrics::{aggregate, MAX_BLOCK_SIZE, PADDING};
pub use registry::StoreRegistry;
pub use store::{RwStatus, StatusBitmask, Store, StoreMetrics, StoreStatus, Volume};
pub use telemetry::{parse_info, FetchResult, TelemetryFetcher};
