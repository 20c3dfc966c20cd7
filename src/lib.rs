//! # bfs-status
//!
//! Point-in-time status of a bfs object-storage cluster, built from:
//! - the bootstrap list of store addresses operators expect to exist
//! - the coordination tree (`/rack/*/*` runtime entries, `/group/*/*` membership)
//! - each live store's `/info` volume statistics
//!
//! ## Architecture
//!
//! ```text
//!  store.txt          coordination tree
//!      │           ┌─────────┴──────────┐
//!      │       rack pass ──────────► group pass
//!      │           │   storeId → ip      │
//!      ▼           ▼                     ▼
//!  ┌──────────────────────────────────────────┐
//!  │ merge: one Store per IP (Down / Up)      │
//!  └───────────────────┬──────────────────────┘
//!                      │ Up stores only
//!          GET http://<stat>/info  (bounded fan-out)
//!                      │
//!               aggregate metrics
//!                      │
//!             StatusReport { stores, diagnostics }
//! ```
//!
//! ## Usage
//!
//! ```bash
//! bfs-status collect --stores ./store.txt --zk zk1:2181 --format text
//! bfs-status collect --snapshot ./tree.json --format full
//! ```

pub mod common;
pub mod ops;
pub mod status;
pub mod topology;

// Re-export commonly used types
pub use common::{Config, Error, Result};
pub use ops::{StatusCollector, StatusReport};
pub use status::{Store, StoreRegistry};

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
