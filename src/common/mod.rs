//! Common utilities and types shared across bfs-status

pub mod config;
pub mod error;
pub mod utils;

pub use config::{CollectorConfig, Config, CoordinationConfig, TelemetryConfig};
pub use error::{Error, Result};
pub use utils::{format_bytes, host_of, millis_to_utc, parse_duration};
