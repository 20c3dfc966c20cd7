//! Ops commands for cluster status

pub mod collect;
pub mod report;

pub use collect::{apply_telemetry, StatusCollector, StatusReport};
pub use report::{render, OutputFormat};
