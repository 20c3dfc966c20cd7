//! Configuration for a status collection pass
//!
//! Sources, lowest priority first: built-in defaults, an optional TOML file,
//! `BFS_STATUS__*` environment variables. The CLI applies its own flags on top.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::common::{Error, Result};

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Bootstrap list of known store addresses
    #[serde(default = "default_stores_file")]
    pub stores_file: PathBuf,

    #[serde(default)]
    pub collector: CollectorConfig,

    #[serde(default)]
    pub coordination: CoordinationConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Logging level, used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_stores_file() -> PathBuf {
    PathBuf::from("store.txt")
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Whole-pass settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Overall deadline for one pass
    #[serde(default = "default_deadline")]
    pub deadline_ms: u64,
}

fn default_deadline() -> u64 {
    30_000
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            deadline_ms: default_deadline(),
        }
    }
}

impl CollectorConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

/// Coordination service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinationConfig {
    /// Comma-separated ZooKeeper ensemble
    #[serde(default = "default_hosts")]
    pub hosts: String,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Read the tree from a JSON dump instead of a live session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<PathBuf>,

    /// Parallel tree reads within one phase
    #[serde(default = "default_tree_concurrency")]
    pub concurrency: usize,
}

fn default_hosts() -> String {
    "127.0.0.1:2181".to_string()
}
fn default_connect_timeout() -> u64 {
    5_000
}
fn default_tree_concurrency() -> usize {
    8
}

impl Default for CoordinationConfig {
    fn default() -> Self {
        Self {
            hosts: default_hosts(),
            connect_timeout_ms: default_connect_timeout(),
            snapshot: None,
            concurrency: default_tree_concurrency(),
        }
    }
}

impl CoordinationConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Store telemetry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Maximum in-flight `/info` requests
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-request timeout
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_concurrency() -> usize {
    16
}
fn default_request_timeout() -> u64 {
    3_000
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl TelemetryConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stores_file: default_stores_file(),
            collector: CollectorConfig::default(),
            coordination: CoordinationConfig::default(),
            telemetry: TelemetryConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load from an optional TOML file plus the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("BFS_STATUS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.telemetry.concurrency == 0 {
            return Err(Error::InvalidConfig(
                "telemetry.concurrency must be at least 1".into(),
            ));
        }
        if self.coordination.concurrency == 0 {
            return Err(Error::InvalidConfig(
                "coordination.concurrency must be at least 1".into(),
            ));
        }
        if self.telemetry.request_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "telemetry.request_timeout_ms must be positive".into(),
            ));
        }
        if self.collector.deadline_ms == 0 {
            return Err(Error::InvalidConfig(
                "collector.deadline_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.telemetry.concurrency, 16);
        assert_eq!(config.collector.deadline(), Duration::from_secs(30));
    }

    #[test]
    fn test_load_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
stores_file = "/etc/bfs/store.txt"

[coordination]
hosts = "zk1:2181,zk2:2181"

[telemetry]
concurrency = 4
"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.stores_file, PathBuf::from("/etc/bfs/store.txt"));
        assert_eq!(config.coordination.hosts, "zk1:2181,zk2:2181");
        assert_eq!(config.telemetry.concurrency, 4);
        assert_eq!(config.telemetry.request_timeout_ms, 3_000);
        assert!(config.coordination.snapshot.is_none());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = Config::default();
        config.telemetry.concurrency = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }
}
