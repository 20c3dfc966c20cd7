//! Per-store records and the runtime status bitmask

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether the store was found in the rack tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Down,
    Up,
}

/// Read/write state published by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RwStatus {
    ReadOnly,
    ReadWrite,
    Other,
}

/// Raw status word a store writes into its rack node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusBitmask(pub i64);

impl StatusBitmask {
    const ENABLE: i64 = 1 << 31;
    const READ: i64 = 1 << 0;
    const WRITE: i64 = 1 << 1;

    pub const READ_ONLY: StatusBitmask = StatusBitmask(Self::ENABLE | Self::READ);
    pub const READ_WRITE: StatusBitmask = StatusBitmask(Self::ENABLE | Self::READ | Self::WRITE);

    /// Only the two exact sentinels are meaningful; every other value is `Other`.
    pub fn rw_status(self) -> RwStatus {
        match self {
            Self::READ_WRITE => RwStatus::ReadWrite,
            Self::READ_ONLY => RwStatus::ReadOnly,
            _ => RwStatus::Other,
        }
    }
}

/// Capacity and latency derived from a store's volumes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMetrics {
    pub used_bytes: u64,
    pub total_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_delay_ms: Option<u64>,
    pub needle_count: u64,
}

/// Volume statistics reported by a store's `/info` endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Volume {
    pub block_offset: u64,
    pub total_delay_nanos: u64,
    pub total_commands_processed: u64,
    pub needle_number: u64,
}

/// One storage node, keyed by IP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub ip: String,
    pub status: StoreStatus,
    pub rw_status: RwStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_heartbeat: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<StoreMetrics>,
}

impl Store {
    /// A store known only from the bootstrap list
    pub fn down(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            status: StoreStatus::Down,
            rw_status: RwStatus::Other,
            group: None,
            rack: None,
            store_id: None,
            last_heartbeat: None,
            stat_address: None,
            admin_address: None,
            api_address: None,
            metrics: None,
        }
    }

    pub fn is_up(&self) -> bool {
        self.status == StoreStatus::Up
    }
}
