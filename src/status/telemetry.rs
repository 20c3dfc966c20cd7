//! Store telemetry over HTTP
//!
//! Each Up store serves `GET http://<stat>/info`:
//! ```text
//! {"volumes": [{"block": {"offset": u64},
//!               "stats": {"total_delay": u64, "total_commands_processed": u64},
//!               "needle_number": u64}, ...]}
//! ```
//! Requests run with bounded parallelism. A failing store only costs its
//! own metrics; nothing is retried within a pass.

use futures_util::stream::{self, StreamExt};
use serde::Deserialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::common::{Result, TelemetryConfig};
use crate::status::diagnostics::DiagnosticKind;
use crate::status::store::Volume;

#[derive(Deserialize)]
struct InfoResponse {
    // Stores with no volumes report `null`
    #[serde(default)]
    volumes: Option<Vec<VolumeWire>>,
}

#[derive(Deserialize)]
struct VolumeWire {
    block: BlockWire,
    stats: StatsWire,
    needle_number: u64,
}

#[derive(Deserialize)]
struct BlockWire {
    offset: u64,
}

#[derive(Deserialize)]
struct StatsWire {
    total_delay: u64,
    total_commands_processed: u64,
}

impl From<VolumeWire> for Volume {
    fn from(v: VolumeWire) -> Self {
        Volume {
            block_offset: v.block.offset,
            total_delay_nanos: v.stats.total_delay,
            total_commands_processed: v.stats.total_commands_processed,
            needle_number: v.needle_number,
        }
    }
}

/// Parse an `/info` body into its volume list.
pub fn parse_info(body: &[u8]) -> serde_json::Result<Vec<Volume>> {
    let info: InfoResponse = serde_json::from_slice(body)?;
    Ok(info
        .volumes
        .unwrap_or_default()
        .into_iter()
        .map(Volume::from)
        .collect())
}

pub fn info_url(stat_address: &str) -> String {
    format!("http://{}/info", stat_address)
}

/// Outcome of one store's fetch
pub type FetchResult = std::result::Result<Vec<Volume>, DiagnosticKind>;

pub struct TelemetryFetcher {
    client: reqwest::Client,
    concurrency: usize,
    request_timeout: Duration,
}

impl TelemetryFetcher {
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            concurrency: config.concurrency.max(1),
            request_timeout: config.request_timeout(),
        })
    }

    /// Fetch and parse one store's volumes.
    pub async fn fetch(&self, stat_address: &str) -> FetchResult {
        let url = info_url(stat_address);
        debug!("GET {}", url);

        let resp = self
            .client
            .get(&url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| self.request_failure(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DiagnosticKind::TelemetryStatus {
                code: status.as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(|e| self.request_failure(e))?;
        parse_info(&body).map_err(|e| DiagnosticKind::MalformedTelemetry {
            reason: e.to_string(),
        })
    }

    /// Fetch every target, giving up on whatever is still running at `deadline`.
    ///
    /// Targets are `(ip, stat address)` pairs; results come back sorted by IP.
    pub async fn fetch_all(
        &self,
        targets: Vec<(String, String)>,
        deadline: Instant,
    ) -> Vec<(String, FetchResult)> {
        let total = targets.len();
        let mut results: Vec<(String, FetchResult)> = stream::iter(targets)
            .map(|(ip, addr)| async move {
                let result = match tokio::time::timeout_at(deadline, self.fetch(&addr)).await {
                    Ok(result) => result,
                    Err(_) => Err(DiagnosticKind::DeadlineExceeded),
                };
                if let Err(kind) = &result {
                    warn!("Store {} ({}): {}", ip, addr, kind);
                }
                (ip, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        results.sort_by(|a, b| a.0.cmp(&b.0));

        let ok = results.iter().filter(|(_, r)| r.is_ok()).count();
        info!("Telemetry: {}/{} stores answered", ok, total);
        results
    }

    fn request_failure(&self, e: reqwest::Error) -> DiagnosticKind {
        if e.is_timeout() {
            DiagnosticKind::TelemetryTimeout {
                timeout_ms: self.request_timeout.as_millis() as u64,
            }
        } else {
            DiagnosticKind::TelemetryRequest {
                reason: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_info() {
        let body = br#"{
            "server": "store-1",
            "volumes": [
                {"id": 1, "block": {"offset": 1000, "size": 7},
                 "stats": {"total_delay": 2000000, "total_commands_processed": 10, "total_add_processed": 3},
                 "needle_number": 50}
            ]
        }"#;
        let volumes = parse_info(body).unwrap();
        assert_eq!(
            volumes,
            vec![Volume {
                block_offset: 1000,
                total_delay_nanos: 2_000_000,
                total_commands_processed: 10,
                needle_number: 50,
            }]
        );
    }

    #[test]
    fn test_parse_null_or_missing_volumes() {
        assert!(parse_info(br#"{"volumes": null}"#).unwrap().is_empty());
        assert!(parse_info(br#"{}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_info(b"<html>oops</html>").is_err());
        assert!(parse_info(br#"{"volumes": [{"block": {}}]}"#).is_err());
    }

    #[test]
    fn test_info_url() {
        assert_eq!(info_url("10.0.0.2:6062"), "http://10.0.0.2:6062/info");
    }
}
