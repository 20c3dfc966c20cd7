//! One status collection pass
//!
//! Topology walk, merge with the bootstrap registry, telemetry fan-out,
//! then a single step that folds telemetry results into the store set.
//! Nothing is kept between passes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::common::{Config, Error, Result};
use crate::status::{
    aggregate, merge, Diagnostic, DiagnosticKind, FetchResult, MergedStatus, Store,
    StoreRegistry, TelemetryFetcher,
};
use crate::topology::{CoordinationTree, TopologyReader};

/// Final snapshot: one store per IP plus everything that went wrong per store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub stores: BTreeMap<String, Store>,
    pub diagnostics: Vec<Diagnostic>,
}

impl StatusReport {
    pub fn up_count(&self) -> usize {
        self.stores.values().filter(|s| s.is_up()).count()
    }

    pub fn diagnostics_for<'a>(&'a self, store: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.store == store)
    }
}

/// Attach metrics from telemetry results. Results for stores that are not
/// Up are ignored.
pub fn apply_telemetry(merged: MergedStatus, results: Vec<(String, FetchResult)>) -> StatusReport {
    let MergedStatus {
        mut stores,
        mut diagnostics,
    } = merged;

    for (ip, result) in results {
        let Some(store) = stores.get_mut(&ip).filter(|s| s.is_up()) else {
            continue;
        };
        match result {
            Ok(volumes) => {
                let metrics = aggregate(&volumes);
                if metrics.average_delay_ms.is_none() {
                    warn!("Store {}: {}", ip, DiagnosticKind::NoProcessedCommands);
                    diagnostics.push(Diagnostic::new(ip.clone(), DiagnosticKind::NoProcessedCommands));
                }
                store.metrics = Some(metrics);
            }
            Err(kind) => diagnostics.push(Diagnostic::new(ip, kind)),
        }
    }
    diagnostics.sort();

    StatusReport {
        stores,
        diagnostics,
    }
}

pub struct StatusCollector<T> {
    reader: TopologyReader<T>,
    fetcher: TelemetryFetcher,
    deadline: Duration,
}

impl<T: CoordinationTree> StatusCollector<T> {
    pub fn new(tree: T, config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            reader: TopologyReader::new(tree, config.coordination.concurrency),
            fetcher: TelemetryFetcher::new(&config.telemetry)?,
            deadline: config.collector.deadline(),
        })
    }

    /// Run one pass.
    ///
    /// Fails only if the coordination tree cannot be read, or the walk does
    /// not finish before the deadline. Telemetry still running at the
    /// deadline is reported per store.
    pub async fn collect(&self, registry: StoreRegistry) -> Result<StatusReport> {
        let started = Instant::now();
        let deadline = started + self.deadline;

        let topology = tokio::time::timeout_at(deadline, self.reader.read())
            .await
            .map_err(|_| {
                Error::Timeout(format!(
                    "topology walk did not finish within {:?}",
                    self.deadline
                ))
            })??;

        let merged = merge(registry, &topology);
        let results = self
            .fetcher
            .fetch_all(merged.telemetry_targets(), deadline)
            .await;
        let report = apply_telemetry(merged, results);

        info!(
            "Status pass done in {:?}: {} stores, {} up, {} diagnostics",
            started.elapsed(),
            report.stores.len(),
            report.up_count(),
            report.diagnostics.len()
        );
        Ok(report)
    }
}
