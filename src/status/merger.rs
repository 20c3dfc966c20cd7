//! Merge the bootstrap registry with what the coordination tree says

use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::common::millis_to_utc;
use crate::status::diagnostics::{Diagnostic, DiagnosticKind};
use crate::status::registry::StoreRegistry;
use crate::status::store::{Store, StoreStatus};
use crate::topology::{RackEntry, Topology};

/// Rack entries resolved to one entry per IP
#[derive(Debug, Clone, Default)]
pub struct RackIndex<'a> {
    pub by_ip: BTreeMap<String, &'a RackEntry>,
    /// storeId → ip, built from the entries that won their IP
    pub ip_of_store: BTreeMap<String, String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Resolve rack entries to IPs.
///
/// When two entries share an IP the most recently written one wins, with
/// ties going to the first by (rack, node). The result does not depend on
/// the order of `entries`.
pub fn index_racks(entries: &[RackEntry]) -> RackIndex<'_> {
    let mut sorted: Vec<&RackEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| (&a.rack, &a.node).cmp(&(&b.rack, &b.node)));

    let mut by_ip: BTreeMap<String, &RackEntry> = BTreeMap::new();
    let mut losers = Vec::new();
    for entry in sorted {
        match by_ip.get(entry.ip()) {
            Some(current) if current.modified_ms >= entry.modified_ms => losers.push(entry),
            Some(current) => {
                losers.push(*current);
                by_ip.insert(entry.ip().to_string(), entry);
            }
            None => {
                by_ip.insert(entry.ip().to_string(), entry);
            }
        }
    }

    let mut diagnostics: Vec<Diagnostic> = losers
        .into_iter()
        .map(|loser| {
            let kept = by_ip[loser.ip()].path();
            let kind = DiagnosticKind::DuplicateAddress {
                path: loser.path(),
                kept,
            };
            warn!("Store {}: {}", loser.ip(), kind);
            Diagnostic::new(loser.ip(), kind)
        })
        .collect();

    let mut ip_of_store: BTreeMap<String, String> = BTreeMap::new();
    for (ip, entry) in &by_ip {
        match ip_of_store.get(&entry.store_id) {
            Some(kept) => {
                let kind = DiagnosticKind::DuplicateStoreId {
                    store_id: entry.store_id.clone(),
                    kept: kept.clone(),
                };
                warn!("Store {}: {}", ip, kind);
                diagnostics.push(Diagnostic::new(ip.as_str(), kind));
            }
            None => {
                ip_of_store.insert(entry.store_id.clone(), ip.clone());
            }
        }
    }
    diagnostics.sort();

    RackIndex {
        by_ip,
        ip_of_store,
        diagnostics,
    }
}

/// Rack-derived fields replace whatever the registry had for that IP.
fn store_from_rack(ip: &str, entry: &RackEntry) -> Store {
    Store {
        ip: ip.to_string(),
        status: StoreStatus::Up,
        rw_status: entry.status.rw_status(),
        group: None,
        rack: Some(entry.rack.clone()),
        store_id: Some(entry.store_id.clone()),
        last_heartbeat: millis_to_utc(entry.modified_ms),
        stat_address: Some(entry.stat_address.clone()),
        admin_address: entry.admin_address.clone(),
        api_address: entry.api_address.clone(),
        metrics: None,
    }
}

/// Merged store set, before telemetry
#[derive(Debug, Clone, Default)]
pub struct MergedStatus {
    pub stores: BTreeMap<String, Store>,
    pub diagnostics: Vec<Diagnostic>,
}

impl MergedStatus {
    /// (ip, stat address) of every Up store
    pub fn telemetry_targets(&self) -> Vec<(String, String)> {
        self.stores
            .values()
            .filter(|s| s.is_up())
            .filter_map(|s| Some((s.ip.clone(), s.stat_address.clone()?)))
            .collect()
    }
}

/// Combine the registry and both topology passes into one store per IP.
pub fn merge(registry: StoreRegistry, topology: &Topology) -> MergedStatus {
    let mut stores = registry.into_stores();
    let bootstrap = stores.len();
    let index = index_racks(&topology.racks.entries);

    for (ip, entry) in &index.by_ip {
        stores.insert(ip.clone(), store_from_rack(ip, entry));
    }

    for (store_id, group) in &topology.groups.group_of_store {
        let Some(store) = index
            .ip_of_store
            .get(store_id)
            .and_then(|ip| stores.get_mut(ip))
        else {
            continue;
        };
        store.group = Some(group.clone());
    }

    let mut diagnostics = topology.racks.diagnostics.clone();
    diagnostics.extend(topology.groups.diagnostics.iter().cloned());
    diagnostics.extend(index.diagnostics);
    diagnostics.sort();

    let up = stores.values().filter(|s| s.is_up()).count();
    info!(
        "Merged {} stores ({} up, {} from bootstrap list only)",
        stores.len(),
        up,
        stores.len() - up
    );
    if stores.len() > bootstrap {
        info!(
            "{} stores found in the rack tree but not in the bootstrap list",
            stores.len() - bootstrap
        );
    }

    MergedStatus {
        stores,
        diagnostics,
    }
}
