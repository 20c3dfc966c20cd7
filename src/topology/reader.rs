//! Rack and group passes over the coordination tree
//!
//! Layout:
//! ```text
//! /rack/<rackId>/<node>      -> {"status": <int>, "stat": "<ip>:<port>", "id": "<storeId>", ...}
//! /group/<groupId>/<storeId> -> existence only
//! ```
//! The group pass only keeps store ids found by the rack pass, so the rack
//! pass always runs first. Within a pass the reads are unordered; results
//! are sorted before they leave this module.

use futures_util::stream::{self, StreamExt};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use crate::common::{host_of, Error, Result};
use crate::status::diagnostics::{Diagnostic, DiagnosticKind};
use crate::status::store::StatusBitmask;
use crate::topology::tree::{join, CoordinationTree, TreeNode};

pub const RACK_ROOT: &str = "/rack";
pub const GROUP_ROOT: &str = "/group";

/// One store's runtime entry under `/rack`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RackEntry {
    pub rack: String,
    /// Name of the tree node holding the entry
    pub node: String,
    pub store_id: String,
    pub status: StatusBitmask,
    pub stat_address: String,
    pub admin_address: Option<String>,
    pub api_address: Option<String>,
    pub modified_ms: i64,
}

impl RackEntry {
    pub fn path(&self) -> String {
        join(&join(RACK_ROOT, &self.rack), &self.node)
    }

    /// Address of the stat endpoint without its port
    pub fn ip(&self) -> &str {
        host_of(&self.stat_address)
    }
}

#[derive(Deserialize)]
struct RackPayload {
    status: i64,
    stat: String,
    id: String,
    #[serde(default)]
    admin: Option<String>,
    #[serde(default)]
    api: Option<String>,
}

/// Parse a rack node payload.
pub fn parse_rack_entry(
    rack: &str,
    node: &str,
    data: &TreeNode,
) -> std::result::Result<RackEntry, DiagnosticKind> {
    let path = join(&join(RACK_ROOT, rack), node);
    if data.data.iter().all(u8::is_ascii_whitespace) {
        return Err(DiagnosticKind::EmptyPayload { path });
    }
    let payload: RackPayload =
        serde_json::from_slice(&data.data).map_err(|e| DiagnosticKind::MalformedPayload {
            path: path.clone(),
            reason: e.to_string(),
        })?;
    if host_of(&payload.stat).is_empty() {
        return Err(DiagnosticKind::MalformedPayload {
            path,
            reason: format!("no host in stat address {:?}", payload.stat),
        });
    }
    if payload.id.is_empty() {
        return Err(DiagnosticKind::MalformedPayload {
            path,
            reason: "empty store id".into(),
        });
    }
    Ok(RackEntry {
        rack: rack.to_string(),
        node: node.to_string(),
        store_id: payload.id,
        status: StatusBitmask(payload.status),
        stat_address: payload.stat.trim().to_string(),
        admin_address: payload.admin.filter(|a| !a.is_empty()),
        api_address: payload.api.filter(|a| !a.is_empty()),
        modified_ms: data.modified_ms,
    })
}

/// Result of the rack pass, sorted by (rack, node)
#[derive(Debug, Clone, Default)]
pub struct RackScan {
    pub entries: Vec<RackEntry>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RackScan {
    pub fn store_ids(&self) -> BTreeSet<String> {
        self.entries.iter().map(|e| e.store_id.clone()).collect()
    }
}

/// Result of the group pass
#[derive(Debug, Clone, Default)]
pub struct GroupScan {
    /// storeId → groupId
    pub group_of_store: BTreeMap<String, String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Both passes together
#[derive(Debug, Clone, Default)]
pub struct Topology {
    pub racks: RackScan,
    pub groups: GroupScan,
}

pub struct TopologyReader<T> {
    tree: T,
    concurrency: usize,
}

impl<T: CoordinationTree> TopologyReader<T> {
    pub fn new(tree: T, concurrency: usize) -> Self {
        Self {
            tree,
            concurrency: concurrency.max(1),
        }
    }

    /// Rack pass, then group pass.
    pub async fn read(&self) -> Result<Topology> {
        let racks = self.read_racks().await?;
        let groups = self.read_groups(&racks.store_ids()).await?;
        Ok(Topology { racks, groups })
    }

    pub async fn read_racks(&self) -> Result<RackScan> {
        let pairs = self.grandchildren(RACK_ROOT).await?;

        let fetched: Vec<Result<Option<(String, String, TreeNode)>>> = stream::iter(pairs)
            .map(|(rack, node)| async move {
                let path = join(&join(RACK_ROOT, &rack), &node);
                match self.tree.get(&path).await {
                    Ok(data) => Ok(Some((rack, node, data))),
                    Err(e) if e.is_no_node() => {
                        debug!("{} vanished during rack pass", path);
                        Ok(None)
                    }
                    Err(e) => Err(e),
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut scan = RackScan::default();
        let mut racks = BTreeSet::new();
        for item in fetched {
            let Some((rack, node, data)) = item? else {
                continue;
            };
            match parse_rack_entry(&rack, &node, &data) {
                Ok(entry) => {
                    racks.insert(rack);
                    scan.entries.push(entry);
                }
                Err(kind) => {
                    let path = join(&join(RACK_ROOT, &rack), &node);
                    warn!("Skipping rack node {}: {}", path, kind);
                    scan.diagnostics.push(Diagnostic::new(path, kind));
                }
            }
        }
        scan.entries
            .sort_by(|a, b| (&a.rack, &a.node).cmp(&(&b.rack, &b.node)));
        scan.diagnostics.sort();

        info!(
            "Rack pass: {} stores in {} racks, {} skipped",
            scan.entries.len(),
            racks.len(),
            scan.diagnostics.len()
        );
        Ok(scan)
    }

    /// Group pass over the store ids found by the rack pass.
    pub async fn read_groups(&self, known_ids: &BTreeSet<String>) -> Result<GroupScan> {
        let pairs = self.grandchildren(GROUP_ROOT).await?;

        let mut groups_of: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (group, store_id) in pairs {
            if !known_ids.contains(&store_id) {
                debug!("Group {} lists unknown store {}", group, store_id);
                continue;
            }
            groups_of.entry(store_id).or_default().insert(group);
        }

        let mut scan = GroupScan::default();
        for (store_id, groups) in groups_of {
            let Some(kept) = groups.first().cloned() else {
                continue;
            };
            if groups.len() > 1 {
                let kind = DiagnosticKind::MultipleGroups {
                    groups: groups.into_iter().collect(),
                    kept: kept.clone(),
                };
                warn!("Store {}: {}", store_id, kind);
                scan.diagnostics.push(Diagnostic::new(store_id.clone(), kind));
            }
            scan.group_of_store.insert(store_id, kept);
        }

        info!(
            "Group pass: {} of {} stores assigned to a group",
            scan.group_of_store.len(),
            known_ids.len()
        );
        Ok(scan)
    }

    /// All (child, grandchild) name pairs under `root`, sorted.
    async fn grandchildren(&self, root: &str) -> Result<Vec<(String, String)>> {
        let parents = match self.tree.children(root).await {
            Ok(parents) => parents,
            Err(e) if e.is_no_node() => {
                warn!("{} does not exist, treating as empty", root);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let listed: Vec<Result<Vec<(String, String)>>> = stream::iter(parents)
            .map(|parent| async move {
                let path = join(root, &parent);
                let children = match self.tree.children(&path).await {
                    Ok(children) => children,
                    Err(e) if e.is_no_node() => {
                        debug!("{} vanished during walk", path);
                        Vec::new()
                    }
                    Err(e) => return Err(e),
                };
                let pairs: Vec<(String, String)> = children
                    .into_iter()
                    .map(|child| (parent.clone(), child))
                    .collect();
                Ok::<_, Error>(pairs)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut pairs = Vec::new();
        for item in listed {
            pairs.extend(item?);
        }
        pairs.sort();
        Ok(pairs)
    }
}
