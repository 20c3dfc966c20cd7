//! Read-only access to the coordination tree
//!
//! The reader only ever lists children and reads payloads, so that is all
//! the trait asks of a backend.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::common::{Error, Result};

/// Payload and last-modified time of one tree node
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TreeNode {
    pub data: Vec<u8>,
    /// Milliseconds since the Unix epoch
    pub modified_ms: i64,
}

/// A tree-structured key/value store such as ZooKeeper.
///
/// Both methods return [`Error::NoNode`] for a path that does not exist.
/// Any other error means the service itself is unusable.
#[async_trait]
pub trait CoordinationTree: Send + Sync {
    async fn children(&self, path: &str) -> Result<Vec<String>>;

    async fn get(&self, path: &str) -> Result<TreeNode>;
}

#[async_trait]
impl<T: CoordinationTree + ?Sized> CoordinationTree for Box<T> {
    async fn children(&self, path: &str) -> Result<Vec<String>> {
        (**self).children(path).await
    }

    async fn get(&self, path: &str) -> Result<TreeNode> {
        (**self).get(path).await
    }
}

/// Join a parent path and a child name.
pub fn join(parent: &str, child: &str) -> String {
    if parent.ends_with('/') {
        format!("{}{}", parent, child)
    } else {
        format!("{}/{}", parent, child)
    }
}

/// In-memory tree. Intermediate nodes exist implicitly with an empty payload.
#[derive(Debug, Clone, Default)]
pub struct MemoryTree {
    nodes: BTreeMap<String, TreeNode>,
}

#[derive(Deserialize)]
struct SnapshotNode {
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default)]
    mtime: i64,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, data: impl Into<Vec<u8>>, modified_ms: i64) {
        self.nodes.insert(
            normalize(path),
            TreeNode {
                data: data.into(),
                modified_ms,
            },
        );
    }

    /// Builder form of [`MemoryTree::insert`]
    pub fn with(mut self, path: &str, data: impl Into<Vec<u8>>, modified_ms: i64) -> Self {
        self.insert(path, data, modified_ms);
        self
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Parse a JSON dump of the form `{"<path>": {"data": ..., "mtime": <ms>}}`.
    ///
    /// String data is taken verbatim, any other JSON value is re-encoded.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, SnapshotNode> = serde_json::from_str(json)?;
        let mut tree = Self::new();
        for (path, node) in raw {
            if !path.starts_with('/') {
                return Err(Error::InvalidSnapshot(format!(
                    "path must be absolute: {}",
                    path
                )));
            }
            let data = match node.data {
                serde_json::Value::Null => Vec::new(),
                serde_json::Value::String(s) => s.into_bytes(),
                other => serde_json::to_vec(&other)?,
            };
            tree.insert(&path, data, node.mtime);
        }
        Ok(tree)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = tokio::fs::read_to_string(path.as_ref()).await?;
        let tree = Self::from_json(&json)?;
        tracing::info!(
            "Loaded tree snapshot {:?} ({} nodes)",
            path.as_ref(),
            tree.len()
        );
        Ok(tree)
    }

    fn exists(&self, path: &str) -> bool {
        if path == "/" || self.nodes.contains_key(path) {
            return true;
        }
        let prefix = join(path, "");
        self.nodes
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(k, _)| k.starts_with(&prefix))
    }
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl CoordinationTree for MemoryTree {
    async fn children(&self, path: &str) -> Result<Vec<String>> {
        let path = normalize(path);
        if !self.exists(&path) {
            return Err(Error::NoNode(path));
        }
        let prefix = join(&path, "");
        let children: BTreeSet<&str> = self
            .nodes
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter_map(|(k, _)| k[prefix.len()..].split('/').next())
            .filter(|name| !name.is_empty())
            .collect();
        Ok(children.into_iter().map(str::to_string).collect())
    }

    async fn get(&self, path: &str) -> Result<TreeNode> {
        let path = normalize(path);
        match self.nodes.get(&path) {
            Some(node) => Ok(node.clone()),
            None if self.exists(&path) => Ok(TreeNode::default()),
            None => Err(Error::NoNode(path)),
        }
    }
}

/// Live ZooKeeper session
#[cfg(feature = "zookeeper")]
pub struct ZkTree {
    client: zookeeper_client::Client,
}

#[cfg(feature = "zookeeper")]
impl ZkTree {
    pub async fn connect(hosts: &str, timeout: std::time::Duration) -> Result<Self> {
        tracing::info!("Connecting to ZooKeeper at {}", hosts);
        let client = tokio::time::timeout(timeout, zookeeper_client::Client::connect(hosts))
            .await
            .map_err(|_| Error::Coordination(format!("connect to {} timed out", hosts)))?
            .map_err(|e| Error::Coordination(format!("connect to {}: {}", hosts, e)))?;
        Ok(Self { client })
    }
}

#[cfg(feature = "zookeeper")]
fn zk_error(path: &str, e: zookeeper_client::Error) -> Error {
    match e {
        zookeeper_client::Error::NoNode => Error::NoNode(path.to_string()),
        other => Error::Coordination(format!("{}: {}", path, other)),
    }
}

#[cfg(feature = "zookeeper")]
#[async_trait]
impl CoordinationTree for ZkTree {
    async fn children(&self, path: &str) -> Result<Vec<String>> {
        self.client
            .list_children(path)
            .await
            .map_err(|e| zk_error(path, e))
    }

    async fn get(&self, path: &str) -> Result<TreeNode> {
        let (data, stat) = self
            .client
            .get_data(path)
            .await
            .map_err(|e| zk_error(path, e))?;
        Ok(TreeNode {
            data,
            modified_ms: stat.mtime,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MemoryTree {
        MemoryTree::new()
            .with("/rack/r1/s1", "a", 10)
            .with("/rack/r1/s2", "b", 20)
            .with("/rack/r2/s3", "c", 30)
            .with("/group/1/s1", "", 0)
    }

    #[tokio::test]
    async fn test_children_are_sorted_and_unique() {
        let tree = sample();
        assert_eq!(tree.children("/").await.unwrap(), vec!["group", "rack"]);
        assert_eq!(tree.children("/rack").await.unwrap(), vec!["r1", "r2"]);
        assert_eq!(tree.children("/rack/r1/").await.unwrap(), vec!["s1", "s2"]);
        assert!(tree.children("/rack/r1/s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_node() {
        let tree = sample();
        assert!(tree.children("/volume").await.unwrap_err().is_no_node());
        assert!(tree.get("/rack/r9").await.unwrap_err().is_no_node());
        // A prefix of a real name is not a node
        assert!(tree.get("/rack/r").await.unwrap_err().is_no_node());
    }

    #[tokio::test]
    async fn test_get_payload_and_implicit_parent() {
        let tree = sample();
        let node = tree.get("/rack/r1/s2").await.unwrap();
        assert_eq!(node.data, b"b");
        assert_eq!(node.modified_ms, 20);
        assert_eq!(tree.get("/rack/r1").await.unwrap(), TreeNode::default());
    }

    #[tokio::test]
    async fn test_from_json() {
        let tree = MemoryTree::from_json(
            r#"{
                "/rack/r1/s1": {"data": {"status": 1, "stat": "10.0.0.1:6062", "id": "s1"}, "mtime": 5},
                "/rack/r1/s2": {"data": "raw", "mtime": 6},
                "/group/1/s1": {}
            }"#,
        )
        .unwrap();
        assert_eq!(tree.len(), 3);
        let node = tree.get("/rack/r1/s1").await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&node.data).unwrap();
        assert_eq!(value["stat"], "10.0.0.1:6062");
        assert_eq!(tree.get("/rack/r1/s2").await.unwrap().data, b"raw");
        assert!(tree.get("/group/1/s1").await.unwrap().data.is_empty());
    }

    #[test]
    fn test_from_json_rejects_relative_path() {
        let err = MemoryTree::from_json(r#"{"rack/r1": {}}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidSnapshot(_)));
    }

    #[test]
    fn test_join() {
        assert_eq!(join("/rack", "r1"), "/rack/r1");
        assert_eq!(join("/", "rack"), "/rack");
    }
}
