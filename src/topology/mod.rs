//! Cluster topology from the coordination tree
//!
//! - `tree`: read-only tree access (in-memory, JSON snapshot, ZooKeeper)
//! - `reader`: rack and group passes

pub mod reader;
pub mod tree;

#[cfg(feature = "zookeeper")]
pub use tree::ZkTree;
pub use reader::{parse_rack_entry, GroupScan, RackEntry, RackScan, Topology, TopologyReader};
pub use tree::{CoordinationTree, MemoryTree, TreeNode};
