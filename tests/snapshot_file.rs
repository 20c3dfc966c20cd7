//! File-backed inputs: store list, tree dump and TOML config

mod common;

use std::io::Write;

use bfs_status::ops::{render, OutputFormat};
use bfs_status::topology::MemoryTree;
use bfs_status::{Config, StatusCollector, StoreRegistry};
use serde_json::{json, Value};
use tempfile::TempDir;

use common::*;

#[tokio::test]
async fn test_collect_from_files() {
    let stat = spawn_store("127.0.0.20", info_app(info_body(&[(4_294_967_195, 9_000, 3, 12)]))).await;
    let dir = TempDir::new().unwrap();

    let stores_path = dir.path().join("store.txt");
    std::fs::write(&stores_path, "# known stores\n10.1.0.1\n127.0.0.20\n").unwrap();

    let tree_path = dir.path().join("tree.json");
    let tree_json = json!({
        "/rack/bj-1/store-a": {
            "data": {"status": 0x8000_0001u32, "stat": stat, "admin": "127.0.0.20:6063", "id": "store-a"},
            "mtime": 1_650_000_000_000i64
        },
        "/group/4/store-a": {}
    });
    std::fs::write(&tree_path, tree_json.to_string()).unwrap();

    let config_path = dir.path().join("bfs-status.toml");
    let mut file = std::fs::File::create(&config_path).unwrap();
    writeln!(
        file,
        "stores_file = {:?}\n\n[coordination]\nsnapshot = {:?}\n\n[telemetry]\nconcurrency = 2\nrequest_timeout_ms = 1000",
        stores_path.display().to_string(),
        tree_path.display().to_string()
    )
    .unwrap();

    let config = Config::load(Some(&config_path)).unwrap();
    assert_eq!(config.telemetry.concurrency, 2);
    let snapshot = config.coordination.snapshot.clone().unwrap();

    let registry = StoreRegistry::load(&config.stores_file).await.unwrap();
    let tree = MemoryTree::load(&snapshot).await.unwrap();
    let report = StatusCollector::new(tree, &config)
        .unwrap()
        .collect(registry)
        .await
        .unwrap();

    let output: Value = serde_json::from_str(&render(&report, OutputFormat::Json).unwrap()).unwrap();
    assert_eq!(output["10.1.0.1"]["status"], "down");
    assert!(output["10.1.0.1"].get("metrics").is_none());

    let store = &output["127.0.0.20"];
    assert_eq!(store["status"], "up");
    assert_eq!(store["rwStatus"], "readOnly");
    assert_eq!(store["group"], "4");
    assert_eq!(store["rack"], "bj-1");
    assert_eq!(store["adminAddress"], "127.0.0.20:6063");
    assert_eq!(store["metrics"]["usedBytes"], 800);
    assert_eq!(store["metrics"]["totalBytes"], 8u64 * 4_294_967_295);
    assert_eq!(store["metrics"]["needleCount"], 12);
    assert_eq!(store["metrics"]["averageDelayMs"], 3);
}

#[tokio::test]
async fn test_corrupt_snapshot_is_an_error() {
    let dir = TempDir::new().unwrap();
    let tree_path = dir.path().join("tree.json");
    std::fs::write(&tree_path, "[1, 2, 3]").unwrap();

    let err = MemoryTree::load(&tree_path).await.unwrap_err();
    assert!(matches!(err, bfs_status::Error::Json(_)));
}
