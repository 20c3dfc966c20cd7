#![allow(dead_code)]

use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use bfs_status::topology::{CoordinationTree, TreeNode};
use bfs_status::{Config, Error, Result};

/// Serve `app` on `ip` with an ephemeral port; returns `ip:port`.
///
/// Stores are keyed by IP, so every mock store needs its own loopback
/// address (127.0.0.2, 127.0.0.3, ...).
pub async fn spawn_store(ip: &str, app: Router) -> String {
    let listener = TcpListener::bind(format!("{}:0", ip)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr.to_string()
}

pub fn info_app(body: Value) -> Router {
    Router::new().route(
        "/info",
        get(move || {
            let body = body.clone();
            async move { Json(body) }
        }),
    )
}

pub fn status_app(code: StatusCode) -> Router {
    Router::new().route("/info", get(move || async move { (code, "unavailable") }))
}

pub fn garbage_app() -> Router {
    Router::new().route("/info", get(|| async { "<html>not json</html>" }))
}

pub fn slow_app(delay: Duration) -> Router {
    Router::new().route(
        "/info",
        get(move || async move {
            tokio::time::sleep(delay).await;
            Json(info_body(&[(0, 0, 0, 0)]))
        }),
    )
}

/// `/info` body from (offset, total_delay, processed, needles) tuples
pub fn info_body(volumes: &[(u64, u64, u64, u64)]) -> Value {
    let volumes: Vec<Value> = volumes
        .iter()
        .map(|&(offset, delay, processed, needles)| {
            json!({
                "block": {"offset": offset},
                "stats": {"total_delay": delay, "total_commands_processed": processed},
                "needle_number": needles
            })
        })
        .collect();
    json!({ "volumes": volumes })
}

pub fn rack_payload(status: u32, stat: &str, id: &str) -> String {
    json!({"status": status, "stat": stat, "id": id}).to_string()
}

pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.telemetry.request_timeout_ms = 1_000;
    config.collector.deadline_ms = 10_000;
    config
}

/// Coordination service that cannot be reached
pub struct UnreachableTree;

#[async_trait]
impl CoordinationTree for UnreachableTree {
    async fn children(&self, path: &str) -> Result<Vec<String>> {
        Err(Error::Coordination(format!("{}: connection refused", path)))
    }

    async fn get(&self, path: &str) -> Result<TreeNode> {
        Err(Error::Coordination(format!("{}: connection refused", path)))
    }
}

/// Coordination service that accepts requests but answers too late
pub struct StalledTree(pub Duration);

#[async_trait]
impl CoordinationTree for StalledTree {
    async fn children(&self, _path: &str) -> Result<Vec<String>> {
        tokio::time::sleep(self.0).await;
        Ok(vec![])
    }

    async fn get(&self, path: &str) -> Result<TreeNode> {
        tokio::time::sleep(self.0).await;
        Err(Error::NoNode(path.to_string()))
    }
}

/// Lists children in reverse order
pub struct ReversedTree<T>(pub T);

#[async_trait]
impl<T: CoordinationTree> CoordinationTree for ReversedTree<T> {
    async fn children(&self, path: &str) -> Result<Vec<String>> {
        let mut children = self.0.children(path).await?;
        children.reverse();
        Ok(children)
    }

    async fn get(&self, path: &str) -> Result<TreeNode> {
        self.0.get(path).await
    }
}
