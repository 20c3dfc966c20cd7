//! CLI for cluster status collection

use bfs_status::common::parse_duration;
use bfs_status::ops::{render, OutputFormat, StatusCollector};
use bfs_status::topology::{CoordinationTree, MemoryTree};
use bfs_status::{Config, StoreRegistry};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bfs-status")]
#[command(about = "bfs cluster status: topology, health and capacity")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take one status snapshot and print it
    Collect {
        /// Bootstrap list of store addresses
        #[arg(long)]
        stores: Option<PathBuf>,

        /// ZooKeeper ensemble (comma-separated)
        #[arg(long)]
        zk: Option<String>,

        /// Read the coordination tree from a JSON dump
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Maximum in-flight telemetry requests
        #[arg(long)]
        concurrency: Option<usize>,

        /// Per-store telemetry timeout (e.g. 500ms, 3s)
        #[arg(long, value_parser = parse_duration)]
        timeout: Option<Duration>,

        /// Deadline for the whole pass (e.g. 30s)
        #[arg(long, value_parser = parse_duration)]
        deadline: Option<Duration>,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Collect {
            stores,
            zk,
            snapshot,
            concurrency,
            timeout,
            deadline,
            format,
        } => {
            // CLI has priority over file and environment
            if let Some(stores) = stores {
                config.stores_file = stores;
            }
            if let Some(zk) = zk {
                config.coordination.hosts = zk;
            }
            if snapshot.is_some() {
                config.coordination.snapshot = snapshot;
            }
            if let Some(concurrency) = concurrency {
                config.telemetry.concurrency = concurrency;
            }
            if let Some(timeout) = timeout {
                config.telemetry.request_timeout_ms = timeout.as_millis() as u64;
            }
            if let Some(deadline) = deadline {
                config.collector.deadline_ms = deadline.as_millis() as u64;
            }
            config.validate()?;

            let registry = StoreRegistry::load(&config.stores_file).await?;
            let tree = open_tree(&config).await?;
            let collector = StatusCollector::new(tree, &config)?;
            let report = collector.collect(registry).await?;
            println!("{}", render(&report, format)?);
        }
    }

    Ok(())
}

async fn open_tree(config: &Config) -> anyhow::Result<Box<dyn CoordinationTree>> {
    if let Some(path) = &config.coordination.snapshot {
        return Ok(Box::new(MemoryTree::load(path).await?));
    }

    #[cfg(feature = "zookeeper")]
    {
        let tree = bfs_status::topology::ZkTree::connect(
            &config.coordination.hosts,
            config.coordination.connect_timeout(),
        )
        .await?;
        Ok(Box::new(tree))
    }

    #[cfg(not(feature = "zookeeper"))]
    {
        anyhow::bail!(
            "built without the `zookeeper` feature; pass --snapshot to read a tree dump"
        )
    }
}
