//! Edge Range Cache server
//!
//! Loads configuration, sets up logging, and serves the caching proxy over
//! a filesystem-backed object store.

use anyhow::Context;
use edge_range_cache::{EdgeProxy, FsObjectStore, MemoryEdgeCache, ProxyConfig};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| "edge_range_cache.yaml".to_string());
    info!("loading configuration from {}", config_path);

    let config = Arc::new(
        ProxyConfig::from_file(&config_path)
            .with_context(|| format!("loading {}", config_path))?,
    );
    info!("cache namespace epoch: {}", config.cache_id);
    info!("object store root: {}", config.store_root);
    info!(
        "TTLs: positive {}s, negative {}s",
        config.positive_ttl_secs, config.negative_ttl_secs
    );

    let store = Arc::new(FsObjectStore::new(config.store_root.clone()));
    let cache = Arc::new(MemoryEdgeCache::new(Duration::from_secs(
        config.positive_ttl_secs,
    )));
    let proxy = Arc::new(EdgeProxy::new(
        Arc::clone(&config),
        store,
        cache,
    ));

    edge_range_cache::server::run(proxy, config).await
}
