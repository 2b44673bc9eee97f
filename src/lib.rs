//! Edge Range Cache
//!
//! A read-through edge caching proxy for an object-storage backend that
//! serves byte-range-aware HTTP GET requests, transparently caching full
//! and partial responses.
//!
//! # Overview
//!
//! Each request flows through a fixed pipeline: the `Range` header is
//! parsed into a semantic range request, a canonical cache key is derived
//! from the cache namespace epoch, the path and the range, and the shared
//! edge cache is consulted. A hit is served immediately, with the status
//! rewriter restoring 206 for entries that were stored as coerced 200s. A
//! miss reads the backend, tees the body into a client copy and a cache
//! copy, and schedules cache population as a detached background task that
//! never delays the client response. Missing objects yield a uniform 403
//! that is itself negatively cached for ten minutes.
//!
//! # Architecture
//!
//! - [`EdgeProxy`]: orchestrates one request end to end
//! - [`parse_range`]: `Range` header parsing with the open-end sentinel
//! - [`CacheKeyDeriver`]: canonical, collision-free cache keys
//! - [`ObjectStore`]: backend abstraction ([`FsObjectStore`], [`MemoryObjectStore`])
//! - [`EdgeCache`]: shared response store ([`MemoryEdgeCache`])
//! - [`ResponseComposer`]: response headers plus body fan-out
//! - [`rewriter`]: status restoration on cache hits
//! - [`server`]: hyper front end with the upstream access gate
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use edge_range_cache::{EdgeProxy, MemoryEdgeCache, MemoryObjectStore, ProxyConfig};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let config = Arc::new(ProxyConfig::default());
//! let store = Arc::new(MemoryObjectStore::new());
//! let cache = Arc::new(MemoryEdgeCache::new(Duration::from_secs(604800)));
//! let proxy = EdgeProxy::new(config, store, cache);
//! ```

pub mod cache_key;
pub mod composer;
pub mod config;
pub mod edge_cache;
pub mod error;
pub mod models;
pub mod proxy;
pub mod range;
pub mod rewriter;
pub mod server;
pub mod store;
pub mod tee;

// Re-export commonly used types
pub use cache_key::CacheKeyDeriver;
pub use composer::{ComposedResponse, ResponseComposer};
pub use config::ProxyConfig;
pub use edge_cache::{CacheStats, EdgeCache, MemoryEdgeCache};
pub use error::{ProxyError, Result};
pub use models::{CachedEntry, EntryVariant, ObjectMetadata, RangeRequest};
pub use proxy::{EdgeProxy, ProxyBody, ProxyResponse};
pub use range::parse_range;
pub use store::{ByteStream, FsObjectStore, MemoryObjectStore, ObjectRead, ObjectStore};
