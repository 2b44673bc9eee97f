//! Edge cache abstraction and in-memory implementation
//!
//! The edge cache is a shared, keyed store of whole HTTP responses. Lookups
//! back immediate responses; population is best-effort and fire-and-forget
//! (the proxy spawns it and never awaits it on the request path). Concurrent
//! populates for the same key are last-write-wins: the entry derived for a
//! key is deterministic given the same backend state, so no locking is
//! needed beyond the map itself.

use crate::models::CachedEntry;
use async_trait::async_trait;
use http::StatusCode;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Shared keyed response store
#[async_trait]
pub trait EdgeCache: Send + Sync {
    /// Look up a cached response
    ///
    /// # Returns
    /// * `Some(CachedEntry)` on a hit, immediately usable as a response
    /// * `None` on a miss or expired entry
    async fn lookup(&self, key: &str) -> Option<CachedEntry>;

    /// Store a response under a key, best-effort
    ///
    /// Failures are logged, never surfaced; the caller must not depend on
    /// the write landing. The store refuses partial-content entries, which
    /// is why the response composer coerces stored statuses to 200.
    async fn populate(&self, key: &str, entry: CachedEntry);
}

/// Cache statistics for monitoring
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

struct StoredEntry {
    entry: CachedEntry,
    expires_at: SystemTime,
}

/// In-memory edge cache with per-entry TTL
///
/// Entry lifetime comes from the entry's own `Cache-Control: max-age`, so
/// negative entries (10 minutes) and object entries (7 days) age out on
/// their own schedules. Entries without a parseable max-age fall back to
/// the default TTL.
pub struct MemoryEdgeCache {
    storage: RwLock<HashMap<String, StoredEntry>>,
    default_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryEdgeCache {
    /// Create a cache with the given fallback TTL
    pub fn new(default_ttl: Duration) -> Self {
        MemoryEdgeCache {
            storage: RwLock::new(HashMap::new()),
            default_ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let entries = self.storage.read().map(|s| s.len()).unwrap_or(0);
        CacheStats {
            entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Drop all expired entries
    fn sweep_expired(&self) {
        let now = SystemTime::now();
        if let Ok(mut storage) = self.storage.write() {
            let before = storage.len();
            storage.retain(|_, stored| stored.expires_at > now);
            let removed = before - storage.len();
            if removed > 0 {
                debug!("swept {} expired cache entries", removed);
            }
        }
    }
}

#[async_trait]
impl EdgeCache for MemoryEdgeCache {
    async fn lookup(&self, key: &str) -> Option<CachedEntry> {
        let now = SystemTime::now();
        let result = match self.storage.read() {
            Ok(storage) => storage.get(key).and_then(|stored| {
                if stored.expires_at > now {
                    Some(stored.entry.clone())
                } else {
                    debug!("cache entry expired: {}", key);
                    None
                }
            }),
            Err(e) => {
                warn!("cache lookup failed: key={}, error={:?}", key, e);
                None
            }
        };

        if result.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    async fn populate(&self, key: &str, entry: CachedEntry) {
        if entry.status == StatusCode::PARTIAL_CONTENT {
            // The storage layer refuses partial-content responses outright
            warn!("refusing to cache 206 response: {}", key);
            return;
        }

        let ttl = entry
            .max_age()
            .map(Duration::from_secs)
            .unwrap_or(self.default_ttl);
        let expires_at = SystemTime::now() + ttl;

        match self.storage.write() {
            Ok(mut storage) => {
                debug!(
                    "populated cache: key={}, bytes={}, ttl={}s",
                    key,
                    entry.body.len(),
                    ttl.as_secs()
                );
                storage.insert(key.to_string(), StoredEntry { entry, expires_at });
                let needs_sweep = storage.len() % 128 == 0;
                drop(storage);
                if needs_sweep {
                    self.sweep_expired();
                }
            }
            Err(e) => {
                // Best-effort: the client response already left without us
                warn!("cache populate failed: key={}, error={:?}", key, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryVariant;
    use bytes::Bytes;
    use http::HeaderMap;

    fn entry(status: StatusCode, max_age: Option<u64>, body: &'static [u8]) -> CachedEntry {
        let mut headers = HeaderMap::new();
        if let Some(age) = max_age {
            headers.insert(
                http::header::CACHE_CONTROL,
                format!("max-age={}", age).parse().unwrap(),
            );
        }
        CachedEntry {
            status,
            variant: EntryVariant::Full,
            headers,
            body: Bytes::from_static(body),
        }
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache = MemoryEdgeCache::new(Duration::from_secs(60));
        assert!(cache.lookup("k").await.is_none());

        cache.populate("k", entry(StatusCode::OK, Some(60), b"body")).await;
        let hit = cache.lookup("k").await.unwrap();
        assert_eq!(hit.body, Bytes::from_static(b"body"));

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_refuses_partial_content() {
        let cache = MemoryEdgeCache::new(Duration::from_secs(60));
        cache
            .populate("k", entry(StatusCode::PARTIAL_CONTENT, Some(60), b"chunk"))
            .await;
        assert!(cache.lookup("k").await.is_none());
        assert_eq!(cache.stats().entries, 0);
    }

    #[tokio::test]
    async fn test_accepts_negative_entry() {
        let cache = MemoryEdgeCache::new(Duration::from_secs(60));
        cache
            .populate("k", entry(StatusCode::FORBIDDEN, Some(600), b""))
            .await;
        let hit = cache.lookup("k").await.unwrap();
        assert_eq!(hit.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_ttl_from_max_age() {
        let cache = MemoryEdgeCache::new(Duration::from_secs(3600));
        cache.populate("k", entry(StatusCode::OK, Some(1), b"short")).await;

        assert!(cache.lookup("k").await.is_some());
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(cache.lookup("k").await.is_none());
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let cache = MemoryEdgeCache::new(Duration::from_secs(60));
        cache.populate("k", entry(StatusCode::OK, Some(60), b"first")).await;
        cache.populate("k", entry(StatusCode::OK, Some(60), b"second")).await;

        let hit = cache.lookup("k").await.unwrap();
        assert_eq!(hit.body, Bytes::from_static(b"second"));
        assert_eq!(cache.stats().entries, 1);
    }
}
