//! Request orchestration
//!
//! Ties the components together for one GET request: parse the range,
//! derive the cache key, try the edge cache, and on a miss read the backend,
//! compose the response and schedule cache population in the background.

use crate::cache_key::CacheKeyDeriver;
use crate::composer::ResponseComposer;
use crate::config::ProxyConfig;
use crate::edge_cache::EdgeCache;
use crate::error::Result;
use crate::models::{CachedEntry, EntryVariant};
use crate::range::parse_range;
use crate::rewriter;
use crate::store::{ByteStream, ObjectStore};
use crate::tee;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use percent_encoding::percent_decode_str;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const X_CACHE: header::HeaderName = header::HeaderName::from_static("x-cache");

/// Body of a proxy response
pub enum ProxyBody {
    /// Complete body, served from cache
    Full(Bytes),
    /// Streaming body, served from a fresh backend read
    Stream(ByteStream),
}

/// A response ready to hand to the HTTP layer
pub struct ProxyResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ProxyBody,
}

/// The edge caching proxy core
pub struct EdgeProxy {
    store: Arc<dyn ObjectStore>,
    cache: Arc<dyn EdgeCache>,
    keys: CacheKeyDeriver,
    composer: ResponseComposer,
}

impl EdgeProxy {
    /// Create a proxy over the given backend store and edge cache
    pub fn new(
        config: Arc<ProxyConfig>,
        store: Arc<dyn ObjectStore>,
        cache: Arc<dyn EdgeCache>,
    ) -> Self {
        let composer = ResponseComposer::new(
            Duration::from_secs(config.positive_ttl_secs),
            Duration::from_secs(config.negative_ttl_secs),
        );
        EdgeProxy {
            store,
            cache,
            keys: CacheKeyDeriver::new(config),
            composer,
        }
    }

    /// Serve one GET request
    ///
    /// # Arguments
    /// * `path` - URL path, with leading slash, not yet percent-decoded
    /// * `request_headers` - The inbound request headers
    pub async fn handle_get(
        &self,
        path: &str,
        request_headers: &HeaderMap,
    ) -> Result<ProxyResponse> {
        let range = parse_range(
            request_headers
                .get(header::RANGE)
                .and_then(|v| v.to_str().ok()),
        );
        let key = self.keys.derive(path, range.as_ref());

        if let Some(entry) = self.cache.lookup(&key).await {
            debug!("cache HIT: {}", key);
            let status = rewriter::outward_status(&entry);
            let mut headers = entry.headers.clone();
            headers.insert(X_CACHE, HeaderValue::from_static("HIT"));
            return Ok(ProxyResponse {
                status,
                headers,
                body: ProxyBody::Full(entry.body),
            });
        }

        debug!("cache MISS: {}", key);
        let object_path = object_path(path);

        // A failed backend read is served exactly like a missing object:
        // one 403 outcome per request, negatively cached, never a 5xx.
        let read = match self.store.get(&object_path, range.as_ref()).await {
            Ok(read) => read,
            Err(e) => {
                warn!("backend read failed for {}: {}", object_path, e);
                None
            }
        };

        match read {
            None => {
                debug!("object not found: {}", object_path);
                Ok(self.forbidden(key))
            }
            Some(read) => {
                let keep_alive = wants_keep_alive(request_headers);
                let composed = self.composer.compose(read, range.as_ref(), keep_alive)?;

                self.spawn_populate(key, composed.variant, composed.headers.clone(), composed.cache_body);

                let mut headers = composed.headers;
                headers.insert(X_CACHE, HeaderValue::from_static("MISS"));
                Ok(ProxyResponse {
                    status: composed.status,
                    headers,
                    body: ProxyBody::Stream(composed.client_body),
                })
            }
        }
    }

    /// Build the 403 sentinel and schedule it as a negative-cache entry
    fn forbidden(&self, key: String) -> ProxyResponse {
        let headers = self.composer.forbidden_headers();

        let entry = CachedEntry {
            status: StatusCode::FORBIDDEN,
            variant: EntryVariant::Full,
            headers: headers.clone(),
            body: Bytes::new(),
        };
        let cache = Arc::clone(&self.cache);
        tokio::spawn(async move {
            cache.populate(&key, entry).await;
        });

        let mut headers = headers;
        headers.insert(X_CACHE, HeaderValue::from_static("MISS"));
        ProxyResponse {
            status: StatusCode::FORBIDDEN,
            headers,
            body: ProxyBody::Full(Bytes::new()),
        }
    }

    /// Collect the cache-side body copy and populate the edge cache
    ///
    /// Runs detached from the request: completion is never awaited before
    /// the client response goes out, and failure only logs.
    fn spawn_populate(
        &self,
        key: String,
        variant: EntryVariant,
        headers: HeaderMap,
        cache_body: ByteStream,
    ) {
        let cache = Arc::clone(&self.cache);
        tokio::spawn(async move {
            match tee::collect(cache_body).await {
                Ok(body) => {
                    let entry = CachedEntry {
                        // Stored status is always 200; the variant marker
                        // preserves the real response shape for hits.
                        status: StatusCode::OK,
                        variant,
                        headers,
                        body,
                    };
                    cache.populate(&key, entry).await;
                }
                Err(e) => {
                    warn!("cache population abandoned for {}: {}", key, e);
                }
            }
        });
    }
}

/// Map a request path to the backend object key
///
/// Percent-decodes the path and strips the leading slash.
pub fn object_path(path: &str) -> String {
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    decoded.trim_start_matches('/').to_string()
}

fn wants_keep_alive(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONNECTION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("keep-alive"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_path_strips_leading_slash() {
        assert_eq!(object_path("/files/a.bin"), "files/a.bin");
    }

    #[test]
    fn test_object_path_percent_decodes() {
        assert_eq!(object_path("/files/my%20file.bin"), "files/my file.bin");
        assert_eq!(object_path("/%E6%96%87%E4%BB%B6"), "文件");
    }

    #[test]
    fn test_wants_keep_alive() {
        let mut headers = HeaderMap::new();
        assert!(!wants_keep_alive(&headers));

        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        assert!(wants_keep_alive(&headers));

        headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
        assert!(!wants_keep_alive(&headers));
    }
}
