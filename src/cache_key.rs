//! Canonical cache key derivation
//!
//! Builds the key under which a response is stored in the edge cache. The
//! key embeds the cache namespace epoch, the request path and the parsed
//! range, so a full-object entry and any ranged entry for the same path can
//! never collide.

use crate::config::ProxyConfig;
use crate::models::RangeRequest;
use std::sync::Arc;

/// Marker rendered in place of an absent range end
///
/// Distinct from any decimal number, so `bytes=5-0` (open-ended) and a
/// hypothetical explicit end can never alias.
const OPEN_END_MARKER: &str = "eof";

/// Derives canonical cache keys from request path and parsed range
pub struct CacheKeyDeriver {
    config: Arc<ProxyConfig>,
}

impl CacheKeyDeriver {
    /// Create a new CacheKeyDeriver with the given configuration
    pub fn new(config: Arc<ProxyConfig>) -> Self {
        CacheKeyDeriver { config }
    }

    /// Derive the cache key for a request
    ///
    /// # Arguments
    /// * `path` - URL path of the request, with leading slash
    /// * `range` - Parsed range, or `None` for a full-object request
    ///
    /// # Returns
    /// `{scheme}://{authority}/{cache_id}_{path}` for full-object requests,
    /// with `_{offset}_{end}` appended for ranged requests.
    pub fn derive(&self, path: &str, range: Option<&RangeRequest>) -> String {
        let prefix = format!(
            "{}://{}/{}_{}",
            self.config.key_scheme, self.config.key_authority, self.config.cache_id, path
        );

        match range {
            None => prefix,
            Some(range) => match range.end {
                Some(end) => format!("{}_{}_{}", prefix, range.offset, end),
                None => format!("{}_{}_{}", prefix, range.offset, OPEN_END_MARKER),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deriver() -> CacheKeyDeriver {
        CacheKeyDeriver::new(Arc::new(ProxyConfig::default()))
    }

    #[test]
    fn test_full_object_key_format() {
        let key = deriver().derive("/files/video.mp4", None);
        assert_eq!(key, "https://edge-cache.internal/1_/files/video.mp4");
    }

    #[test]
    fn test_ranged_key_format() {
        let range = RangeRequest::new(0, Some(1023));
        let key = deriver().derive("/files/video.mp4", Some(&range));
        assert_eq!(key, "https://edge-cache.internal/1_/files/video.mp4_0_1023");
    }

    #[test]
    fn test_open_ended_key_format() {
        let range = RangeRequest::new(512, None);
        let key = deriver().derive("/files/video.mp4", Some(&range));
        assert_eq!(key, "https://edge-cache.internal/1_/files/video.mp4_512_eof");
    }

    #[test]
    fn test_full_and_ranged_keys_differ() {
        let d = deriver();
        let range = RangeRequest::new(0, Some(1023));
        assert_ne!(
            d.derive("/a.bin", None),
            d.derive("/a.bin", Some(&range))
        );
    }

    #[test]
    fn test_different_ranges_differ() {
        let d = deriver();
        let r1 = RangeRequest::new(0, Some(1023));
        let r2 = RangeRequest::new(1024, Some(2047));
        let r3 = RangeRequest::new(0, None);
        let keys = [
            d.derive("/a.bin", Some(&r1)),
            d.derive("/a.bin", Some(&r2)),
            d.derive("/a.bin", Some(&r3)),
        ];
        assert_ne!(keys[0], keys[1]);
        assert_ne!(keys[0], keys[2]);
        assert_ne!(keys[1], keys[2]);
    }

    #[test]
    fn test_cache_id_bump_changes_keys() {
        let old = CacheKeyDeriver::new(Arc::new(ProxyConfig::default()));
        let new = CacheKeyDeriver::new(Arc::new(ProxyConfig {
            cache_id: "2".to_string(),
            ..Default::default()
        }));
        assert_ne!(old.derive("/a.bin", None), new.derive("/a.bin", None));
    }
}
