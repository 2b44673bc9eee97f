//! Core data models for the edge range cache

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};

/// A parsed client byte-range request
///
/// Represents the inclusive byte range `[offset, end]`. An absent `end`
/// means "to the end of the object" and is resolved against the object
/// size only when the response is composed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RangeRequest {
    /// Starting byte position (inclusive)
    pub offset: u64,
    /// Ending byte position (inclusive), `None` = to end of object
    pub end: Option<u64>,
}

impl RangeRequest {
    /// Create a new RangeRequest
    pub fn new(offset: u64, end: Option<u64>) -> Self {
        RangeRequest { offset, end }
    }

    /// Resolve the effective end position against the object size
    ///
    /// An open-ended range resolves to the last byte of the object.
    pub fn resolved_end(&self, object_size: u64) -> u64 {
        self.end.unwrap_or_else(|| object_size.saturating_sub(1))
    }

    /// Number of bytes this range covers for an object of the given size
    pub fn len(&self, object_size: u64) -> u64 {
        self.resolved_end(object_size).saturating_sub(self.offset) + 1
    }

    /// Render the `Content-Range` header value for an object of the given size
    ///
    /// Format: `bytes {offset}-{resolved_end}/{size}`
    pub fn content_range(&self, object_size: u64) -> String {
        format!(
            "bytes {}-{}/{}",
            self.offset,
            self.resolved_end(object_size),
            object_size
        )
    }
}

/// Metadata about an object in the backing store
///
/// Owned by the object store implementation; the core only reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// Total object size in bytes
    pub size: u64,
    /// Strong validator for the object contents, already quoted
    pub etag: String,
    /// Headers the store wants reflected on responses (e.g. `Content-Type`)
    pub content_hints: HeaderMap,
}

impl ObjectMetadata {
    /// Create metadata with no content hints
    pub fn new(size: u64, etag: impl Into<String>) -> Self {
        ObjectMetadata {
            size,
            etag: etag.into(),
            content_hints: HeaderMap::new(),
        }
    }
}

/// Marker recording whether a cached entry was originally a partial response
///
/// The edge cache refuses to store responses with status 206, so partial
/// entries are stored with status 200 and this marker set to `Partial`.
/// The status rewriter maps the marker back to the outward status on a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryVariant {
    /// Entry holds a full object body
    Full,
    /// Entry holds a partial (ranged) body; outward status must be 206
    Partial,
}

/// A whole HTTP response stored in the edge cache under one cache key
///
/// Entries are never mutated in place; repopulation overwrites wholesale.
#[derive(Debug, Clone)]
pub struct CachedEntry {
    /// Stored status code; 200 for object entries, 403 for negative entries
    pub status: StatusCode,
    /// Side-channel marker for the original response shape
    pub variant: EntryVariant,
    /// Response headers as composed at population time
    pub headers: HeaderMap,
    /// Complete response body
    pub body: Bytes,
}

impl CachedEntry {
    /// Extract the `max-age` value from this entry's `Cache-Control` header
    ///
    /// Used by the edge cache to derive the entry's lifetime, so negative
    /// entries (max-age=600) expire independently of positive ones.
    pub fn max_age(&self) -> Option<u64> {
        let value = self
            .headers
            .get(http::header::CACHE_CONTROL)?
            .to_str()
            .ok()?;
        value
            .split(',')
            .filter_map(|directive| directive.trim().strip_prefix("max-age="))
            .find_map(|age| age.trim().parse::<u64>().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_end_explicit() {
        let range = RangeRequest::new(10, Some(20));
        assert_eq!(range.resolved_end(1000), 20);
    }

    #[test]
    fn test_resolved_end_open() {
        let range = RangeRequest::new(10, None);
        assert_eq!(range.resolved_end(1000), 999);
    }

    #[test]
    fn test_len() {
        let range = RangeRequest::new(10, Some(20));
        assert_eq!(range.len(1000), 11);

        let open = RangeRequest::new(990, None);
        assert_eq!(open.len(1000), 10);
    }

    #[test]
    fn test_content_range() {
        let range = RangeRequest::new(0, Some(499));
        assert_eq!(range.content_range(1234), "bytes 0-499/1234");

        let open = RangeRequest::new(500, None);
        assert_eq!(open.content_range(1234), "bytes 500-1233/1234");
    }

    #[test]
    fn test_max_age_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CACHE_CONTROL,
            "public, max-age=600".parse().unwrap(),
        );
        let entry = CachedEntry {
            status: StatusCode::OK,
            variant: EntryVariant::Full,
            headers,
            body: Bytes::new(),
        };
        assert_eq!(entry.max_age(), Some(600));
    }

    #[test]
    fn test_max_age_missing() {
        let entry = CachedEntry {
            status: StatusCode::OK,
            variant: EntryVariant::Full,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        };
        assert_eq!(entry.max_age(), None);
    }
}
