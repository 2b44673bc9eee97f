//! Response composition for cache misses
//!
//! Builds the HTTP metadata for a fresh backend read and fans the body out
//! into the client-facing copy and the cache-population copy. Also owns the
//! 403 sentinel used for not-found objects and negative caching.

use crate::error::Result;
use crate::models::{EntryVariant, ObjectMetadata, RangeRequest};
use crate::store::{ByteStream, ObjectRead};
use crate::tee;
use http::header;
use http::{HeaderMap, HeaderValue, StatusCode};
use std::time::{Duration, SystemTime};
use tracing::debug;

/// A composed cache-miss response, ready to serve and to persist
pub struct ComposedResponse {
    /// Client-facing status: 200 full, 206 ranged
    pub status: StatusCode,
    /// Marker recorded in the cached entry alongside the coerced 200
    pub variant: EntryVariant,
    /// Headers shared by the client response and the cached entry
    pub headers: HeaderMap,
    /// Body copy delivered to the client
    pub client_body: ByteStream,
    /// Body copy collected for cache population
    pub cache_body: ByteStream,
}

/// Builds responses for backend reads and the not-found sentinel
pub struct ResponseComposer {
    positive_ttl: Duration,
    negative_ttl: Duration,
}

impl ResponseComposer {
    /// Create a composer with the given positive and negative lifetimes
    pub fn new(positive_ttl: Duration, negative_ttl: Duration) -> Self {
        ResponseComposer {
            positive_ttl,
            negative_ttl,
        }
    }

    /// Compose the response for a found object
    ///
    /// # Arguments
    /// * `read` - The backend read (metadata + body stream)
    /// * `range` - The parsed client range, if any
    /// * `keep_alive` - Whether the inbound request asked for keep-alive
    ///
    /// # Returns
    /// The composed response with the body already teed into two copies.
    pub fn compose(
        &self,
        read: ObjectRead,
        range: Option<&RangeRequest>,
        keep_alive: bool,
    ) -> Result<ComposedResponse> {
        let headers = self.object_headers(&read.metadata, range, keep_alive)?;

        let status = if range.is_some() {
            StatusCode::PARTIAL_CONTENT
        } else {
            StatusCode::OK
        };
        let variant = if range.is_some() {
            EntryVariant::Partial
        } else {
            EntryVariant::Full
        };

        debug!(
            "composed response: status={}, size={}, range={:?}",
            status, read.metadata.size, range
        );

        let (client_body, cache_body) = tee::tee(read.body);

        Ok(ComposedResponse {
            status,
            variant,
            headers,
            client_body,
            cache_body,
        })
    }

    /// Headers for the 403 sentinel served for nonexistent objects
    ///
    /// Carries the short negative-cache lifetime, so a repopulated miss
    /// retries the backend after ten minutes rather than seven days.
    pub fn forbidden_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let cache_control = format!("max-age={}", self.negative_ttl.as_secs());
        if let Ok(value) = HeaderValue::from_str(&cache_control) {
            headers.insert(header::CACHE_CONTROL, value);
        }
        headers
    }

    fn object_headers(
        &self,
        metadata: &ObjectMetadata,
        range: Option<&RangeRequest>,
        keep_alive: bool,
    ) -> Result<HeaderMap> {
        // Start from the store's hints (Content-Type and friends)
        let mut headers = metadata.content_hints.clone();

        headers.insert(header::ETAG, HeaderValue::from_str(&metadata.etag)?);

        let cache_control = format!("max-age={}", self.positive_ttl.as_secs());
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_str(&cache_control)?);

        // Expires and Last-Modified both carry "now + ttl"; the duplicated
        // computation matches the deployed behavior and is kept as-is.
        let horizon = httpdate::fmt_http_date(SystemTime::now() + self.positive_ttl);
        headers.insert(header::EXPIRES, HeaderValue::from_str(&horizon)?);
        headers.insert(header::LAST_MODIFIED, HeaderValue::from_str(&horizon)?);

        if let Some(range) = range {
            headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
            headers.insert(
                header::CONTENT_RANGE,
                HeaderValue::from_str(&range.content_range(metadata.size))?,
            );
        }

        if keep_alive {
            headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        }

        Ok(headers)
    }
}
