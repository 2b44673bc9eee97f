//! Status rewriting for cache hits
//!
//! The edge cache stores partial-content entries with a coerced 200 status
//! and an [`EntryVariant::Partial`] marker. On a hit this module undoes the
//! coercion, so a client always observes 206 for a ranged request and 200
//! otherwise, whether the response was fresh or cached.

use crate::models::{CachedEntry, EntryVariant};
use http::StatusCode;

/// Map a cached entry to the status code the client must observe
pub fn outward_status(entry: &CachedEntry) -> StatusCode {
    match entry.variant {
        EntryVariant::Partial => StatusCode::PARTIAL_CONTENT,
        EntryVariant::Full => entry.status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::HeaderMap;

    fn entry(status: StatusCode, variant: EntryVariant) -> CachedEntry {
        CachedEntry {
            status,
            variant,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    #[test]
    fn test_partial_marker_rewrites_to_206() {
        let e = entry(StatusCode::OK, EntryVariant::Partial);
        assert_eq!(outward_status(&e), StatusCode::PARTIAL_CONTENT);
    }

    #[test]
    fn test_full_entry_passes_through() {
        let e = entry(StatusCode::OK, EntryVariant::Full);
        assert_eq!(outward_status(&e), StatusCode::OK);
    }

    #[test]
    fn test_negative_entry_passes_through() {
        let e = entry(StatusCode::FORBIDDEN, EntryVariant::Full);
        assert_eq!(outward_status(&e), StatusCode::FORBIDDEN);
    }
}
