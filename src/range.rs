//! Range header parsing
//!
//! Parses the client's `Range` header into a [`RangeRequest`], or decides
//! that no range was requested. Range handling is best-effort: a header the
//! parser cannot make sense of is treated the same as an absent header and
//! never surfaces as an error.

use crate::models::RangeRequest;

/// Parse the raw `Range` header value into a semantic range request
///
/// # Arguments
/// * `header` - The `Range` header value, or `None` if the header is absent
///
/// # Returns
/// * `Some(RangeRequest)` if a byte range was requested
/// * `None` if no range was requested or the header is malformed
///
/// # Semantics
/// Only the single-range form `bytes=<offset>-<end>` is recognized. An
/// end value of `0` (or an empty end, as in `bytes=5-`) is the open-ended
/// sentinel and yields `end: None`, meaning "to end of object". A literal
/// "first byte only" range therefore cannot be expressed through the zero
/// end value; this is deliberate and load-bearing for cache key stability.
pub fn parse_range(header: Option<&str>) -> Option<RangeRequest> {
    let spec = header?.trim().strip_prefix("bytes=")?;

    let mut parts = spec.split('-');
    let offset_part = parts.next()?;
    let end_part = parts.next()?;
    if parts.next().is_some() {
        // More than two dash-separated parts (multi-range or suffix noise)
        return None;
    }

    let offset = parse_position(offset_part)?;
    let end = parse_position(end_part)?;

    if end == 0 {
        Some(RangeRequest::new(offset, None))
    } else {
        Some(RangeRequest::new(offset, Some(end)))
    }
}

/// Parse one side of the dash-separated range spec
///
/// An empty part counts as position 0, so `bytes=100-` parses like
/// `bytes=100-0` and falls into the open-ended sentinel case.
fn parse_position(part: &str) -> Option<u64> {
    let part = part.trim();
    if part.is_empty() {
        return Some(0);
    }
    part.parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_header() {
        assert_eq!(parse_range(None), None);
    }

    #[test]
    fn test_simple_range() {
        let range = parse_range(Some("bytes=10-20")).unwrap();
        assert_eq!(range.offset, 10);
        assert_eq!(range.end, Some(20));
    }

    #[test]
    fn test_zero_end_is_open_ended() {
        let range = parse_range(Some("bytes=5-0")).unwrap();
        assert_eq!(range.offset, 5);
        assert_eq!(range.end, None);
    }

    #[test]
    fn test_empty_end_is_open_ended() {
        let range = parse_range(Some("bytes=100-")).unwrap();
        assert_eq!(range.offset, 100);
        assert_eq!(range.end, None);
    }

    #[test]
    fn test_missing_prefix() {
        assert_eq!(parse_range(Some("0-100")), None);
        assert_eq!(parse_range(Some("items=0-100")), None);
    }

    #[test]
    fn test_multi_range_rejected() {
        assert_eq!(parse_range(Some("bytes=0-100-200")), None);
    }

    #[test]
    fn test_non_numeric_rejected() {
        assert_eq!(parse_range(Some("bytes=abc-100")), None);
        assert_eq!(parse_range(Some("bytes=0-xyz")), None);
    }

    #[test]
    fn test_whitespace_tolerated() {
        let range = parse_range(Some("  bytes=10-20  ")).unwrap();
        assert_eq!(range.offset, 10);
        assert_eq!(range.end, Some(20));
    }

    #[test]
    fn test_empty_offset_parses_as_zero() {
        let range = parse_range(Some("bytes=-500")).unwrap();
        assert_eq!(range.offset, 0);
        assert_eq!(range.end, Some(500));
    }

    #[test]
    fn test_large_values() {
        let range = parse_range(Some("bytes=0-9999999999")).unwrap();
        assert_eq!(range.offset, 0);
        assert_eq!(range.end, Some(9999999999));
    }
}
