//! HTTP `Range` header parsing.
//!
//! Supported forms, all against a known resource length:
//! - `bytes=0-499`
//! - `bytes=500-` (to the end)
//! - `bytes=-500` (last 500 bytes)
//!
//! Out-of-bounds ranges are rejected rather than clamped. Requests with
//! several ranges are rejected too.

use mediasort_common::Error;

/// Inclusive byte interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// `Content-Range` value for this interval.
    pub fn content_range(&self, total_size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total_size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("range unit must be bytes")]
    UnsupportedUnit,

    #[error("multiple ranges are not supported")]
    MultipleRanges,

    #[error("malformed range: {0}")]
    Malformed(String),

    #[error("invalid suffix length: {0}")]
    InvalidSuffix(String),

    #[error("resource is empty")]
    EmptyResource,

    #[error("range {start}-{end} is outside 0-{last}")]
    OutOfBounds { start: u64, end: u64, last: u64 },

    #[error("range start {start} is after end {end}")]
    Inverted { start: u64, end: u64 },
}

impl From<RangeError> for Error {
    fn from(e: RangeError) -> Self {
        Error::range(e.to_string())
    }
}

/// Parse a `Range` header value against a resource of `total_size` bytes.
pub fn parse_range(header: &str, total_size: u64) -> Result<ByteRange, RangeError> {
    let spec = header
        .trim()
        .strip_prefix("bytes=")
        .ok_or(RangeError::UnsupportedUnit)?;

    if spec.contains(',') {
        return Err(RangeError::MultipleRanges);
    }
    if total_size == 0 {
        return Err(RangeError::EmptyResource);
    }

    let (start, end) = spec
        .split_once('-')
        .ok_or_else(|| RangeError::Malformed(spec.to_string()))?;
    let (start, end) = (start.trim(), end.trim());
    let last = total_size - 1;

    if start.is_empty() {
        let suffix =
            parse_digits(end).ok_or_else(|| RangeError::InvalidSuffix(end.to_string()))?;
        if suffix == 0 {
            return Err(RangeError::InvalidSuffix(end.to_string()));
        }
        return Ok(ByteRange {
            start: total_size.saturating_sub(suffix),
            end: last,
        });
    }

    let start = parse_digits(start).ok_or_else(|| RangeError::Malformed(spec.to_string()))?;
    let end = if end.is_empty() {
        last
    } else {
        parse_digits(end).ok_or_else(|| RangeError::Malformed(spec.to_string()))?
    };

    if end > last {
        return Err(RangeError::OutOfBounds { start, end, last });
    }
    if start > end {
        return Err(RangeError::Inverted { start, end });
    }

    Ok(ByteRange { start, end })
}

/// Byte positions are bare ASCII digits; `u64::from_str` alone would also
/// take a leading `+`.
fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_exact_range() {
        let range = parse_range("bytes=0-499", 1000).unwrap();
        assert_eq!(range, ByteRange { start: 0, end: 499 });
        assert_eq!(range.len(), 500);
        assert_eq!(range.content_range(1000), "bytes 0-499/1000");
    }

    #[test]
    fn test_open_ended_range() {
        let range = parse_range("bytes=500-", 1000).unwrap();
        assert_eq!(range, ByteRange { start: 500, end: 999 });
        assert_eq!(range.len(), 500);
    }

    #[test]
    fn test_suffix_range() {
        assert_eq!(
            parse_range("bytes=-200", 1000).unwrap(),
            ByteRange { start: 800, end: 999 }
        );
        // Suffix longer than the file covers the whole file.
        assert_eq!(
            parse_range("bytes=-5000", 1000).unwrap(),
            ByteRange { start: 0, end: 999 }
        );
    }

    #[test]
    fn test_single_byte_ranges() {
        assert_eq!(parse_range("bytes=999-999", 1000).unwrap().len(), 1);
        assert_eq!(parse_range("bytes=0-0", 1).unwrap().len(), 1);
    }

    #[test]
    fn test_out_of_bounds_not_clamped() {
        assert_matches!(
            parse_range("bytes=0-1000", 1000),
            Err(RangeError::OutOfBounds { end: 1000, last: 999, .. })
        );
        assert_matches!(
            parse_range("bytes=1000-", 1000),
            Err(RangeError::Inverted { .. })
        );
    }

    #[test]
    fn test_inverted_range() {
        assert_matches!(
            parse_range("bytes=500-100", 1000),
            Err(RangeError::Inverted { start: 500, end: 100 })
        );
    }

    #[test]
    fn test_invalid_suffix() {
        assert_matches!(parse_range("bytes=-0", 1000), Err(RangeError::InvalidSuffix(_)));
        assert_matches!(parse_range("bytes=-abc", 1000), Err(RangeError::InvalidSuffix(_)));
        assert_matches!(parse_range("bytes=--5", 1000), Err(RangeError::InvalidSuffix(_)));
        assert_matches!(parse_range("bytes=-", 1000), Err(RangeError::InvalidSuffix(_)));
        assert_matches!(parse_range("bytes=-+5", 100), Err(RangeError::InvalidSuffix(_)));
    }

    #[test]
    fn test_malformed() {
        assert_matches!(parse_range("bytes=abc-10", 1000), Err(RangeError::Malformed(_)));
        assert_matches!(parse_range("bytes=10-x", 1000), Err(RangeError::Malformed(_)));
        assert_matches!(parse_range("bytes=10", 1000), Err(RangeError::Malformed(_)));
        assert_matches!(parse_range("bytes=+5-10", 1000), Err(RangeError::Malformed(_)));
        assert_matches!(parse_range("bytes=5-+10", 1000), Err(RangeError::Malformed(_)));
        assert_matches!(parse_range("bytes=0x1-10", 1000), Err(RangeError::Malformed(_)));
    }

    #[test]
    fn test_unit_and_multi_range() {
        assert_matches!(parse_range("items=0-5", 1000), Err(RangeError::UnsupportedUnit));
        assert_matches!(parse_range("0-5", 1000), Err(RangeError::UnsupportedUnit));
        assert_matches!(
            parse_range("bytes=0-5,10-20", 1000),
            Err(RangeError::MultipleRanges)
        );
    }

    #[test]
    fn test_empty_resource() {
        assert_matches!(parse_range("bytes=0-", 0), Err(RangeError::EmptyResource));
        assert_matches!(parse_range("bytes=-10", 0), Err(RangeError::EmptyResource));
    }

    #[test]
    fn test_converts_to_416() {
        let err: Error = RangeError::MultipleRanges.into();
        assert_eq!(err.http_status(), 416);
    }
}
