//! Decide how a media file is served: transcoded, sliced, or whole.

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use std::path::Path;

use super::range::{parse_range, ByteRange, RangeError};

/// Containers browsers cannot play natively.
const TRANSCODE_EXTENSIONS: &[&str] = &["mkv", "avi", "wmv", "flv"];

const RAW_CACHE_CONTROL: &str = "public, max-age=3600";
const TRANSCODE_CACHE_CONTROL: &str = "no-cache";

/// How a stream request will be answered.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamPlan {
    /// Pipe through the transcoder as fragmented MP4; optional seek offset.
    Transcode { start_seconds: Option<f64> },
    /// 206 with bytes `[range.start, range.end]`.
    Partial {
        range: ByteRange,
        total_size: u64,
        content_type: &'static str,
    },
    /// 200 with the whole file.
    Full {
        total_size: u64,
        content_type: &'static str,
    },
    /// 416; no file body.
    RangeNotSatisfiable { total_size: u64, reason: RangeError },
}

/// Inputs to [`plan`] that come from the request.
#[derive(Debug, Clone, Default)]
pub struct StreamRequest<'a> {
    pub range: Option<&'a str>,
    pub transcode: bool,
    pub start_seconds: Option<f64>,
}

/// Whether a file needs transcoding based on its extension.
pub fn needs_transcode(path: &Path) -> bool {
    extension(path)
        .map(|ext| TRANSCODE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// MIME type by extension, defaulting to `video/mp4`.
pub fn content_type_for(path: &Path) -> &'static str {
    match extension(path).as_deref() {
        Some("mp4") => "video/mp4",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        Some("m4v") => "video/x-m4v",
        Some("mov") => "video/quicktime",
        Some("wmv") => "video/x-ms-wmv",
        Some("flv") => "video/x-flv",
        _ => "video/mp4",
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Parse the `t` query value as a non-negative, finite number of seconds.
pub fn parse_start_seconds(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|t| t.is_finite() && *t >= 0.0)
}

/// Build the plan for a file of `file_size` bytes.
pub fn plan(path: &Path, file_size: u64, request: &StreamRequest<'_>) -> StreamPlan {
    if request.transcode || needs_transcode(path) {
        return StreamPlan::Transcode {
            start_seconds: request.start_seconds,
        };
    }

    let content_type = content_type_for(path);
    match request.range {
        Some(value) => match parse_range(value, file_size) {
            Ok(range) => StreamPlan::Partial {
                range,
                total_size: file_size,
                content_type,
            },
            Err(reason) => StreamPlan::RangeNotSatisfiable {
                total_size: file_size,
                reason,
            },
        },
        None => StreamPlan::Full {
            total_size: file_size,
            content_type,
        },
    }
}

impl StreamPlan {
    pub fn status(&self) -> StatusCode {
        match self {
            StreamPlan::Transcode { .. } | StreamPlan::Full { .. } => StatusCode::OK,
            StreamPlan::Partial { .. } => StatusCode::PARTIAL_CONTENT,
            StreamPlan::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
        }
    }

    /// Response headers for this plan.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        match self {
            StreamPlan::Transcode { .. } => {
                headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("video/mp4"));
                headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("none"));
                headers.insert(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static(TRANSCODE_CACHE_CONTROL),
                );
            }
            StreamPlan::Partial {
                range,
                total_size,
                content_type,
            } => {
                headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(*content_type));
                headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
                headers.insert(header::CONTENT_LENGTH, HeaderValue::from(range.len()));
                if let Ok(value) = HeaderValue::from_str(&range.content_range(*total_size)) {
                    headers.insert(header::CONTENT_RANGE, value);
                }
                headers.insert(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static(RAW_CACHE_CONTROL),
                );
            }
            StreamPlan::Full {
                total_size,
                content_type,
            } => {
                headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(*content_type));
                headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
                headers.insert(header::CONTENT_LENGTH, HeaderValue::from(*total_size));
                headers.insert(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static(RAW_CACHE_CONTROL),
                );
            }
            StreamPlan::RangeNotSatisfiable { total_size, .. } => {
                if let Ok(value) = HeaderValue::from_str(&format!("bytes */{}", total_size)) {
                    headers.insert(header::CONTENT_RANGE, value);
                }
            }
        }
        headers
    }
}
